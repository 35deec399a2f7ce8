use std::sync::Arc;

use hyper::Method;

use crate::router::builder::{
    ControllerRouteBuilder, FilterBuilder, RawRouteBuilder, Registration, SingleRouteBuilder,
};
use crate::router::filter::FilterPoint;
use crate::router::namespace::{Namespace, NamespaceBuilder};
use crate::router::route::controller::Controller;

/// Defines functions used by a builder to determine which request paths will be dispatched to a
/// route. This trait is implemented by the top-level `RouterBuilder`, and also the
/// `NamespaceBuilder` passed to the closure of `DrawRoutes::namespace` and `Namespace::build`.
///
/// Paths are patterns of `/`-separated segments:
///
/// * `user` matches the literal segment,
/// * `:id` matches any single segment and stores it as the parameter `id`,
/// * `:id([0-9]+)` does the same for segments matching the regular expression,
/// * `?:id` is an optional parameter, which may be left out at the end of a path,
/// * `*` (or `:splat`) matches one or more trailing segments, stored as `splat`,
/// * `*.*` matches trailing segments ending in a file name, stored as `path` and `ext`,
/// * `\:id` matches the literal segment `:id`.
///
/// When more than one route matches a path, literal segments win over constrained parameters,
/// which win over plain parameters, which win over wildcards.
pub trait DrawRoutes {
    /// Creates a route which matches `GET` and `HEAD` requests to the given path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use switchyard::state::State;
    /// # use switchyard::router::builder::*;
    /// # fn my_handler(state: State) -> (State, &'static str) {
    /// #   (state, "hello")
    /// # }
    /// #
    /// # fn main() {
    /// build_router(|route| {
    ///     route.get_or_head("/request/path").to(my_handler);
    /// })
    /// # .unwrap();
    /// # }
    /// ```
    fn get_or_head(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::GET, Method::HEAD], path)
    }

    /// Creates a route which matches **only** `GET` requests to the given path (ignoring `HEAD`
    /// requests).
    fn get(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::GET], path)
    }

    /// Creates a route which matches `HEAD` requests to the given path.
    fn head(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::HEAD], path)
    }

    /// Creates a route which matches `POST` requests to the given path.
    fn post(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::POST], path)
    }

    /// Creates a route which matches `PUT` requests to the given path.
    fn put(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::PUT], path)
    }

    /// Creates a route which matches `PATCH` requests to the given path.
    fn patch(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::PATCH], path)
    }

    /// Creates a route which matches `DELETE` requests to the given path.
    fn delete(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::DELETE], path)
    }

    /// Creates a route which matches `OPTIONS` requests to the given path.
    fn options(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(vec![Method::OPTIONS], path)
    }

    /// Creates a route which matches requests with any method to the given path.
    ///
    /// Routes for a specific method are preferred over this route when both match a request.
    fn any(&mut self, path: &str) -> SingleRouteBuilder<'_> {
        self.request(Vec::new(), path)
    }

    /// Creates a single route which matches any requests to the given `path` with one of the
    /// given `methods`. The `path` can consist of static or dynamic segments, for example:
    ///
    /// * `"/hello/world"` - a static path, matching only a request for exactly `"/hello/world"`
    /// * `"/hello/:name"` - a dynamic path, matching requests for `"/hello/any_value_here"`
    ///
    /// An empty `methods` list matches every method.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hyper::{Method, StatusCode};
    /// # use switchyard::state::State;
    /// # use switchyard::router::builder::*;
    /// # use switchyard::test::TestServer;
    /// # fn my_handler(state: State) -> (State, StatusCode) {
    /// #   (state, StatusCode::ACCEPTED)
    /// # }
    /// #
    /// # fn main() {
    /// let router = build_router(|route| {
    ///     route.request(vec![Method::GET, Method::PUT], "/resource/:id").to(my_handler);
    /// })
    /// .unwrap();
    /// #
    /// # let test_server = TestServer::new(router).unwrap();
    /// # let response = test_server.client()
    /// #     .get("https://example.com/resource/7")
    /// #     .perform()
    /// #     .unwrap();
    /// # assert_eq!(response.status(), StatusCode::ACCEPTED);
    /// # }
    /// ```
    fn request(&mut self, methods: Vec<Method>, path: &str) -> SingleRouteBuilder<'_> {
        SingleRouteBuilder::new(self.registration(), methods, path)
    }

    /// Begins a controller route at `path`. Which action answers which method is decided by the
    /// method mapping given with `ControllerRouteBuilder::mapping`, falling back to actions named
    /// after the methods.
    fn controller(&mut self, path: &str) -> ControllerRouteBuilder<'_> {
        ControllerRouteBuilder::new(self.registration(), path)
    }

    /// Routes `/{name}/{action}` and every path below it to each action of `controller`, for
    /// every method. `{name}` is the lower-cased `Controller::name`.
    fn auto<C>(&mut self, controller: C)
    where
        C: Controller,
    {
        self.auto_prefix("/", controller)
    }

    /// Like `auto`, with every route beneath `prefix`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::pin::Pin;
    /// # use switchyard::handler::{HandlerFuture, IntoHandlerFuture};
    /// # use switchyard::router::route::controller::Controller;
    /// # use switchyard::state::State;
    /// # use switchyard::router::builder::*;
    /// # use switchyard::test::TestServer;
    /// #
    /// struct Reports;
    ///
    /// impl Controller for Reports {
    ///     fn actions(&self) -> &[&'static str] {
    ///         &["Daily", "weekly"]
    ///     }
    ///
    ///     fn call(&self, action: &str, state: State) -> Pin<Box<HandlerFuture>> {
    ///         (state, action.to_owned()).into_handler_future()
    ///     }
    ///
    ///     fn name(&self) -> Option<&str> {
    ///         Some("Reports")
    ///     }
    /// }
    ///
    /// # fn main() {
    /// let router = build_router(|route| {
    ///     route.auto_prefix("/admin", Reports);
    /// })
    /// .unwrap();
    /// #
    /// # let test_server = TestServer::new(router).unwrap();
    /// # let response = test_server.client()
    /// #     .get("https://example.com/admin/reports/daily")
    /// #     .perform()
    /// #     .unwrap();
    /// # assert_eq!(response.read_utf8_body().unwrap(), "Daily");
    /// # }
    /// ```
    fn auto_prefix<C>(&mut self, prefix: &str, controller: C)
    where
        C: Controller,
    {
        let registration = self.registration();
        let result = registration
            .registry_mut()
            .add_auto(prefix, Arc::new(controller));
        registration.record(result);
    }

    /// Begins a route to a function of the plain `hyper::Request`, for every method.
    fn raw(&mut self, path: &str) -> RawRouteBuilder<'_> {
        RawRouteBuilder::new(self.registration(), path)
    }

    /// Begins a filter which runs at `point` for requests whose path matches `pattern`.
    ///
    /// Filters of a point run in the order they were added. Patterns use the same syntax as
    /// routes; a pattern ending in `*` also matches the path without that last segment.
    fn filter(&mut self, point: FilterPoint, pattern: &str) -> FilterBuilder<'_> {
        FilterBuilder::new(self.registration(), point, pattern)
    }

    /// Builds a namespace with the provided closure and merges it beneath `prefix`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hyper::StatusCode;
    /// # use switchyard::state::State;
    /// # use switchyard::router::builder::*;
    /// # use switchyard::test::TestServer;
    /// # fn my_handler(state: State) -> (State, StatusCode) {
    /// #   (state, StatusCode::ACCEPTED)
    /// # }
    /// #
    /// # fn main() {
    /// let router = build_router(|route| {
    ///     route.namespace("/v1", |ns| {
    ///         ns.namespace("/shop", |ns| {
    ///             ns.get("/:id").to(my_handler);
    ///         });
    ///     });
    /// })
    /// .unwrap();
    /// #
    /// # let test_server = TestServer::new(router).unwrap();
    /// # let response = test_server.client()
    /// #     .get("https://example.com/v1/shop/42")
    /// #     .perform()
    /// #     .unwrap();
    /// # assert_eq!(response.status(), StatusCode::ACCEPTED);
    /// # }
    /// ```
    fn namespace<F>(&mut self, prefix: &str, f: F)
    where
        F: FnOnce(&mut NamespaceBuilder<'_>),
    {
        match Namespace::build(prefix, f) {
            Ok(namespace) => self.add_namespace(namespace),
            Err(e) => self.registration().record(Err(e)),
        }
    }

    /// Merges a namespace built with `Namespace::build` beneath its prefix.
    fn add_namespace(&mut self, namespace: Namespace) {
        let (prefix, registry) = namespace.into_parts();
        self.registration().registry_mut().merge(&prefix, registry);
    }

    /// Return the components that comprise this builder. For internal use only.
    #[doc(hidden)]
    fn registration(&mut self) -> &mut Registration;
}
