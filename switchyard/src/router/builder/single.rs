use std::future::Future;

use futures_util::future::FutureExt;
use hyper::Method;

use crate::handler::{Handler, HandlerResult, NewHandler};
use crate::router::builder::Registration;
use crate::router::route::dispatch::DispatcherImpl;
use crate::router::route::RouteBinding;
use crate::state::State;

/// Describes the API for defining a single route, after determining which request paths will be
/// dispatched here. The API here uses chained function calls to build and add the route into the
/// `RouterBuilder` which created it.
///
/// # Examples
///
/// ```rust
/// # use hyper::{Body, Response, StatusCode};
/// # use switchyard::helpers::http::response::create_empty_response;
/// # use switchyard::state::State;
/// # use switchyard::router::builder::*;
/// #
/// fn my_handler(state: State) -> (State, Response<Body>) {
///     let res = create_empty_response(&state, StatusCode::OK);
///     (state, res)
/// }
/// #
/// # fn main() {
/// build_router(|route| {
///     route.get("/request/path") // <- This value implements `DefineSingleRoute`
///          .to(my_handler);
/// })
/// # .unwrap();
/// # }
/// ```
pub trait DefineSingleRoute: Sized {
    /// Directs the route to the given `Handler`, automatically creating a `NewHandler` which
    /// clones the `Handler`. This is the easiest option for code which is using bare functions as
    /// `Handler` functions.
    fn to<H>(self, handler: H)
    where
        H: Handler + Clone + Send + Sync + 'static,
    {
        self.to_new_handler(move || Ok(handler.clone()))
    }

    /// Directs the route to the given async function, which receives the `State` and resolves
    /// to a `HandlerResult`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hyper::StatusCode;
    /// # use switchyard::handler::{HandlerResult, IntoResponse};
    /// # use switchyard::state::State;
    /// # use switchyard::router::builder::*;
    /// # use switchyard::test::TestServer;
    /// #
    /// async fn my_handler(state: State) -> HandlerResult {
    ///     let res = StatusCode::ACCEPTED.into_response(&state);
    ///     Ok((state, res))
    /// }
    /// #
    /// # fn main() {
    /// let router = build_router(|route| {
    ///     route.get("/request/path").to_async(my_handler);
    /// })
    /// .unwrap();
    /// #
    /// # let test_server = TestServer::new(router).unwrap();
    /// # let response = test_server.client()
    /// #     .get("https://example.com/request/path")
    /// #     .perform()
    /// #     .unwrap();
    /// # assert_eq!(response.status(), StatusCode::ACCEPTED);
    /// # }
    /// ```
    fn to_async<H, Fut>(self, handler: H)
    where
        H: (FnOnce(State) -> Fut) + Clone + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.to(move |state: State| handler(state).boxed())
    }

    /// Directs the route to the given `NewHandler`. This gives more control over how `Handler`
    /// values are constructed.
    fn to_new_handler<NH>(self, new_handler: NH)
    where
        NH: NewHandler + 'static,
        NH::Instance: 'static;
}

/// Implements the traits required to define a single route, after determining which request paths
/// will be dispatched here. The `DefineSingleRoute` trait has documentation for using this type.
pub struct SingleRouteBuilder<'a> {
    registration: &'a mut Registration,
    methods: Vec<Method>,
    path: String,
    name: Option<String>,
}

impl<'a> SingleRouteBuilder<'a> {
    pub(super) fn new(registration: &'a mut Registration, methods: Vec<Method>, path: &str) -> Self {
        SingleRouteBuilder {
            registration,
            methods,
            path: path.to_owned(),
            name: None,
        }
    }

    /// Names the route, so `Router::url_for` can build its URL.
    pub fn named<N: Into<String>>(self, name: N) -> Self {
        SingleRouteBuilder {
            name: Some(name.into()),
            ..self
        }
    }
}

impl<'a> DefineSingleRoute for SingleRouteBuilder<'a> {
    fn to_new_handler<NH>(self, new_handler: NH)
    where
        NH: NewHandler + 'static,
        NH::Instance: 'static,
    {
        let dispatcher = Box::new(DispatcherImpl::new(new_handler));

        let mut binding = if self.methods.is_empty() {
            RouteBinding::any_method(dispatcher)
        } else {
            RouteBinding::handler(self.methods.clone(), dispatcher)
        };
        if let Some(name) = self.name {
            binding = binding.with_name(name);
        }

        let result = self
            .registration
            .registry_mut()
            .add_route(&self.methods, &self.path, binding);
        self.registration.record(result);
    }
}
