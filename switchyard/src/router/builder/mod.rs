//! Defines a builder API for constructing a `Router`.

mod draw;
mod filter;
mod single;
mod target;

use std::sync::Arc;

use hyper::StatusCode;
use log::error;

use crate::error::ConfigError;
use crate::router::registry::Registry;
use crate::router::response::{ResponseExtender, ResponseFinalizerBuilder};
use crate::router::Router;

pub use self::draw::DrawRoutes;
pub use self::filter::FilterBuilder;
pub use self::single::{DefineSingleRoute, SingleRouteBuilder};
pub use self::target::{ControllerRouteBuilder, RawRouteBuilder};

/// Builds a `Router` using the provided closure. Routes are defined using the `RouterBuilder`
/// value passed to the closure, and the `Router` is constructed before returning.
///
/// Every registration problem is logged. The first one is returned instead of a `Router`.
///
/// ```rust
/// # use hyper::{Body, Response, StatusCode};
/// # use switchyard::helpers::http::response::create_empty_response;
/// # use switchyard::state::State;
/// # use switchyard::router::Router;
/// # use switchyard::router::builder::*;
/// # use switchyard::test::TestServer;
/// #
/// fn my_handler(state: State) -> (State, Response<Body>) {
///     let res = create_empty_response(&state, StatusCode::ACCEPTED);
///     (state, res)
/// }
///
/// fn router() -> Router {
///     build_router(|route| {
///         route.get("/request/path").to(my_handler);
///     })
///     .unwrap()
/// }
/// #
/// # fn main() {
/// #   let test_server = TestServer::new(router()).unwrap();
/// #   let response = test_server.client()
/// #       .get("https://example.com/request/path")
/// #       .perform()
/// #       .unwrap();
/// #   assert_eq!(response.status(), StatusCode::ACCEPTED);
/// # }
/// ```
pub fn build_router<F>(f: F) -> Result<Router, ConfigError>
where
    F: FnOnce(&mut RouterBuilder<'_>),
{
    let mut registration = Registration::new(Registry::new());
    let mut response_finalizer_builder = ResponseFinalizerBuilder::new();

    {
        let mut builder = RouterBuilder {
            registration: &mut registration,
            response_finalizer_builder: &mut response_finalizer_builder,
        };
        f(&mut builder);
    }

    let registry = registration.finish()?;
    Ok(Router::new(registry, response_finalizer_builder.finalize()))
}

/// Routes and filters collected by a builder, along with the first problem found.
#[doc(hidden)]
pub struct Registration {
    registry: Registry,
    error: Option<ConfigError>,
}

impl Registration {
    pub(crate) fn new(registry: Registry) -> Self {
        Registration {
            registry,
            error: None,
        }
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Logs a failed registration step, keeping the first failure for `finish`.
    pub(crate) fn record(&mut self, result: Result<(), ConfigError>) {
        if let Err(e) = result {
            error!("route registration failed: {}", e);
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }

    pub(crate) fn finish(self) -> Result<Registry, ConfigError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.registry),
        }
    }
}

/// The top-level builder which is created by `build_router` and passed to the provided closure.
/// See the `build_router` function and the `DrawRoutes` trait for usage.
pub struct RouterBuilder<'a> {
    registration: &'a mut Registration,
    response_finalizer_builder: &'a mut ResponseFinalizerBuilder,
}

impl<'a> RouterBuilder<'a> {
    pub(crate) fn new(
        registration: &'a mut Registration,
        response_finalizer_builder: &'a mut ResponseFinalizerBuilder,
    ) -> Self {
        RouterBuilder {
            registration,
            response_finalizer_builder,
        }
    }

    /// Adds a `ResponseExtender` to the `ResponseFinalizer` in the `Router`. The extender runs on
    /// every response with `status_code`, whether it came from a handler, a filter, or the router
    /// itself.
    ///
    /// ```rust
    /// # use hyper::{Body, Response, StatusCode};
    /// # use hyper::header::{HeaderValue, WARNING};
    /// # use switchyard::state::State;
    /// # use switchyard::router::builder::*;
    /// # use switchyard::test::TestServer;
    /// #
    /// # fn main() {
    /// let router = build_router(|route| {
    ///     route.add_response_extender(
    ///         StatusCode::NOT_FOUND,
    ///         |_state: &mut State, res: &mut Response<Body>| {
    ///             res.headers_mut()
    ///                 .insert(WARNING, HeaderValue::from_static("299 example.com Missing"));
    ///         },
    ///     );
    /// })
    /// .unwrap();
    /// #
    /// #   let test_server = TestServer::new(router).unwrap();
    /// #   let response = test_server.client()
    /// #       .get("https://example.com/")
    /// #       .perform()
    /// #       .unwrap();
    /// #   assert_eq!(response.status(), StatusCode::NOT_FOUND);
    /// #   assert_eq!(response.headers()[WARNING], "299 example.com Missing");
    /// # }
    /// ```
    pub fn add_response_extender<E>(&mut self, status_code: StatusCode, extender: E)
    where
        E: ResponseExtender + 'static,
    {
        self.response_finalizer_builder
            .add(status_code, Arc::new(extender))
    }
}

impl<'a> DrawRoutes for RouterBuilder<'a> {
    fn registration(&mut self) -> &mut Registration {
        &mut *self.registration
    }
}
