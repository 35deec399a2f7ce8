use std::sync::Arc;

use crate::router::builder::Registration;
use crate::router::route::controller::{Controller, MethodMapping};
use crate::router::route::raw::RawHandler;

/// Builds a controller route, created by `DrawRoutes::controller`.
///
/// ```rust
/// # use std::pin::Pin;
/// # use switchyard::handler::{HandlerFuture, IntoHandlerFuture};
/// # use switchyard::router::route::controller::Controller;
/// # use switchyard::state::State;
/// # use switchyard::router::builder::*;
/// # use switchyard::test::TestServer;
/// #
/// struct Articles;
///
/// impl Controller for Articles {
///     fn actions(&self) -> &[&'static str] {
///         &["show", "save"]
///     }
///
///     fn call(&self, action: &str, state: State) -> Pin<Box<HandlerFuture>> {
///         (state, action.to_owned()).into_handler_future()
///     }
/// }
///
/// # fn main() {
/// let router = build_router(|route| {
///     route
///         .controller("/article/:id")
///         .mapping("get:show;post,put:save")
///         .named("article")
///         .to(Articles);
/// })
/// .unwrap();
/// #
/// # let test_server = TestServer::new(router).unwrap();
/// # let response = test_server.client()
/// #     .get("https://example.com/article/1")
/// #     .perform()
/// #     .unwrap();
/// # assert_eq!(response.read_utf8_body().unwrap(), "show");
/// # }
/// ```
pub struct ControllerRouteBuilder<'a> {
    registration: &'a mut Registration,
    path: String,
    mapping: Option<String>,
    name: Option<String>,
}

impl<'a> ControllerRouteBuilder<'a> {
    pub(super) fn new(registration: &'a mut Registration, path: &str) -> Self {
        ControllerRouteBuilder {
            registration,
            path: path.to_owned(),
            mapping: None,
            name: None,
        }
    }

    /// Maps methods to actions, in the form `"get,post:save;delete:destroy;*:fallback"`.
    ///
    /// Methods the mapping leaves out are served by the action named after the lower-cased
    /// method, then by the action mapped to `*`, then by an action named `any`.
    pub fn mapping(self, mapping: &str) -> Self {
        ControllerRouteBuilder {
            mapping: Some(mapping.to_owned()),
            ..self
        }
    }

    /// Names the route, so `Router::url_for` can build its URL.
    pub fn named<N: Into<String>>(self, name: N) -> Self {
        ControllerRouteBuilder {
            name: Some(name.into()),
            ..self
        }
    }

    /// Binds the route to `controller`.
    pub fn to<C>(self, controller: C)
    where
        C: Controller,
    {
        self.to_shared(Arc::new(controller))
    }

    /// Binds the route to a controller which is shared with other routes.
    pub fn to_shared(self, controller: Arc<dyn Controller>) {
        let ControllerRouteBuilder {
            registration,
            path,
            mapping,
            name,
        } = self;

        let mapping = match mapping {
            Some(ref mapping) => mapping.parse::<MethodMapping>(),
            None => Ok(MethodMapping::empty()),
        };

        let result = match mapping {
            Ok(mapping) => {
                registration
                    .registry_mut()
                    .add_controller(&path, controller, &mapping, name)
            }
            Err(e) => Err(e),
        };
        registration.record(result);
    }
}

/// Builds a raw route, created by `DrawRoutes::raw`.
///
/// Path parameters are available to the raw handler as a `Params` request extension.
///
/// ```rust
/// # use hyper::{Body, Request, Response};
/// # use switchyard::handler::HandlerError;
/// # use switchyard::state::Params;
/// # use switchyard::router::builder::*;
/// # use switchyard::test::TestServer;
/// #
/// async fn legacy(req: Request<Body>) -> Result<Response<Body>, HandlerError> {
///     let params = req.extensions().get::<Params>().cloned().unwrap_or_default();
///     Ok(Response::new(Body::from(params.get("splat").unwrap_or("").to_owned())))
/// }
///
/// # fn main() {
/// let router = build_router(|route| {
///     route.raw("/legacy").prefix().to(legacy);
/// })
/// .unwrap();
/// #
/// # let test_server = TestServer::new(router).unwrap();
/// # let response = test_server.client()
/// #     .get("https://example.com/legacy/a/b")
/// #     .perform()
/// #     .unwrap();
/// # assert_eq!(response.read_utf8_body().unwrap(), "a/b");
/// # }
/// ```
pub struct RawRouteBuilder<'a> {
    registration: &'a mut Registration,
    path: String,
    prefix: bool,
}

impl<'a> RawRouteBuilder<'a> {
    pub(super) fn new(registration: &'a mut Registration, path: &str) -> Self {
        RawRouteBuilder {
            registration,
            path: path.to_owned(),
            prefix: false,
        }
    }

    /// Routes every path below the route path to the handler as well, capturing the rest of the
    /// path as `splat`.
    pub fn prefix(self) -> Self {
        RawRouteBuilder {
            prefix: true,
            ..self
        }
    }

    /// Binds the route to `handler`.
    pub fn to<R>(self, handler: R)
    where
        R: RawHandler,
    {
        let result = self
            .registration
            .registry_mut()
            .add_raw(&self.path, Arc::new(handler), self.prefix);
        self.registration.record(result);
    }
}
