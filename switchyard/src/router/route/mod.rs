//! Defines the values bound to routes.
//!
//! The `Router` finds a `RouteBinding` in its trees for the request path and method, then
//! dispatches the request to whatever the binding holds: a `Handler`, a `Controller` with its
//! per-method actions, or a `RawHandler`.

pub mod controller;
pub mod dispatch;
pub mod raw;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use hyper::Method;

use crate::handler::HandlerFuture;
use crate::router::route::controller::ControllerBinding;
use crate::router::route::dispatch::Dispatcher;
use crate::router::route::raw::{dispatch_raw, RawHandler};
use crate::state::State;

/// What a route runs once it matched.
pub enum RouteTarget {
    /// A `Handler`, created per request by its `NewHandler`.
    Handler(Box<dyn Dispatcher>),

    /// A controller with its resolved method to action table.
    Controller(ControllerBinding),

    /// A handler of the plain hyper request.
    Raw(Arc<dyn RawHandler>),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Handler(_) => f.write_str("Handler"),
            RouteTarget::Controller(c) => fmt::Debug::fmt(c, f),
            RouteTarget::Raw(_) => f.write_str("Raw"),
        }
    }
}

/// The payload stored in a routing tree leaf.
#[derive(Debug)]
pub struct RouteBinding {
    target: RouteTarget,
    methods: Option<Vec<Method>>,
    name: Option<String>,
}

impl RouteBinding {
    /// Binds `dispatcher` for exactly `methods`.
    pub fn handler(methods: Vec<Method>, dispatcher: Box<dyn Dispatcher>) -> Self {
        RouteBinding {
            target: RouteTarget::Handler(dispatcher),
            methods: Some(methods),
            name: None,
        }
    }

    /// Binds `dispatcher` for every method.
    pub fn any_method(dispatcher: Box<dyn Dispatcher>) -> Self {
        RouteBinding {
            target: RouteTarget::Handler(dispatcher),
            methods: None,
            name: None,
        }
    }

    /// Binds a controller; the methods served are those the binding resolved.
    pub fn controller(binding: ControllerBinding) -> Self {
        RouteBinding {
            target: RouteTarget::Controller(binding),
            methods: None,
            name: None,
        }
    }

    /// Binds a raw handler for every method.
    pub fn raw(handler: Arc<dyn RawHandler>) -> Self {
        RouteBinding {
            target: RouteTarget::Raw(handler),
            methods: None,
            name: None,
        }
    }

    /// Names the route for reverse routing.
    pub fn with_name<N: Into<String>>(self, name: N) -> Self {
        RouteBinding {
            name: Some(name.into()),
            ..self
        }
    }

    /// The route name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// What the route runs.
    pub fn target(&self) -> &RouteTarget {
        &self.target
    }

    /// `true` if the route serves requests with `method`.
    pub fn supports(&self, method: &Method) -> bool {
        match self.target {
            RouteTarget::Controller(ref binding) => binding.supports(method),
            _ => match self.methods {
                Some(ref methods) => methods.contains(method),
                None => true,
            },
        }
    }

    /// The methods this route is limited to. Empty when it serves every method.
    pub fn allowed_methods(&self) -> Vec<Method> {
        match self.target {
            RouteTarget::Controller(ref binding) => binding.allowed_methods(),
            _ => self.methods.clone().unwrap_or_default(),
        }
    }

    /// Runs the bound target for the request in `state`.
    pub fn dispatch(&self, state: State) -> Pin<Box<HandlerFuture>> {
        match self.target {
            RouteTarget::Handler(ref dispatcher) => dispatcher.dispatch(state),
            RouteTarget::Controller(ref binding) => binding.dispatch(state),
            RouteTarget::Raw(ref handler) => dispatch_raw(handler.clone(), state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::{Body, Response, StatusCode};

    use crate::helpers::http::response::create_empty_response;
    use crate::router::route::dispatch::DispatcherImpl;

    fn handler(state: State) -> (State, Response<Body>) {
        let res = create_empty_response(&state, StatusCode::OK);
        (state, res)
    }

    #[test]
    fn handler_bindings_limit_methods() {
        let binding = RouteBinding::handler(
            vec![Method::GET, Method::HEAD],
            Box::new(DispatcherImpl::new(|| Ok(handler))),
        )
        .with_name("home");

        assert!(binding.supports(&Method::HEAD));
        assert!(!binding.supports(&Method::POST));
        assert_eq!(binding.allowed_methods(), vec![Method::GET, Method::HEAD]);
        assert_eq!(binding.name(), Some("home"));
    }

    #[test]
    fn any_method_bindings_serve_everything() {
        let binding = RouteBinding::any_method(Box::new(DispatcherImpl::new(|| Ok(handler))));

        assert!(binding.supports(&Method::PATCH));
        assert!(binding.allowed_methods().is_empty());
    }
}
