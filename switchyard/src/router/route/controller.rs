//! Controller routes: one value exporting several named actions, selected by HTTP method.
//!
//! The method to action resolution happens once, when the route is registered, and is cached on
//! the `ControllerBinding`.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::{self, FutureExt};
use hyper::{Method, StatusCode};
use log::trace;

use crate::error::ConfigError;
use crate::handler::{HandlerError, HandlerFuture};
use crate::state::{request_id, FromState, State};

/// Methods a controller can serve through the verb-named action convention.
pub(crate) const CONVENTIONAL_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
];

/// The action used for every method that resolves to nothing more specific.
pub const ANY_ACTION: &str = "any";

/// A value which exports named actions.
///
/// ```rust
/// use std::pin::Pin;
///
/// use hyper::StatusCode;
/// use switchyard::handler::{HandlerFuture, IntoHandlerFuture};
/// use switchyard::router::route::controller::Controller;
/// use switchyard::state::State;
///
/// struct Users;
///
/// impl Controller for Users {
///     fn actions(&self) -> &[&'static str] {
///         &["get", "save"]
///     }
///
///     fn call(&self, action: &str, state: State) -> Pin<Box<HandlerFuture>> {
///         match action {
///             "get" => (state, "all users").into_handler_future(),
///             _ => (state, StatusCode::CREATED).into_handler_future(),
///         }
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Names of the actions `call` accepts.
    fn actions(&self) -> &[&'static str];

    /// Runs `action` for the request in `state`.
    fn call(&self, action: &str, state: State) -> Pin<Box<HandlerFuture>>;

    /// The name used for automatic routes, usually the lower-cased type name without a
    /// `Controller` suffix.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// The method part of a single mapping entry.
#[derive(Clone, Debug, PartialEq, Eq)]
enum MappedMethod {
    Every,
    Only(Method),
}

/// An explicit method to action mapping, written as `;`-separated `methods:action` entries.
///
/// `methods` is a `,`-separated list of HTTP methods, or `*` for every method not mapped
/// otherwise:
///
/// ```rust
/// use switchyard::router::route::controller::MethodMapping;
///
/// let mapping: MethodMapping = "get,post:save;delete:destroy;*:fallback".parse().unwrap();
/// assert!("get".parse::<MethodMapping>().is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodMapping {
    entries: Vec<(MappedMethod, String)>,
}

impl MethodMapping {
    /// A mapping without entries, leaving every method to convention.
    pub fn empty() -> Self {
        MethodMapping::default()
    }

    /// `true` when no entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn explicit(&self, method: &Method) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(m, _)| *m == MappedMethod::Only(method.clone()))
            .map(|(_, action)| action.as_str())
    }

    fn every(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(m, _)| *m == MappedMethod::Every)
            .map(|(_, action)| action.as_str())
    }

    fn explicit_methods(&self) -> impl Iterator<Item = &Method> {
        self.entries.iter().filter_map(|(m, _)| match m {
            MappedMethod::Only(method) => Some(method),
            MappedMethod::Every => None,
        })
    }
}

impl FromStr for MethodMapping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidMapping {
            mapping: s.to_owned(),
            reason,
        };

        let mut entries = Vec::new();

        for entry in s.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (methods, action) = match entry.split_once(':') {
                Some((methods, action)) => (methods, action.trim()),
                None => return Err(invalid(format!("entry `{}` is not `methods:action`", entry))),
            };

            if action.is_empty() {
                return Err(invalid(format!("entry `{}` names no action", entry)));
            }

            for method in methods.split(',').map(str::trim) {
                let mapped = match method {
                    "*" => MappedMethod::Every,
                    "" => return Err(invalid(format!("entry `{}` names no method", entry))),
                    m => match Method::from_bytes(m.to_ascii_uppercase().as_bytes()) {
                        Ok(m) => MappedMethod::Only(m),
                        Err(_) => return Err(invalid(format!("`{}` is not an HTTP method", m))),
                    },
                };
                entries.push((mapped, action.to_owned()));
            }
        }

        Ok(MethodMapping { entries })
    }
}

/// A controller together with the action resolved for each method it serves.
#[derive(Clone)]
pub struct ControllerBinding {
    controller: Arc<dyn Controller>,
    by_method: HashMap<Method, String>,
    fallback: Option<String>,
}

impl fmt::Debug for ControllerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBinding")
            .field("by_method", &self.by_method)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl ControllerBinding {
    /// Resolves the action for every method.
    ///
    /// For each method the first of these wins: the action mapped to it explicitly, the action
    /// named after the lower-cased method, the action mapped to `*`, the action named `any`.
    pub fn resolve(
        controller: Arc<dyn Controller>,
        mapping: &MethodMapping,
        pattern: &str,
    ) -> Result<Self, ConfigError> {
        let exports = |action: &str| controller.actions().iter().any(|a| *a == action);
        let mut by_method = HashMap::new();

        let methods = CONVENTIONAL_METHODS
            .iter()
            .chain(mapping.explicit_methods())
            .cloned()
            .collect::<Vec<_>>();

        for method in methods {
            if by_method.contains_key(&method) {
                continue;
            }

            if let Some(action) = mapping.explicit(&method) {
                if !exports(action) {
                    return Err(ConfigError::UnknownAction {
                        method: method.to_string(),
                        action: action.to_owned(),
                    });
                }
                by_method.insert(method, action.to_owned());
                continue;
            }

            let conventional = method.as_str().to_ascii_lowercase();
            if exports(&conventional) {
                by_method.insert(method, conventional);
            }
        }

        let fallback = match mapping.every() {
            Some(action) if !exports(action) => {
                return Err(ConfigError::UnknownAction {
                    method: "*".to_owned(),
                    action: action.to_owned(),
                })
            }
            Some(action) => Some(action.to_owned()),
            None if exports(ANY_ACTION) => Some(ANY_ACTION.to_owned()),
            None => None,
        };

        if by_method.is_empty() && fallback.is_none() {
            return Err(ConfigError::NoActions {
                pattern: pattern.to_owned(),
            });
        }

        trace!(
            " resolved controller actions for `{}`: {:?}, fallback {:?}",
            pattern,
            by_method,
            fallback
        );

        Ok(ControllerBinding {
            controller,
            by_method,
            fallback,
        })
    }

    /// Binds every method to the single `action`.
    pub fn fixed(controller: Arc<dyn Controller>, action: &str) -> Self {
        ControllerBinding {
            controller,
            by_method: HashMap::new(),
            fallback: Some(action.to_owned()),
        }
    }

    /// The action serving `method`, if any.
    pub fn action_for(&self, method: &Method) -> Option<&str> {
        self.by_method
            .get(method)
            .or_else(|| self.fallback.as_ref())
            .map(String::as_str)
    }

    /// `true` if some action serves `method`.
    pub fn supports(&self, method: &Method) -> bool {
        self.action_for(method).is_some()
    }

    /// Methods with an explicitly resolved action. Empty when a fallback serves every method.
    pub fn allowed_methods(&self) -> Vec<Method> {
        if self.fallback.is_some() {
            return Vec::new();
        }

        let mut methods: Vec<Method> = self.by_method.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Calls the action resolved for the request method.
    pub fn dispatch(&self, state: State) -> Pin<Box<HandlerFuture>> {
        let action = Method::try_borrow_from(&state).and_then(|m| self.action_for(m));

        match action {
            Some(action) => {
                trace!("[{}] dispatching to action `{}`", request_id(&state), action);
                self.controller.call(action, state)
            }
            None => {
                let err = HandlerError::from(anyhow::anyhow!("no action for request method"))
                    .with_status(StatusCode::METHOD_NOT_ALLOWED);
                future::err((state, err)).boxed()
            }
        }
    }
}
