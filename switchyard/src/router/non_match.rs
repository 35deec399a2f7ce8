//! Defines the type `RouteNonMatch`, the outcome of a lookup which found no route to dispatch to.

use std::collections::HashSet;

use hyper::header::{HeaderValue, ALLOW};
use hyper::{Body, Method, Response, StatusCode};

use crate::helpers::http::response::create_empty_response;
use crate::state::State;

/// The error type used for a non-matching route, as returned by `Registry::find_route`. Multiple
/// values of this type can be combined by using `union`, which yields the status of higher
/// precedence together with every allowed method.
///
/// A `404 Not Found` means no route matched the path at all. A `405 Method Not Allowed` means
/// routes matched the path, but none of them serve the request method; the methods they do
/// serve are carried along for the `Allow` header.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteNonMatch {
    status: StatusCode,
    allow: HashSet<Method>,
}

impl RouteNonMatch {
    /// Creates a new `RouteNonMatch` value with the given HTTP status and no allowed methods.
    pub fn new(status: StatusCode) -> RouteNonMatch {
        RouteNonMatch {
            status,
            allow: HashSet::new(),
        }
    }

    /// The outcome for a path which matched nothing.
    pub fn not_found() -> RouteNonMatch {
        RouteNonMatch::new(StatusCode::NOT_FOUND)
    }

    /// The outcome for a path which matched routes serving only `allow`.
    pub fn method_not_allowed<I>(allow: I) -> RouteNonMatch
    where
        I: IntoIterator<Item = Method>,
    {
        RouteNonMatch::new(StatusCode::METHOD_NOT_ALLOWED).with_allow_list(allow)
    }

    /// Adds every method in `allow` to the allowed set.
    pub fn with_allow_list<I>(mut self, allow: I) -> RouteNonMatch
    where
        I: IntoIterator<Item = Method>,
    {
        self.allow.extend(allow);
        self
    }

    /// Merge two `RouteNonMatch` values into a single value which carries every allowed method.
    pub fn union(self, other: RouteNonMatch) -> RouteNonMatch {
        let status = higher_precedence_status(self.status, other.status);
        let allow = self.allow.union(&other.allow).cloned().collect();
        RouteNonMatch { status, allow }
    }

    /// The status this outcome maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Takes ownership of the `StatusCode` and the allowed methods, sorted by name.
    pub fn deconstruct(self) -> (StatusCode, Vec<Method>) {
        let RouteNonMatch { status, allow } = self;
        let mut allow: Vec<Method> = allow.into_iter().collect();
        allow.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        (status, allow)
    }

    /// Builds the empty response for this outcome, with an `Allow` header for `405`.
    pub fn into_response(self, state: &State) -> Response<Body> {
        let (status, allow) = self.deconstruct();
        let mut res = create_empty_response(state, status);

        if status == StatusCode::METHOD_NOT_ALLOWED {
            let allow = allow
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                res.headers_mut().insert(ALLOW, value);
            }
        }

        res
    }
}

impl From<RouteNonMatch> for StatusCode {
    fn from(val: RouteNonMatch) -> StatusCode {
        val.status
    }
}

fn higher_precedence_status(lhs: StatusCode, rhs: StatusCode) -> StatusCode {
    match (lhs, rhs) {
        // For 404, prefer outcomes that indicated *some* kind of match.
        (StatusCode::NOT_FOUND, _) => rhs,
        (_, StatusCode::NOT_FOUND) => lhs,
        (_, _) if lhs.is_client_error() => lhs,
        (_, _) if rhs.is_client_error() => rhs,
        (_, _) => lhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_prefers_method_not_allowed() {
        let merged = RouteNonMatch::not_found()
            .union(RouteNonMatch::method_not_allowed(vec![Method::POST]))
            .union(RouteNonMatch::method_not_allowed(vec![Method::GET, Method::POST]));

        let (status, allow) = merged.deconstruct();
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(allow, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn not_found_stays_not_found() {
        let merged = RouteNonMatch::not_found().union(RouteNonMatch::not_found());
        assert_eq!(StatusCode::from(merged), StatusCode::NOT_FOUND);
    }
}
