//! Defines functionality for finalizing a `Response` after the filters and handler of a request
//! have completed.

use std::collections::HashMap;
use std::sync::Arc;

use hyper::{Body, Response, StatusCode};
use log::trace;

use crate::state::{request_id, State};

use crate::router::response::extender::ResponseExtender;

/// Holds an immutable collection of `ResponseExtender` values, as configured using
/// `ResponseFinalizerBuilder::add`. This type is constructed automatically when using the
/// `switchyard::router::builder` API. See `RouterBuilder::add_response_extender` for details on
/// configuring `ResponseExtender` values for each `StatusCode`.
#[derive(Clone)]
pub struct ResponseFinalizer {
    data: Arc<HashMap<StatusCode, Arc<dyn ResponseExtender>>>,
}

/// Builds an immutable `ResponseFinalizer`.
#[derive(Default)]
pub struct ResponseFinalizerBuilder {
    data: HashMap<StatusCode, Arc<dyn ResponseExtender>>,
}

impl ResponseFinalizerBuilder {
    pub(in crate::router) fn new() -> Self {
        ResponseFinalizerBuilder::default()
    }

    /// Add an extender for responses that have been assigned this status_code. A second extender
    /// for the same status replaces the first.
    pub fn add(&mut self, status_code: StatusCode, extender: Arc<dyn ResponseExtender>) {
        trace!(" adding response extender for {}", status_code);
        self.data.insert(status_code, extender);
    }

    /// Finalize population of error handlers for the application, ready for use by a `Router`
    pub fn finalize(self) -> ResponseFinalizer {
        ResponseFinalizer {
            data: Arc::new(self.data),
        }
    }
}

impl ResponseFinalizer {
    /// Reopens the finalizer for further extenders, keeping the ones it holds.
    pub(in crate::router) fn to_builder(&self) -> ResponseFinalizerBuilder {
        ResponseFinalizerBuilder {
            data: (*self.data).clone(),
        }
    }

    /// Finalize the `Response` if a `ResponseExtender` has been supplied for the
    /// status code assigned to the `Response`.
    pub fn finalize(&self, state: &mut State, res: &mut Response<Body>) {
        match self.data.get(&res.status()) {
            Some(extender) => {
                trace!(
                    "[{}] invoking {} response extender",
                    request_id(state),
                    res.status()
                );
                extender.extend(state, res);
            }
            None => {
                trace!(
                    "[{}] no response extender for {}",
                    request_id(state),
                    res.status()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::header::CONTENT_LENGTH;
    use hyper::header::HeaderValue;
    use hyper::HeaderMap;

    use crate::helpers::http::response::create_empty_response;
    use crate::state::set_request_id;

    fn state() -> State {
        let mut state = State::new();
        state.put(HeaderMap::new());
        set_request_id(&mut state);
        state
    }

    #[test]
    fn extends_only_matching_status() {
        let mut builder = ResponseFinalizerBuilder::new();
        builder.add(
            StatusCode::NOT_FOUND,
            Arc::new(|_: &mut State, res: &mut Response<Body>| {
                res.headers_mut()
                    .insert(CONTENT_LENGTH, HeaderValue::from_static("3"));
            }),
        );
        let finalizer = builder.finalize();

        let mut state = state();
        let mut res = create_empty_response(&state, StatusCode::NOT_FOUND);
        finalizer.finalize(&mut state, &mut res);
        assert_eq!(res.headers()[CONTENT_LENGTH], "3");

        let mut res = create_empty_response(&state, StatusCode::OK);
        finalizer.finalize(&mut state, &mut res);
        assert!(res.headers().get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn reopened_builder_keeps_extenders() {
        let mut builder = ResponseFinalizerBuilder::new();
        builder.add(
            StatusCode::NOT_FOUND,
            Arc::new(|_: &mut State, res: &mut Response<Body>| {
                *res.status_mut() = StatusCode::GONE;
            }),
        );
        let finalizer = builder.finalize().to_builder().finalize();

        let mut state = state();
        let mut res = create_empty_response(&state, StatusCode::NOT_FOUND);
        finalizer.finalize(&mut state, &mut res);
        assert_eq!(res.status(), StatusCode::GONE);
    }
}
