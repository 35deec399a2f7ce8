//! Defines functionality for extending a Response.

use hyper::{Body, Response};
use log::trace;

use crate::state::{request_id, State};

/// Extend the `Response` based on current `State` and `Response` data.
pub trait ResponseExtender: Send + Sync {
    /// Extend the Response
    fn extend(&self, state: &mut State, res: &mut Response<Body>);
}

impl<F> ResponseExtender for F
where
    F: Fn(&mut State, &mut Response<Body>) + Send + Sync,
{
    fn extend(&self, state: &mut State, res: &mut Response<Body>) {
        trace!(
            "[{}] running closure based response extender",
            request_id(state)
        );
        self(state, res);
    }
}
