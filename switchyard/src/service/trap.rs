//! Defines functionality for processing a request and trapping errors and panics in response
//! generation.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use futures_util::future::FutureExt;
use hyper::{Body, Response, StatusCode};
use log::{error, info};

use crate::handler::{Handler, HandlerError, IntoResponse, NewHandler};
use crate::state::{request_id, State};

/// Instantiates a `Handler` from the given `NewHandler`, and invokes it with the request. If a
/// panic occurs from `NewHandler::new_handler` or `Handler::handle`, it is trapped and will result
/// in a `500 Internal Server Error` response.
///
/// Every request is logged with its status and duration once the response is known.
pub(crate) async fn call_handler<T>(t: &T, state: AssertUnwindSafe<State>) -> Response<Body>
where
    T: NewHandler,
{
    let started = Instant::now();
    let AssertUnwindSafe(state) = state;
    let id = request_id(&state).to_owned();

    let res = catch_unwind(AssertUnwindSafe(move || match t.new_handler() {
        Ok(handler) => handler.handle(state),
        Err(e) => {
            let err = HandlerError::from(e);
            futures_util::future::err((state, err)).boxed()
        }
    }));

    let f = match res {
        Ok(f) => f,
        Err(_) => {
            error!(
                "[PANIC][{}][A panic occurred while invoking the handler][{:?}]",
                id,
                started.elapsed()
            );
            return internal_server_error();
        }
    };

    match AssertUnwindSafe(f).catch_unwind().await {
        Ok(Ok((state, res))) => finalize_success_response(started, &state, res),
        Ok(Err((state, err))) => finalize_error_response(started, &state, err),
        Err(_) => {
            error!(
                "[PANIC][{}][A panic occurred while polling the future][{:?}]",
                id,
                started.elapsed()
            );
            internal_server_error()
        }
    }
}

fn finalize_success_response(started: Instant, state: &State, response: Response<Body>) -> Response<Body> {
    info!(
        "[RESPONSE][{}][{:?}][{}][{:?}]",
        request_id(state),
        response.version(),
        response.status(),
        started.elapsed()
    );

    response
}

fn finalize_error_response(started: Instant, state: &State, err: HandlerError) -> Response<Body> {
    error!(
        "[ERROR][{}][Error: {}][{:?}]",
        request_id(state),
        err,
        started.elapsed()
    );

    err.into_response(state)
}

fn internal_server_error() -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    res
}
