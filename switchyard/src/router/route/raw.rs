//! Raw routes, bound to a function of the plain hyper request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::FutureExt;
use hyper::{Body, HeaderMap, Method, Request, Response, Uri, Version};
use log::trace;

use crate::handler::{HandlerError, HandlerFuture};
use crate::state::{request_id, FromState, State};

/// The future returned by a `RawHandler`.
pub type RawFuture = dyn Future<Output = Result<Response<Body>, HandlerError>> + Send;

/// A handler which works on the request as hyper represents it, without access to `State`.
///
/// Closures of the form `Fn(Request<Body>) -> Fut` implement this trait.
pub trait RawHandler: Send + Sync + 'static {
    /// Produces the response for `req`.
    fn call(&self, req: Request<Body>) -> Pin<Box<RawFuture>>;
}

impl<F, Fut> RawHandler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Body>, HandlerError>> + Send + 'static,
{
    fn call(&self, req: Request<Body>) -> Pin<Box<RawFuture>> {
        self(req).boxed()
    }
}

/// Rebuilds the request from `state`, runs `handler` and puts the outcome back into the handler
/// result shape.
///
/// Matched path parameters are available to the raw handler as a request extension holding
/// `Params`.
pub(crate) fn dispatch_raw(handler: Arc<dyn RawHandler>, mut state: State) -> Pin<Box<HandlerFuture>> {
    trace!("[{}] dispatching to raw handler", request_id(&state));

    let mut builder = Request::builder()
        .method(Method::try_borrow_from(&state).cloned().unwrap_or_default())
        .uri(Uri::try_borrow_from(&state).cloned().unwrap_or_default())
        .version(Version::try_borrow_from(&state).cloned().unwrap_or_default());

    if let (Some(target), Some(headers)) = (builder.headers_mut(), HeaderMap::try_borrow_from(&state)) {
        *target = headers.clone();
    }

    let params = state.params_mut().clone();
    let body = Body::try_take_from(&mut state).unwrap_or_else(Body::empty);

    let req = match builder.extension(params).body(body) {
        Ok(req) => req,
        Err(e) => {
            return futures_util::future::err((state, HandlerError::from(e))).boxed();
        }
    };

    async move {
        match handler.call(req).await {
            Ok(res) => Ok((state, res)),
            Err(e) => Err((state, e)),
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_executor::block_on;
    use hyper::StatusCode;

    use crate::state::Params;

    #[test]
    fn raw_handler_sees_request_and_params() {
        let handler = |req: Request<Body>| async move {
            let id = req
                .extensions()
                .get::<Params>()
                .and_then(|p| p.get("id"))
                .unwrap_or("none")
                .to_owned();
            let mut res = Response::new(Body::from(format!("{} {}", req.method(), id)));
            *res.status_mut() = StatusCode::ACCEPTED;
            Ok::<_, HandlerError>(res)
        };

        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/things/9")
            .body(Body::empty())
            .unwrap();
        let mut state = State::from_request(req);
        state.params_mut().set("id", "9");

        let (_, res) = block_on(dispatch_raw(Arc::new(handler), state)).ok().unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        let bytes = block_on(hyper::body::to_bytes(res.into_body())).unwrap();
        assert_eq!(&bytes[..], b"DELETE 9");
    }
}
