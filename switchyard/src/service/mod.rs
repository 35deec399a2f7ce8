//! Defines the `RouterService` type which is used to wrap a `Router` (or any other `NewHandler`)
//! and interface with hyper.

use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use futures_util::future::FutureExt;
use hyper::service::Service;
use hyper::{Body, Request, Response};
use log::debug;

use crate::handler::NewHandler;
use crate::state::{request_id, State};

mod trap;

pub(crate) use self::trap::call_handler;

/// Serves requests with a `NewHandler`, creating one `Handler` per request.
///
/// Panics and handler errors are turned into responses and logged, so the service never fails.
///
/// ```rust,no_run
/// # use std::convert::Infallible;
/// # use hyper::server::conn::AddrStream;
/// # use hyper::service::make_service_fn;
/// # use hyper::Server;
/// # use switchyard::router::builder::*;
/// # use switchyard::service::RouterService;
/// # use switchyard::state::State;
/// #
/// # async fn serve() -> Result<(), hyper::Error> {
/// let router = build_router(|route| {
///     route.get("/").to(|state: State| (state, "hello"));
/// })
/// .unwrap();
/// let service = RouterService::new(router);
///
/// let make_service = make_service_fn(move |_: &AddrStream| {
///     let service = service.clone();
///     async move { Ok::<_, Infallible>(service) }
/// });
///
/// Server::bind(&([127, 0, 0, 1], 7878).into())
///     .serve(make_service)
///     .await
/// # }
/// ```
pub struct RouterService<T>
where
    T: NewHandler + 'static,
{
    handler: Arc<T>,
}

impl<T> Clone for RouterService<T>
where
    T: NewHandler + 'static,
{
    fn clone(&self) -> Self {
        RouterService {
            handler: self.handler.clone(),
        }
    }
}

impl<T> RouterService<T>
where
    T: NewHandler + 'static,
{
    /// Wraps `handler`.
    pub fn new(handler: T) -> RouterService<T> {
        RouterService {
            handler: Arc::new(handler),
        }
    }
}

impl<T> Service<Request<Body>> for RouterService<T>
where
    T: NewHandler,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = State::from_request(req);

        debug!(
            "[DEBUG][{}][Thread][{:?}]",
            request_id(&state),
            thread::current().id(),
        );

        let handler = self.handler.clone();
        async move { Ok(call_handler(handler.as_ref(), AssertUnwindSafe(state)).await) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::{Method, StatusCode};

    use crate::helpers::http::response::create_empty_response;
    use crate::router::builder::*;

    fn handler(state: State) -> (State, Response<Body>) {
        let res = create_empty_response(&state, StatusCode::ACCEPTED);
        (state, res)
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn new_handler_closure() {
        let mut service = RouterService::new(|| Ok(handler));

        let response = service.call(request("http://localhost/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn router() {
        let router = build_router(|route| {
            route.get("/").to(handler);
        })
        .unwrap();

        let mut service = RouterService::new(router);

        let response = service.call(request("http://localhost/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.headers().contains_key("x-request-id"));

        let response = service.call(request("http://localhost/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn honours_incoming_request_id() {
        let mut service = RouterService::new(|| Ok(handler));

        let mut req = request("http://localhost/");
        req.headers_mut()
            .insert("x-request-id", "abc-123".parse().unwrap());

        let response = service.call(req).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
