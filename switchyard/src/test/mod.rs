//! Contains helpers for testing applications in-process.
//!
//! A `TestServer` passes requests straight to the `NewHandler` the same way `RouterService`
//! does, without opening a socket, and drives the response future to completion on the calling
//! thread.

mod request;

use std::convert::TryFrom;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_executor::block_on;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{body, http, Body, Method, Request, Response, Uri};
use log::trace;

use crate::handler::NewHandler;
use crate::service::call_handler;
use crate::state::State;

pub use self::request::TestRequest;

/// Serves requests with a `NewHandler` for tests.
///
/// # Examples
///
/// ```rust
/// # use hyper::{Body, Response, StatusCode};
/// # use switchyard::helpers::http::response::create_response;
/// # use switchyard::state::State;
/// #
/// fn my_handler(state: State) -> (State, Response<Body>) {
///     let body = "This is the body content.".to_string();
///     let response = create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, body);
///     (state, response)
/// }
///
/// # fn main() {
/// use switchyard::test::TestServer;
///
/// let test_server = TestServer::new(|| Ok(my_handler)).unwrap();
///
/// let response = test_server
///     .client()
///     .get("http://localhost/")
///     .perform()
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// let body = response.read_body().unwrap();
/// assert_eq!(&body[..], b"This is the body content.");
/// # }
/// ```
pub struct TestServer<NH>
where
    NH: NewHandler + 'static,
{
    new_handler: Arc<NH>,
}

impl<NH> Clone for TestServer<NH>
where
    NH: NewHandler + 'static,
{
    fn clone(&self) -> Self {
        TestServer {
            new_handler: self.new_handler.clone(),
        }
    }
}

impl<NH> TestServer<NH>
where
    NH: NewHandler + 'static,
{
    /// Creates a `TestServer` for `new_handler`.
    pub fn new(new_handler: NH) -> anyhow::Result<TestServer<NH>> {
        Ok(TestServer {
            new_handler: Arc::new(new_handler),
        })
    }

    /// Returns a client for this server.
    pub fn client(&self) -> TestClient<NH> {
        TestClient {
            server: self.clone(),
        }
    }

    /// Serves a single request, returning the response exactly as the handler produced it.
    pub fn handle(&self, req: Request<Body>) -> Response<Body> {
        let state = State::from_request(req);
        block_on(call_handler(self.new_handler.as_ref(), AssertUnwindSafe(state)))
    }
}

/// Client interface for issuing requests to a `TestServer`.
pub struct TestClient<NH>
where
    NH: NewHandler + 'static,
{
    server: TestServer<NH>,
}

impl<NH> TestClient<NH>
where
    NH: NewHandler + 'static,
{
    /// Begin constructing a HEAD request using this `TestClient`.
    pub fn head<U>(&self, uri: U) -> TestRequest<'_, NH>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::HEAD, uri)
    }

    /// Begin constructing a GET request using this `TestClient`.
    pub fn get<U>(&self, uri: U) -> TestRequest<'_, NH>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::GET, uri)
    }

    /// Begin constructing an OPTIONS request using this `TestClient`.
    pub fn options<U>(&self, uri: U) -> TestRequest<'_, NH>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::OPTIONS, uri)
    }

    /// Begin constructing a POST request using this `TestClient`.
    pub fn post<B, U>(&self, uri: U, body: B, mime: mime::Mime) -> TestRequest<'_, NH>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request_with_body(Method::POST, uri, body, mime)
    }

    /// Begin constructing a PUT request using this `TestClient`.
    pub fn put<B, U>(&self, uri: U, body: B, mime: mime::Mime) -> TestRequest<'_, NH>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request_with_body(Method::PUT, uri, body, mime)
    }

    /// Begin constructing a PATCH request using this `TestClient`.
    pub fn patch<B, U>(&self, uri: U, body: B, mime: mime::Mime) -> TestRequest<'_, NH>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request_with_body(Method::PATCH, uri, body, mime)
    }

    /// Begin constructing a DELETE request using this `TestClient`.
    pub fn delete<U>(&self, uri: U) -> TestRequest<'_, NH>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        self.build_request(Method::DELETE, uri)
    }

    /// Begin constructing a request with the given HTTP method and URI.
    pub fn build_request<U>(&self, method: Method, uri: U) -> TestRequest<'_, NH>
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        TestRequest::new(self, method, Uri::try_from(uri).map_err(Into::into))
    }

    /// Begin constructing a request with the given HTTP method, URI and body.
    pub fn build_request_with_body<B, U>(
        &self,
        method: Method,
        uri: U,
        body: B,
        mime: mime::Mime,
    ) -> TestRequest<'_, NH>
    where
        B: Into<Body>,
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        let request = self.build_request(method, uri).with_body(body);

        match HeaderValue::from_str(mime.as_ref()) {
            Ok(value) => request.with_header(CONTENT_TYPE, value),
            Err(_) => request,
        }
    }

    /// Send a constructed request using this `TestClient`, and await the response.
    pub fn perform(&self, req: Request<Body>) -> anyhow::Result<TestResponse> {
        trace!(" performing test request {} {}", req.method(), req.uri());
        Ok(TestResponse {
            response: self.server.handle(req),
        })
    }
}

/// Wrapping struct for the `Response` returned by a `TestClient`. Provides access to the
/// `Response` value via the `Deref`, `DerefMut` and `Into` traits, and also provides a function for
/// awaiting a completed response body.
pub struct TestResponse {
    response: Response<Body>,
}

impl Deref for TestResponse {
    type Target = Response<Body>;

    fn deref(&self) -> &Response<Body> {
        &self.response
    }
}

impl DerefMut for TestResponse {
    fn deref_mut(&mut self) -> &mut Response<Body> {
        &mut self.response
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestResponse({})", self.response.status())
    }
}

impl From<TestResponse> for Response<Body> {
    fn from(response: TestResponse) -> Response<Body> {
        response.response
    }
}

impl TestResponse {
    /// Awaits the body of the underlying `Response`, and returns it.
    pub fn read_body(self) -> Result<Vec<u8>, hyper::Error> {
        let bytes = block_on(body::to_bytes(self.response.into_body()))?;
        Ok(bytes.to_vec())
    }

    /// Awaits the UTF-8 encoded body of the underlying `Response`, and returns the `String`.
    pub fn read_utf8_body(self) -> anyhow::Result<String> {
        let buf = self.read_body()?;
        let s = String::from_utf8(buf)?;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::StatusCode;

    use crate::helpers::http::response::create_response;
    use crate::state::FromState;

    fn echo(mut state: State) -> (State, Response<Body>) {
        let method = Method::borrow_from(&state).clone();
        let content_type = hyper::HeaderMap::borrow_from(&state)
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();
        let body = Body::take_from(&mut state);
        let body = block_on(body::to_bytes(body)).map(|b| b.to_vec()).unwrap_or_default();

        let text = format!("{} {} {}", method, content_type, String::from_utf8_lossy(&body));
        let res = create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, text);
        (state, res)
    }

    #[test]
    fn serves_requests() {
        let server = TestServer::new(|| Ok(echo)).unwrap();

        let res = server
            .client()
            .post("http://localhost/", "payload", mime::TEXT_PLAIN)
            .perform()
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(res.read_utf8_body().unwrap(), "POST text/plain payload");
    }

    #[test]
    fn head_requests_have_empty_bodies() {
        let server = TestServer::new(|| Ok(echo)).unwrap();

        let res = server.client().head("http://localhost/").perform().unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.read_body().unwrap().is_empty());
    }

    #[test]
    fn invalid_uri_is_an_error() {
        let server = TestServer::new(|| Ok(echo)).unwrap();
        assert!(server.client().get("http://local host/").perform().is_err());
    }
}
