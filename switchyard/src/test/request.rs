use hyper::header::{HeaderValue, IntoHeaderName};
use hyper::{Body, Method, Request, Uri};

use crate::handler::NewHandler;
use crate::test::{TestClient, TestResponse};

/// Builder API for constructing `TestServer` requests.
#[must_use]
pub struct TestRequest<'a, NH>
where
    NH: NewHandler + 'static,
{
    client: &'a TestClient<NH>,
    request: anyhow::Result<Request<Body>>,
}

impl<'a, NH> TestRequest<'a, NH>
where
    NH: NewHandler + 'static,
{
    pub(super) fn new(
        client: &'a TestClient<NH>,
        method: Method,
        uri: Result<Uri, hyper::http::Error>,
    ) -> TestRequest<'a, NH> {
        let request = uri.and_then(|uri| Request::builder().method(method).uri(uri).body(Body::empty()));

        TestRequest {
            client,
            request: request.map_err(Into::into),
        }
    }

    /// Adds the given header into the underlying `Request`, replacing any existing header with
    /// the same name.
    pub fn with_header<K>(self, name: K, value: HeaderValue) -> TestRequest<'a, NH>
    where
        K: IntoHeaderName,
    {
        let mut request = self.request;

        if let Ok(ref mut req) = request {
            req.headers_mut().insert(name, value);
        }

        TestRequest { request, ..self }
    }

    /// Adds the given body into the underlying `Request`, replacing any existing body.
    pub fn with_body<T>(self, body: T) -> TestRequest<'a, NH>
    where
        T: Into<Body>,
    {
        let mut request = self.request;

        if let Ok(ref mut req) = request {
            *req.body_mut() = body.into();
        }

        TestRequest { request, ..self }
    }

    /// Send a constructed request using the `TestClient` used to create this builder, and await
    /// the response.
    pub fn perform(self) -> anyhow::Result<TestResponse> {
        self.client.perform(self.request?)
    }
}
