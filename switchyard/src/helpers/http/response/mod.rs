//! Helpers for HTTP response generation

use std::borrow::Cow;

use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Body, Method, Response, StatusCode};
use mime::Mime;

use crate::helpers::http::header::X_REQUEST_ID;
use crate::state::{request_id, FromState, State};

/// Creates a `Response` object and populates it with a set of default headers that help to improve
/// security and conformance to best practice.
///
/// `create_response` utilises `extend_response`, which delegates to `set_headers` for setting
/// security headers. See `set_headers` for information about the headers which are populated.
///
/// For a `HEAD` request the body is discarded.
pub fn create_response<B>(state: &State, status: StatusCode, mime: Mime, body: B) -> Response<Body>
where
    B: Into<Body>,
{
    let mut res = create_empty_response(state, status);

    let body = match Method::try_borrow_from(state) {
        Some(&Method::HEAD) => Body::empty(),
        _ => body.into(),
    };
    *res.body_mut() = body;

    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        res.headers_mut().insert(CONTENT_TYPE, value);
    }

    res
}

/// Produces a simple empty `Response` with the provided status.
pub fn create_empty_response(state: &State, status: StatusCode) -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = status;
    set_headers(state, &mut res);
    res
}

/// Create a `Response` with a status of `308 Permanent Redirect` pointing at `location`.
pub fn create_permanent_redirect<L: Into<Cow<'static, str>>>(
    state: &State,
    location: L,
) -> Response<Body> {
    create_redirect(state, StatusCode::PERMANENT_REDIRECT, location)
}

/// Create a `Response` with a status of `307 Temporary Redirect` pointing at `location`.
pub fn create_temporary_redirect<L: Into<Cow<'static, str>>>(
    state: &State,
    location: L,
) -> Response<Body> {
    create_redirect(state, StatusCode::TEMPORARY_REDIRECT, location)
}

fn create_redirect<L: Into<Cow<'static, str>>>(
    state: &State,
    status: StatusCode,
    location: L,
) -> Response<Body> {
    let mut res = create_empty_response(state, status);
    let location = match location.into() {
        Cow::Borrowed(s) => HeaderValue::from_static(s),
        Cow::Owned(s) => match HeaderValue::from_str(&s) {
            Ok(value) => value,
            Err(_) => return create_empty_response(state, StatusCode::INTERNAL_SERVER_ERROR),
        },
    };
    res.headers_mut().insert(LOCATION, location);
    res
}

/// Sets the `X-Request-ID` header on `res`, echoing the id of the current request.
pub fn set_headers(state: &State, res: &mut Response<Body>) {
    if let Ok(value) = HeaderValue::from_str(request_id(state)) {
        res.headers_mut().insert(X_REQUEST_ID, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_executor::block_on;
    use hyper::body;
    use hyper::HeaderMap;

    use crate::state::set_request_id;

    fn state_for(method: Method) -> State {
        let mut state = State::new();
        state.put(method);
        state.put(HeaderMap::new());
        set_request_id(&mut state);
        state
    }

    #[test]
    fn create_response_sets_body_and_headers() {
        let state = state_for(Method::GET);
        let res = create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, "body");

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(res.headers()[X_REQUEST_ID], request_id(&state));
        let bytes = block_on(body::to_bytes(res.into_body())).unwrap();
        assert_eq!(&bytes[..], b"body");
    }

    #[test]
    fn head_requests_get_no_body() {
        let state = state_for(Method::HEAD);
        let res = create_response(&state, StatusCode::OK, mime::TEXT_PLAIN, "body");

        let bytes = block_on(body::to_bytes(res.into_body())).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn redirects_carry_location() {
        let state = state_for(Method::GET);
        let res = create_temporary_redirect(&state, "/quick-detour");

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()[LOCATION], "/quick-detour");

        let res = create_permanent_redirect(&state, format!("/moved/{}", 1));
        assert_eq!(res.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(res.headers()[LOCATION], "/moved/1");
    }
}
