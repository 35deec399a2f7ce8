//! Defines types for handlers, the units of application code a route dispatches to.
//!
//! A function can be used directly as a handler using one of the [default implementations of
//! `Handler`][handler-impl], but the trait can also be implemented directly for greater control.
//!
//! [handler-impl]: trait.Handler.html#implementors
use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use futures_util::future::{self, FutureExt};
use hyper::{Body, Response, StatusCode};
use mime::{self, Mime};

use crate::helpers::http::response::create_response;
use crate::state::State;

mod error;

pub use self::error::HandlerError;

/// The result of invoking a `Handler`: the `State` is always returned, alongside either a
/// response or the error that prevented one from being built.
pub type HandlerResult = std::result::Result<(State, Response<Body>), (State, HandlerError)>;

/// A type alias for the trait objects returned by `Handler`.
///
/// When the `Future` resolves to an error, the `(State, HandlerError)` value is used to generate
/// an appropriate HTTP error response.
pub type HandlerFuture = dyn Future<Output = HandlerResult> + Send;

/// A `Handler` receives a request that was routed to it and returns a future which resolves to a
/// response.
///
/// The `Handler` is created by its `NewHandler` implementation, and is used for a single request.
pub trait Handler: Send {
    /// Handles the request, returning a boxed future which resolves to a response.
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>>;
}

impl<F, R> Handler for F
where
    F: FnOnce(State) -> R + Send,
    R: IntoHandlerFuture,
{
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
        self(state).into_handler_future()
    }
}

/// Creates new `Handler` values.
///
/// Routes hold a `NewHandler` and ask it for a fresh `Handler` for every request they dispatch.
pub trait NewHandler: Send + Sync {
    /// The type of `Handler` created by the implementor.
    type Instance: Handler + Send;

    /// Create and return a new `Handler` value.
    fn new_handler(&self) -> anyhow::Result<Self::Instance>;
}

impl<F, H> NewHandler for F
where
    F: Fn() -> anyhow::Result<H> + Send + Sync,
    H: Handler + Send,
{
    type Instance = H;

    fn new_handler(&self) -> anyhow::Result<H> {
        self()
    }
}

/// Represents a type which can be converted into the future type returned by a `Handler`.
///
/// This is used to allow functions with different return types to satisfy the `Handler` trait
/// bound via the generic function implementation.
pub trait IntoHandlerFuture {
    /// Converts this value into a boxed future resolving to a state and response.
    fn into_handler_future(self) -> Pin<Box<HandlerFuture>>;
}

impl<T> IntoHandlerFuture for (State, T)
where
    T: IntoResponse,
{
    fn into_handler_future(self) -> Pin<Box<HandlerFuture>> {
        let (state, t) = self;
        let response = t.into_response(&state);
        future::ok((state, response)).boxed()
    }
}

impl IntoHandlerFuture for Pin<Box<HandlerFuture>> {
    fn into_handler_future(self) -> Pin<Box<HandlerFuture>> {
        self
    }
}

/// Represents a type which can be converted to a response. This trait is used in converting the
/// return type of a function into a response.
pub trait IntoResponse {
    /// Converts this value into a `hyper::Response`
    fn into_response(self, state: &State) -> Response<Body>;
}

impl IntoResponse for Response<Body> {
    fn into_response(self, _state: &State) -> Response<Body> {
        self
    }
}

impl<T, E> IntoResponse for std::result::Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    fn into_response(self, state: &State) -> Response<Body> {
        match self {
            Ok(res) => res.into_response(state),
            Err(e) => e.into_response(state),
        }
    }
}

impl<B> IntoResponse for (Mime, B)
where
    B: Into<Body>,
{
    fn into_response(self, state: &State) -> Response<Body> {
        (StatusCode::OK, self.0, self.1).into_response(state)
    }
}

impl<B> IntoResponse for (StatusCode, Mime, B)
where
    B: Into<Body>,
{
    fn into_response(self, state: &State) -> Response<Body> {
        let (status, mime, body) = self;
        create_response(state, status, mime, body)
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self, state: &State) -> Response<Body> {
        crate::helpers::http::response::create_empty_response(state, self)
    }
}

impl IntoResponse for String {
    fn into_response(self, state: &State) -> Response<Body> {
        (mime::TEXT_PLAIN, self).into_response(state)
    }
}

impl IntoResponse for &'static str {
    fn into_response(self, state: &State) -> Response<Body> {
        (mime::TEXT_PLAIN, self).into_response(state)
    }
}

impl IntoResponse for Cow<'static, str> {
    fn into_response(self, state: &State) -> Response<Body> {
        match self {
            Cow::Borrowed(s) => s.into_response(state),
            Cow::Owned(s) => s.into_response(state),
        }
    }
}

impl IntoResponse for Vec<u8> {
    fn into_response(self, state: &State) -> Response<Body> {
        (mime::APPLICATION_OCTET_STREAM, self).into_response(state)
    }
}
