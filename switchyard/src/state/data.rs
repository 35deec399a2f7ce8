use std::any::Any;

use hyper::{Body, HeaderMap, Method, Response, Uri, Version};

use crate::handler::HandlerError;
use crate::helpers::http::request::path::RequestPathSegments;
use crate::state::request_id::RequestId;
use crate::state::Params;

/// A marker trait for types that can be stored in `State`.
///
/// This is typically implemented with an empty `impl` block for the application's own types.
pub trait StateData: Any + Send {}

impl StateData for Body {}
impl StateData for Method {}
impl StateData for Uri {}
impl StateData for Version {}
impl StateData for HeaderMap {}

/// The response produced for the request. Present while the after-execution and finish filters
/// run.
impl StateData for Response<Body> {}

/// The failure reported by the handler, if it failed. Filters running after execution can
/// inspect it.
impl StateData for HandlerError {}

impl StateData for Params {}
impl StateData for RequestPathSegments {}
impl StateData for RequestId {}
