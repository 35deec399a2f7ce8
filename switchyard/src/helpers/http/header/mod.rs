//! Headers recognised by this crate which do not exist in the standard headers
//! provided by the Hyper library.

/// Marks the identifier of a request.
pub const X_REQUEST_ID: &str = "x-request-id";
