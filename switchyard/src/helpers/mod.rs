//! Helpers for application code and for the router internals.

pub mod http;
