//! Helpers for HTTP request handling.

pub mod path;
