//! Switchyard &ndash; segment-tree request routing with namespaces and filter chains for hyper.
//!
//! Routes are registered against patterns made of literal, regex-constrained, parameter and
//! wildcard segments. Each route carries a binding: a plain handler, a controller with a method
//! map, or a raw handler. Filters run at fixed points of the request lifecycle, and namespaces
//! group routes and filters under a shared prefix behind an optional condition.
//!
//! ```rust
//! # use hyper::StatusCode;
//! use switchyard::prelude::*;
//! use switchyard::router::build_router;
//! use switchyard::state::{Params, State};
//! use switchyard::test::TestServer;
//!
//! fn show(state: State) -> (State, String) {
//!     let id = Params::borrow_from(&state).get("id").unwrap_or("").to_owned();
//!     (state, format!("user {}", id))
//! }
//!
//! # fn main() {
//! let router = build_router(|route| {
//!     route.namespace("/v1", |ns| {
//!         ns.get("/users/:id([0-9]+)").to(show);
//!     });
//! })
//! .unwrap();
//!
//! let test_server = TestServer::new(router).unwrap();
//! let response = test_server
//!     .client()
//!     .get("http://localhost/v1/users/42")
//!     .perform()
//!     .unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.read_utf8_body().unwrap(), "user 42");
//! # }
//! ```
#![doc(html_root_url = "https://docs.rs/switchyard/0.1.0")] // Update when changed in Cargo.toml
#![warn(missing_docs, deprecated)]
#![doc(test(no_crate_inject, attr(deny(warnings))))]

pub mod error;
pub mod handler;
pub mod helpers;
pub mod prelude;
pub mod router;
pub mod service;
pub mod state;

/// Test utilities for routers and handlers.
#[cfg(feature = "testing")]
pub mod test;

pub use crate::error::{ConfigError, PatternError};
pub use crate::router::dynamic::DynamicRouter;
pub use crate::router::{build_router, Router};
pub use crate::service::RouterService;
