use std::sync::Arc;

use crate::router::builder::Registration;
use crate::router::filter::{Filter, FilterKind, FilterOptions, FilterPoint};

/// Builds a filter, created by `DrawRoutes::filter`.
///
/// ```rust
/// # use hyper::StatusCode;
/// # use switchyard::helpers::http::response::create_empty_response;
/// # use switchyard::router::filter::{FilterOutcome, FilterPoint};
/// # use switchyard::state::State;
/// # use switchyard::router::builder::*;
/// # use switchyard::test::TestServer;
/// #
/// fn deny(state: &mut State) -> FilterOutcome {
///     FilterOutcome::Respond(create_empty_response(state, StatusCode::UNAUTHORIZED))
/// }
///
/// # fn main() {
/// let router = build_router(|route| {
///     route.get("/admin/users").to(|state: State| (state, "users"));
///     route.filter(FilterPoint::BeforeExec, "/admin/*").to(deny);
/// })
/// .unwrap();
/// #
/// # let test_server = TestServer::new(router).unwrap();
/// # let response = test_server.client()
/// #     .get("https://example.com/admin/users")
/// #     .perform()
/// #     .unwrap();
/// # assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
/// # }
/// ```
pub struct FilterBuilder<'a> {
    registration: &'a mut Registration,
    point: FilterPoint,
    pattern: String,
    options: FilterOptions,
}

impl<'a> FilterBuilder<'a> {
    pub(super) fn new(registration: &'a mut Registration, point: FilterPoint, pattern: &str) -> Self {
        FilterBuilder {
            registration,
            point,
            pattern: pattern.to_owned(),
            options: FilterOptions::default(),
        }
    }

    /// When `true` (the default), the filter is skipped once an earlier filter of the same point
    /// has responded. When `false`, it still runs, and a response it gives replaces the earlier
    /// one.
    pub fn return_on_output(mut self, value: bool) -> Self {
        self.options.return_on_output = value;
        self
    }

    /// When `true`, parameters captured by the filter pattern are only visible to this filter.
    pub fn reset_params(mut self, value: bool) -> Self {
        self.options.reset_params = value;
        self
    }

    /// Adds `filter` to the chain.
    pub fn to<F>(self, filter: F)
    where
        F: Filter,
    {
        let result = self.registration.registry_mut().insert_filter(
            self.point,
            &self.pattern,
            FilterKind::User(Arc::new(filter)),
            self.options,
        );
        self.registration.record(result);
    }
}
