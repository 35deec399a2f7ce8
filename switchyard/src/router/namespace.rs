//! Namespaces: groups of routes and filters built on their own and mounted beneath a prefix.
//!
//! A namespace owns a `Registry` of its own while it is built. Mounting it, with
//! `DrawRoutes::add_namespace` or `DrawRoutes::namespace`, moves every route and filter into the
//! parent registry with the prefix in front of its pattern. A namespace condition becomes the first
//! `BeforeRouter` filter of the namespace and answers `403 Forbidden` when it is false.

use std::sync::Arc;

use log::trace;

use crate::error::ConfigError;
use crate::router::builder::{DrawRoutes, Registration};
use crate::router::filter::{Filter, FilterEntry, FilterKind, FilterOptions, FilterPoint};
use crate::router::registry::Registry;
use crate::router::tree::segment::Pattern;
use crate::state::State;

/// Routes and filters waiting to be mounted beneath `prefix`.
pub struct Namespace {
    prefix: Pattern,
    registry: Registry,
}

impl Namespace {
    /// Builds a namespace with the provided closure.
    ///
    /// The prefix may contain literal and parameter segments, but no wildcard or optional
    /// segment. Parameters captured by the prefix are stored with the route parameters.
    ///
    /// ```rust
    /// # use hyper::StatusCode;
    /// # use hyper::header::HeaderMap;
    /// # use switchyard::router::builder::*;
    /// # use switchyard::router::namespace::Namespace;
    /// # use switchyard::state::{FromState, State};
    /// # use switchyard::test::TestServer;
    /// #
    /// # fn main() {
    /// let shop = Namespace::build("/v1/shop", |ns| {
    ///     ns.cond(|state: &State| HeaderMap::borrow_from(state).contains_key("x-tenant"));
    ///     ns.get("/:id").to(|state: State| (state, "item"));
    /// })
    /// .unwrap();
    ///
    /// let router = build_router(|route| route.add_namespace(shop)).unwrap();
    /// #
    /// # let test_server = TestServer::new(router).unwrap();
    /// # let response = test_server.client()
    /// #     .get("https://example.com/v1/shop/42")
    /// #     .perform()
    /// #     .unwrap();
    /// # assert_eq!(response.status(), StatusCode::FORBIDDEN);
    /// #
    /// # let response = test_server.client()
    /// #     .get("https://example.com/v1/shop/42")
    /// #     .with_header("x-tenant", "acme".parse().unwrap())
    /// #     .perform()
    /// #     .unwrap();
    /// # assert_eq!(response.read_utf8_body().unwrap(), "item");
    /// # }
    /// ```
    pub fn build<F>(prefix: &str, f: F) -> Result<Namespace, ConfigError>
    where
        F: FnOnce(&mut NamespaceBuilder<'_>),
    {
        trace!(" building namespace `{}`", prefix);
        let prefix = Pattern::parse_prefix(prefix)?;

        let mut registration = Registration::new(Registry::new());
        {
            let mut builder = NamespaceBuilder {
                registration: &mut registration,
            };
            f(&mut builder);
        }

        Ok(Namespace {
            prefix,
            registry: registration.finish()?,
        })
    }

    /// The prefix the namespace mounts beneath.
    pub fn prefix(&self) -> &Pattern {
        &self.prefix
    }

    /// The routes and filters of the namespace, relative to its prefix.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn into_parts(self) -> (Pattern, Registry) {
        (self.prefix, self.registry)
    }
}

/// The builder passed to the closure of `Namespace::build` and `DrawRoutes::namespace`.
///
/// Besides everything `DrawRoutes` offers, it adds conditions and namespace-wide filters.
pub struct NamespaceBuilder<'a> {
    registration: &'a mut Registration,
}

impl<'a> NamespaceBuilder<'a> {
    /// Refuses every request for the namespace with `403 Forbidden` unless `cond` is true.
    ///
    /// The condition runs before every other `BeforeRouter` filter of the namespace, including
    /// those added before it. Of several conditions, the one added last runs first.
    pub fn cond<C>(&mut self, cond: C)
    where
        C: Fn(&State) -> bool + Send + Sync + 'static,
    {
        self.registration
            .registry_mut()
            .prepend_filter(FilterPoint::BeforeRouter, FilterEntry::condition(Arc::new(cond)));
    }

    /// Runs `filter` before routing, for every request for the namespace.
    pub fn before<F>(&mut self, filter: F)
    where
        F: Filter,
    {
        self.namespace_filter(FilterPoint::BeforeRouter, Arc::new(filter))
    }

    /// Runs `filter` once the response is known, for every request for the namespace.
    pub fn after<F>(&mut self, filter: F)
    where
        F: Filter,
    {
        self.namespace_filter(FilterPoint::FinishRouter, Arc::new(filter))
    }

    fn namespace_filter(&mut self, point: FilterPoint, filter: Arc<dyn Filter>) {
        let result = self.registration.registry_mut().insert_filter(
            point,
            "*",
            FilterKind::User(filter),
            FilterOptions::default(),
        );
        self.registration.record(result);
    }
}

impl<'a> DrawRoutes for NamespaceBuilder<'a> {
    fn registration(&mut self) -> &mut Registration {
        &mut *self.registration
    }
}
