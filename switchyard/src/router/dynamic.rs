//! Defines `DynamicRouter`, a router which accepts new routes while it serves requests.

use std::pin::Pin;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{info, trace};
use parking_lot::Mutex;

use crate::error::ConfigError;
use crate::handler::{Handler, HandlerFuture, NewHandler};
use crate::router::builder::{Registration, RouterBuilder};
use crate::router::{Router, RouterData};
use crate::state::State;

/// A `Router` whose routes and filters can be extended after serving began.
///
/// Every request is routed by the snapshot current when it arrived. `update` applies changes to
/// a copy of that snapshot and publishes the copy in one step, so a request never observes a
/// half-applied change, and routing never waits on a lock. Updates are applied one at a time.
///
/// ```rust
/// # use hyper::StatusCode;
/// # use switchyard::router::builder::*;
/// # use switchyard::router::dynamic::DynamicRouter;
/// # use switchyard::state::State;
/// # use switchyard::test::TestServer;
/// #
/// # fn main() {
/// let router = DynamicRouter::new(build_router(|_| ()).unwrap());
/// let test_server = TestServer::new(router.clone()).unwrap();
///
/// router
///     .update(|route| {
///         route.get("/late").to(|state: State| (state, StatusCode::ACCEPTED));
///     })
///     .unwrap();
///
/// let response = test_server.client()
///     .get("https://example.com/late")
///     .perform()
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::ACCEPTED);
/// # }
/// ```
#[derive(Clone)]
pub struct DynamicRouter {
    current: Arc<ArcSwap<RouterData>>,
    writer: Arc<Mutex<()>>,
}

impl DynamicRouter {
    /// Starts from the routes and filters of `router`.
    pub fn new(router: Router) -> Self {
        DynamicRouter {
            current: Arc::new(ArcSwap::new(router.data().clone())),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// The router requests are currently routed with.
    pub fn snapshot(&self) -> Router {
        Router::from_data(self.current.load_full())
    }

    /// Adds routes, filters, namespaces or response extenders using the provided closure.
    ///
    /// Either every change made by the closure is published or, when one of them fails, none is
    /// and the first problem is returned.
    pub fn update<F>(&self, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut RouterBuilder<'_>),
    {
        let _guard = self.writer.lock();
        let current = self.current.load_full();
        trace!(" updating dynamic router");

        let mut registration = Registration::new(current.registry().clone());
        let mut response_finalizer_builder = current.response_finalizer().to_builder();

        {
            let mut builder = RouterBuilder::new(&mut registration, &mut response_finalizer_builder);
            f(&mut builder);
        }

        let registry = registration.finish()?;
        self.current.store(Arc::new(RouterData::new(
            registry,
            response_finalizer_builder.finalize(),
        )));
        info!(" dynamic router updated");
        Ok(())
    }
}

impl NewHandler for DynamicRouter {
    type Instance = Router;

    fn new_handler(&self) -> anyhow::Result<Self::Instance> {
        Ok(self.snapshot())
    }
}

impl Handler for DynamicRouter {
    fn handle(self, state: State) -> Pin<Box<HandlerFuture>> {
        self.snapshot().handle(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use hyper::StatusCode;

    use crate::router::builder::{build_router, DefineSingleRoute, DrawRoutes};
    use crate::router::namespace::Namespace;
    use crate::test::TestServer;

    fn ok(state: State) -> (State, StatusCode) {
        (state, StatusCode::OK)
    }

    #[test]
    fn snapshots_are_unaffected_by_updates() {
        let router = DynamicRouter::new(
            build_router(|route| {
                route.get("/a").to(ok);
            })
            .unwrap(),
        );

        let before = router.snapshot();
        router
            .update(|route| {
                route.get("/b").to(ok);
            })
            .unwrap();

        let server = TestServer::new(before).unwrap();
        let res = server.client().get("http://localhost/b").perform().unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let server = TestServer::new(router).unwrap();
        for path in &["/a", "/b"] {
            let res = server
                .client()
                .get(&format!("http://localhost{}", path))
                .perform()
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
    }

    #[test]
    fn failed_update_changes_nothing() {
        let router = DynamicRouter::new(build_router(|_| ()).unwrap());

        let result = router.update(|route| {
            route.get("/good").to(ok);
            route.get("/bad/*/more").to(ok);
        });
        assert!(result.is_err());

        let server = TestServer::new(router).unwrap();
        let res = server.client().get("http://localhost/good").perform().unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn concurrent_updates_all_land() {
        let router = DynamicRouter::new(build_router(|_| ()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let router = router.clone();
                thread::spawn(move || {
                    let ns = Namespace::build(&format!("/n{}", i), |ns| {
                        ns.get("/x").to(ok);
                    })
                    .unwrap();
                    router.update(|route| route.add_namespace(ns)).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let server = TestServer::new(router).unwrap();
        for i in 0..8 {
            let res = server
                .client()
                .get(&format!("http://localhost/n{}/x", i))
                .perform()
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
    }
}
