//! Defines the `Router` and supporting types.
//!
//! A request passes through these stages, each skipped once an earlier stage has produced the
//! response:
//!
//! 1. `BeforeStatic` filters,
//! 2. `BeforeRouter` filters, where namespace conditions run,
//! 3. route lookup, answering `404 Not Found` or `405 Method Not Allowed` on failure,
//! 4. `BeforeExec` filters,
//! 5. the handler, followed by the `AfterExec` filters whether it succeeded or not.
//!
//! `FinishRouter` filters and the response extenders then run for every request.

pub mod builder;
pub mod dynamic;
pub mod filter;
pub mod namespace;
pub mod non_match;
pub mod registry;
pub mod response;
pub mod route;
pub mod tree;

pub use self::builder::build_router;

use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::FutureExt;
use hyper::{Body, Method, Response, StatusCode};
use log::trace;

use crate::handler::{Handler, HandlerError, HandlerFuture, NewHandler};
use crate::helpers::http::request::path::RequestPathSegments;
use crate::helpers::http::response::create_empty_response;
use crate::router::filter::{ChainResult, FilterPoint};
use crate::router::registry::Registry;
use crate::router::response::ResponseFinalizer;
use crate::state::{request_id, FromState, State};

pub(crate) struct RouterData {
    registry: Registry,
    response_finalizer: ResponseFinalizer,
}

impl RouterData {
    pub(crate) fn new(registry: Registry, response_finalizer: ResponseFinalizer) -> RouterData {
        RouterData {
            registry,
            response_finalizer,
        }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn response_finalizer(&self) -> &ResponseFinalizer {
        &self.response_finalizer
    }

    fn run_filters(&self, point: FilterPoint, state: &mut State, segments: &[&str]) -> Option<Response<Body>> {
        match self.registry.filters().run(point, state, segments) {
            ChainResult::Continue => None,
            ChainResult::Respond(res) => Some(res),
        }
    }

    /// Runs the filters of a point which follows the handler. The response is available to them
    /// in `State`, where they may alter it; a filter responding replaces it.
    fn run_response_filters(
        &self,
        point: FilterPoint,
        state: &mut State,
        segments: &[&str],
        res: Response<Body>,
    ) -> Response<Body> {
        if self.registry.filters().entries(point).is_empty() {
            return res;
        }

        state.put(res);
        let outcome = self.run_filters(point, state, segments);
        let current = state.try_take::<Response<Body>>();

        match (outcome, current) {
            (Some(res), _) | (None, Some(res)) => res,
            (None, None) => {
                trace!(
                    "[{}] {:?} filter took the response away",
                    request_id(state),
                    point
                );
                create_empty_response(state, StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Everything up to and including the `BeforeExec` filters. Returns the response when a stage
    /// produced one, or the route to dispatch to.
    fn route(
        &self,
        state: &mut State,
        segments: &[&str],
    ) -> Result<Arc<route::RouteBinding>, Response<Body>> {
        if let Some(res) = self.run_filters(FilterPoint::BeforeStatic, state, segments) {
            return Err(res);
        }
        if let Some(res) = self.run_filters(FilterPoint::BeforeRouter, state, segments) {
            return Err(res);
        }

        let method = Method::try_borrow_from(state).cloned().unwrap_or_default();
        let binding = match self.registry.find_route(&method, segments) {
            Ok(found) => {
                trace!(
                    "[{}] matched `{}`",
                    request_id(state),
                    found.pattern()
                );
                let binding = found.payload().clone();
                state.params_mut().extend(found.into_params());
                binding
            }
            Err(non_match) => {
                trace!(
                    "[{}] no route, responding with {}",
                    request_id(state),
                    non_match.status()
                );
                return Err(non_match.into_response(state));
            }
        };

        if let Some(res) = self.run_filters(FilterPoint::BeforeExec, state, segments) {
            return Err(res);
        }

        Ok(binding)
    }

    fn finish(&self, state: &mut State, segments: &[&str], res: Response<Body>) -> Response<Body> {
        let mut res = self.run_response_filters(FilterPoint::FinishRouter, state, segments, res);
        self.response_finalizer.finalize(state, &mut res);
        res
    }
}

/// Responsible for dispatching `Requests` to a matching route and answering requests for which
/// no route is found.
///
/// A `Router` is built once with `builder::build_router` and never changes afterwards, so any
/// number of requests can use it at the same time. `dynamic::DynamicRouter` allows adding routes
/// while serving.
#[derive(Clone)]
pub struct Router {
    data: Arc<RouterData>,
}

impl NewHandler for Router {
    type Instance = Router;

    // Creates a new Router instance to route new HTTP requests
    fn new_handler(&self) -> anyhow::Result<Self::Instance> {
        trace!(" cloning instance");
        Ok(self.clone())
    }
}

impl Handler for Router {
    /// Handles the request by running the filters, finding the route for the path and method,
    /// storing the path parameters in `State` and dispatching to the bound target.
    fn handle(self, mut state: State) -> Pin<Box<HandlerFuture>> {
        trace!("[{}] starting", request_id(&state));

        let (segments, decoded) = match RequestPathSegments::try_borrow_from(&state) {
            Some(rps) => (
                rps.as_strs()
                    .into_iter()
                    .map(str::to_owned)
                    .collect::<Vec<String>>(),
                rps.is_decoded(),
            ),
            None => {
                trace!("[{}] invalid request path segments", request_id(&state));
                let res = create_empty_response(&state, StatusCode::INTERNAL_SERVER_ERROR);
                return futures_util::future::ok((state, res)).boxed();
            }
        };

        let data = self.data;

        async move {
            let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

            let routed = if decoded {
                data.route(&mut state, &segments)
            } else {
                trace!("[{}] request path does not decode", request_id(&state));
                Err(create_empty_response(&state, StatusCode::BAD_REQUEST))
            };

            let res = match routed {
                Err(res) => res,
                Ok(binding) => {
                    trace!("[{}] dispatching", request_id(&state));

                    let (mut state, res) = match binding.dispatch(state).await {
                        Ok((state, res)) => (state, res),
                        Err((mut state, err)) => {
                            trace!(
                                "[{}] converting error into http response \
                                 during finalization: {:?}",
                                request_id(&state),
                                err
                            );
                            let res = create_empty_response(&state, err.status());
                            state.put::<HandlerError>(err);
                            (state, res)
                        }
                    };

                    let res =
                        data.run_response_filters(FilterPoint::AfterExec, &mut state, &segments, res);
                    return finish(&data, state, &segments, res);
                }
            };

            finish(&data, state, &segments, res)
        }
        .boxed()
    }
}

fn finish(
    data: &RouterData,
    mut state: State,
    segments: &[&str],
    res: Response<Body>,
) -> Result<(State, Response<Body>), (State, HandlerError)> {
    let res = data.finish(&mut state, segments, res);
    trace!("[{}] handler complete", request_id(&state));
    Ok((state, res))
}

impl Router {
    pub(crate) fn new(registry: Registry, response_finalizer: ResponseFinalizer) -> Router {
        Router::from_data(Arc::new(RouterData::new(registry, response_finalizer)))
    }

    pub(crate) fn from_data(data: Arc<RouterData>) -> Router {
        Router { data }
    }

    pub(crate) fn data(&self) -> &Arc<RouterData> {
        &self.data
    }

    /// The routes and filters this router serves.
    pub fn registry(&self) -> &Registry {
        self.data.registry()
    }

    /// Builds the URL of the route named `name`. See `Registry::url_for`.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.data.registry().url_for(name, params)
    }
}
