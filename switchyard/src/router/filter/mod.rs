//! Filters: application code run at fixed points of the request lifecycle, scoped by a path
//! pattern of their own.
//!
//! Filters registered for the same `FilterPoint` run in registration order. A filter scoped to a
//! pattern only runs for requests whose path matches it. Parameters it captures are added to the
//! request `Params` before it runs, except that a capture never replaces a parameter which is
//! already set, and the rest of the path matched by a trailing wildcard is only visible to the
//! filter while it runs. Namespace conditions capture nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hyper::{Body, Response, StatusCode};
use log::trace;

use crate::error::ConfigError;
use crate::helpers::http::response::create_empty_response;
use crate::router::tree::segment::{Pattern, Segment, SegmentType, SPLAT};
use crate::router::tree::Tree;
use crate::state::{request_id, Params, State};

/// The points of the request lifecycle at which filters run, in lifecycle order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterPoint {
    /// Before anything else, used to short-circuit requests for static assets.
    BeforeStatic,

    /// Before the route lookup.
    BeforeRouter,

    /// After a route matched, before its handler runs.
    BeforeExec,

    /// After the handler finished, whether it succeeded or failed.
    AfterExec,

    /// Last, for every request including those which matched no route or were answered by a
    /// filter.
    FinishRouter,
}

impl FilterPoint {
    /// Every point, in lifecycle order.
    pub const ALL: [FilterPoint; 5] = [
        FilterPoint::BeforeStatic,
        FilterPoint::BeforeRouter,
        FilterPoint::BeforeExec,
        FilterPoint::AfterExec,
        FilterPoint::FinishRouter,
    ];
}

/// What a filter asks the chain to do next.
#[derive(Debug)]
pub enum FilterOutcome {
    /// Carry on with the request.
    Continue,

    /// Answer the request with this response.
    Respond(Response<Body>),
}

/// A filter function.
///
/// Closures of the form `Fn(&mut State) -> FilterOutcome` implement this trait. After the
/// handler ran, the response is available in `State` as `Response<Body>`, and a failed handler's
/// error as `HandlerError`.
pub trait Filter: Send + Sync + 'static {
    /// Runs the filter for the request in `state`.
    fn filter(&self, state: &mut State) -> FilterOutcome;
}

impl<F> Filter for F
where
    F: Fn(&mut State) -> FilterOutcome + Send + Sync + 'static,
{
    fn filter(&self, state: &mut State) -> FilterOutcome {
        self(state)
    }
}

/// A namespace condition. The request is refused with `403 Forbidden` when it returns `false`.
pub type Condition = dyn Fn(&State) -> bool + Send + Sync;

/// Per filter switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterOptions {
    /// When set, the filter is skipped, along with everything after it, once an earlier filter
    /// at the same point has responded. Clear it for filters that must see every request, such
    /// as access logging. Defaults to `true`.
    ///
    /// A filter with this cleared still runs after a response exists, and if it responds too,
    /// its response replaces the earlier one.
    pub return_on_output: bool,

    /// When set, the filter sees only the parameters captured by its own pattern, and the
    /// parameters present before it ran are restored afterwards. Defaults to `false`.
    pub reset_params: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            return_on_output: true,
            reset_params: false,
        }
    }
}

/// The runnable part of a `FilterEntry`.
#[derive(Clone)]
pub enum FilterKind {
    /// An application filter.
    User(Arc<dyn Filter>),

    /// A namespace condition.
    Condition(Arc<Condition>),
}

impl fmt::Debug for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::User(_) => f.write_str("User"),
            FilterKind::Condition(_) => f.write_str("Condition"),
        }
    }
}

/// A filter together with the pattern it is scoped to.
#[derive(Clone)]
pub struct FilterEntry {
    pattern: Pattern,
    tree: Tree<()>,
    kind: FilterKind,
    options: FilterOptions,
}

impl fmt::Debug for FilterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEntry")
            .field("pattern", &self.pattern.to_string())
            .field("kind", &self.kind)
            .field("options", &self.options)
            .finish()
    }
}

impl FilterEntry {
    /// Scopes `kind` to `pattern`.
    ///
    /// A pattern ending in `*` also matches the path without that segment, so `*` matches every
    /// request and `/admin/*` matches `/admin` itself.
    pub fn new(pattern: &str, kind: FilterKind, options: FilterOptions) -> Result<Self, ConfigError> {
        let pattern = Pattern::parse(pattern)?;
        Ok(FilterEntry::from_pattern(pattern, kind, options))
    }

    fn from_pattern(pattern: Pattern, kind: FilterKind, options: FilterOptions) -> Self {
        let mut tree = Tree::new();
        tree.insert(&pattern, ());

        if let Some((last, parent)) = pattern.segments().split_last() {
            if *last.segment_type() == (SegmentType::Glob { split_ext: false }) && !last.is_optional()
            {
                tree.insert(&Pattern::from_segments(parent.to_vec()), ());
            }
        }

        FilterEntry {
            pattern,
            tree,
            kind,
            options,
        }
    }

    /// A filter which refuses every request below the namespace root when `cond` is false.
    pub fn condition(cond: Arc<Condition>) -> Self {
        FilterEntry::from_pattern(
            Pattern::from_segments(vec![Segment::wildcard()]),
            FilterKind::Condition(cond),
            FilterOptions::default(),
        )
    }

    /// The full pattern the filter is scoped to.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// What runs.
    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// The switches for this entry.
    pub fn options(&self) -> FilterOptions {
        self.options
    }

    /// Parameters captured by the filter pattern, if `segments` matches it.
    pub fn matches(&self, segments: &[&str]) -> Option<Vec<(String, String)>> {
        self.tree
            .traverse(segments, &mut |_| true)
            .map(|m| m.into_params())
    }

    /// Names captured by a trailing wildcard of the pattern.
    fn wildcard_names(&self) -> &'static [&'static str] {
        match self.pattern.segments().last().map(Segment::segment_type) {
            Some(SegmentType::Glob { split_ext: true }) => &["path", "ext"],
            Some(SegmentType::Glob { split_ext: false }) => &[SPLAT],
            _ => &[],
        }
    }

    /// Adds `captured` to `params` without replacing anything already set. Returns the wildcard
    /// names which were added, to be removed once the filter has run.
    fn capture_into(&self, params: &mut Params, captured: Vec<(String, String)>) -> Vec<String> {
        if let FilterKind::Condition(_) = self.kind {
            return Vec::new();
        }

        let wildcard = self.wildcard_names();
        let mut transient = Vec::new();

        for (name, value) in captured {
            if params.get(&name).is_some() {
                continue;
            }
            if wildcard.contains(&name.as_str()) {
                transient.push(name.clone());
            }
            params.set(name, value);
        }

        transient
    }

    /// Rewrites the entry as if it had been declared beneath `prefix`.
    fn rebase(&mut self, prefix: &Pattern) {
        self.pattern = prefix.join(&self.pattern);

        let tree = std::mem::take(&mut self.tree);
        self.tree.merge(prefix, tree);
    }

    fn run(&self, state: &mut State) -> FilterOutcome {
        match self.kind {
            FilterKind::User(ref filter) => filter.filter(state),
            FilterKind::Condition(ref cond) => {
                if cond(&*state) {
                    FilterOutcome::Continue
                } else {
                    trace!(
                        "[{}] namespace condition for `{}` refused request",
                        request_id(state),
                        self.pattern
                    );
                    FilterOutcome::Respond(create_empty_response(state, StatusCode::FORBIDDEN))
                }
            }
        }
    }
}

/// The result of running the filters of one point.
#[derive(Debug)]
pub enum ChainResult {
    /// No filter responded.
    Continue,

    /// A filter responded; the request is answered with this response.
    Respond(Response<Body>),
}

/// Filters by point, each list in registration order.
#[derive(Clone, Debug, Default)]
pub struct FilterChain {
    points: HashMap<FilterPoint, Vec<FilterEntry>>,
}

impl FilterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        FilterChain::default()
    }

    /// Appends `entry` to the filters of `point`.
    pub fn insert(&mut self, point: FilterPoint, entry: FilterEntry) {
        trace!(" adding {:?} filter for `{}`", point, entry.pattern);
        self.points.entry(point).or_insert_with(Vec::new).push(entry);
    }

    /// Puts `entry` in front of every filter of `point`.
    pub fn prepend(&mut self, point: FilterPoint, entry: FilterEntry) {
        trace!(" prepending {:?} filter for `{}`", point, entry.pattern);
        self.points.entry(point).or_insert_with(Vec::new).insert(0, entry);
    }

    /// The filters of `point`, in the order they run.
    pub fn entries(&self, point: FilterPoint) -> &[FilterEntry] {
        self.points.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `true` when no filter is registered at any point.
    pub fn is_empty(&self) -> bool {
        self.points.values().all(Vec::is_empty)
    }

    /// Appends every filter of `other`, rewritten beneath `prefix`, after the filters of the same
    /// point in this chain. The filters of one point in `other` stay together, in their order.
    pub fn merge(&mut self, prefix: &Pattern, mut other: FilterChain) {
        for point in FilterPoint::ALL.iter() {
            if let Some(entries) = other.points.remove(point) {
                let target = self.points.entry(*point).or_insert_with(Vec::new);
                for mut entry in entries {
                    entry.rebase(prefix);
                    target.push(entry);
                }
            }
        }
    }

    /// Runs the filters of `point` matching `segments`, in order.
    ///
    /// Once a filter responds, the remaining filters are skipped unless they were registered with
    /// `return_on_output` cleared. A later response replaces an earlier one.
    ///
    /// Parameters already in `Params`, such as those of the matched route, are never replaced by
    /// filter captures.
    pub fn run(&self, point: FilterPoint, state: &mut State, segments: &[&str]) -> ChainResult {
        let mut response: Option<Response<Body>> = None;

        for entry in self.entries(point) {
            if response.is_some() && entry.options.return_on_output {
                break;
            }

            let captured = match entry.matches(segments) {
                Some(captured) => captured,
                None => continue,
            };

            trace!(
                "[{}] running {:?} filter for `{}`",
                request_id(state),
                point,
                entry.pattern
            );

            let saved = if entry.options.reset_params {
                Some(std::mem::take(state.params_mut()))
            } else {
                None
            };

            let transient = entry.capture_into(state.params_mut(), captured);
            let outcome = entry.run(state);

            match saved {
                Some(saved) => *state.params_mut() = saved,
                None => {
                    let params = state.params_mut();
                    for name in transient {
                        params.remove(&name);
                    }
                }
            }

            if let FilterOutcome::Respond(res) = outcome {
                trace!(
                    "[{}] {:?} filter for `{}` responded with {}",
                    request_id(state),
                    point,
                    entry.pattern,
                    res.status()
                );
                response = Some(res);
            }
        }

        match response {
            Some(res) => ChainResult::Respond(res),
            None => ChainResult::Continue,
        }
    }
}
