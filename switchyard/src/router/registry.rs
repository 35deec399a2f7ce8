//! Defines the `Registry`, which owns every routing tree and filter of an application or
//! namespace.

use std::collections::HashMap;
use std::sync::Arc;

use hyper::Method;
use log::trace;

use crate::error::ConfigError;
use crate::helpers::http::{encode_path_segment, encode_query_component};
use crate::router::filter::{FilterChain, FilterEntry, FilterKind, FilterOptions, FilterPoint};
use crate::router::non_match::RouteNonMatch;
use crate::router::route::controller::{Controller, ControllerBinding, MethodMapping};
use crate::router::route::raw::RawHandler;
use crate::router::route::RouteBinding;
use crate::router::tree::segment::{Pattern, SegmentType};
use crate::router::tree::{RouteMatch, Tree};

/// A successful route lookup.
pub type RouteFound<'a> = RouteMatch<'a, Arc<RouteBinding>>;

/// Routes and filters, before or after they were merged together.
///
/// Routes registered for specific methods live in one tree per method. Routes which select by
/// method themselves, such as controllers, live in a catch-all tree which is consulted after the
/// tree of the request method.
#[derive(Clone, Default)]
pub struct Registry {
    trees: HashMap<Method, Tree<Arc<RouteBinding>>>,
    any: Tree<Arc<RouteBinding>>,
    filters: FilterChain,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Adds `binding` at `pattern` to the tree of each method in `methods`, or to the catch-all
    /// tree when `methods` is empty.
    pub fn add_route(
        &mut self,
        methods: &[Method],
        pattern: &str,
        binding: RouteBinding,
    ) -> Result<(), ConfigError> {
        let pattern = Pattern::parse(pattern)?;
        self.add_parsed(methods, &pattern, Arc::new(binding));
        Ok(())
    }

    fn add_parsed(&mut self, methods: &[Method], pattern: &Pattern, binding: Arc<RouteBinding>) {
        if methods.is_empty() {
            trace!(" adding route `{}` for every method", pattern);
            self.any.insert(pattern, binding);
            return;
        }

        for method in methods {
            trace!(" adding route `{}` for {}", pattern, method);
            self.trees
                .entry(method.clone())
                .or_insert_with(Tree::new)
                .insert(pattern, binding.clone());
        }
    }

    /// Adds a controller at `pattern`, resolving its actions through `mapping`.
    pub fn add_controller(
        &mut self,
        pattern: &str,
        controller: Arc<dyn Controller>,
        mapping: &MethodMapping,
        name: Option<String>,
    ) -> Result<(), ConfigError> {
        let parsed = Pattern::parse(pattern)?;
        let binding = ControllerBinding::resolve(controller, mapping, pattern)?;

        let mut binding = RouteBinding::controller(binding);
        if let Some(name) = name {
            binding = binding.with_name(name);
        }

        self.add_parsed(&[], &parsed, Arc::new(binding));
        Ok(())
    }

    /// Adds `/{prefix}/{name}/{action}` and `/{prefix}/{name}/{action}/*` for every action of
    /// `controller`, serving every method.
    pub fn add_auto(&mut self, prefix: &str, controller: Arc<dyn Controller>) -> Result<(), ConfigError> {
        let prefix = Pattern::parse_prefix(prefix)?;
        let name = match controller.name() {
            Some(name) if !name.is_empty() => name.to_ascii_lowercase(),
            _ => return Err(ConfigError::UnnamedController),
        };

        for action in controller.actions() {
            let path = format!("{}/{}/{}", prefix, name, action.to_ascii_lowercase());
            let exact = Pattern::parse(&path)?;
            let tail = Pattern::parse(&format!("{}/*", path))?;

            let binding = Arc::new(RouteBinding::controller(ControllerBinding::fixed(
                controller.clone(),
                action,
            )));
            self.add_parsed(&[], &exact, binding.clone());
            self.add_parsed(&[], &tail, binding);
        }

        Ok(())
    }

    /// Adds a raw handler at `pattern` for every method. With `prefix` set, every path below
    /// `pattern` is routed to it as well.
    pub fn add_raw(
        &mut self,
        pattern: &str,
        handler: Arc<dyn RawHandler>,
        prefix: bool,
    ) -> Result<(), ConfigError> {
        let parsed = Pattern::parse(pattern)?;
        let binding = Arc::new(RouteBinding::raw(handler));

        if prefix {
            let tail = Pattern::parse(&format!("{}/*", parsed))?;
            self.add_parsed(&[], &tail, binding.clone());
        }
        self.add_parsed(&[], &parsed, binding);
        Ok(())
    }

    /// Appends a filter for `point`, scoped to `pattern`.
    pub fn insert_filter(
        &mut self,
        point: FilterPoint,
        pattern: &str,
        kind: FilterKind,
        options: FilterOptions,
    ) -> Result<(), ConfigError> {
        let entry = FilterEntry::new(pattern, kind, options)?;
        self.filters.insert(point, entry);
        Ok(())
    }

    /// Places `entry` before every other filter of `point`.
    pub fn prepend_filter(&mut self, point: FilterPoint, entry: FilterEntry) {
        self.filters.prepend(point, entry);
    }

    /// Moves every route and filter of `child` into this registry beneath `prefix`.
    ///
    /// Nothing is deduplicated: merging the same routes twice keeps both copies, and the copy
    /// merged first takes precedence.
    pub fn merge(&mut self, prefix: &Pattern, child: Registry) {
        trace!(" merging registry under `{}`", prefix);

        let Registry {
            trees,
            any,
            filters,
        } = child;

        for (method, tree) in trees {
            self.trees
                .entry(method)
                .or_insert_with(Tree::new)
                .merge(prefix, tree);
        }
        self.any.merge(prefix, any);
        self.filters.merge(prefix, filters);
    }

    /// The filters of this registry.
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// The tree of routes registered for `method` alone.
    pub fn tree(&self, method: &Method) -> Option<&Tree<Arc<RouteBinding>>> {
        self.trees.get(method)
    }

    /// The tree of routes which select by method themselves.
    pub fn any_tree(&self) -> &Tree<Arc<RouteBinding>> {
        &self.any
    }

    /// `true` when neither routes nor filters are registered.
    pub fn is_empty(&self) -> bool {
        self.trees.values().all(Tree::is_empty) && self.any.is_empty() && self.filters.is_empty()
    }

    /// Finds the route for a request.
    ///
    /// The tree of `method` is searched first, then the catch-all tree for a route supporting
    /// `method`. When neither has one, the path is tried against every other method, which
    /// makes the outcome `405 Method Not Allowed` listing the methods found, or `404 Not Found`
    /// when there are none.
    pub fn find_route(&self, method: &Method, segments: &[&str]) -> Result<RouteFound<'_>, RouteNonMatch> {
        if let Some(tree) = self.trees.get(method) {
            if let Some(found) = tree.traverse(segments, &mut |b| b.supports(method)) {
                return Ok(found);
            }
        }

        if let Some(found) = self.any.traverse(segments, &mut |b| b.supports(method)) {
            return Ok(found);
        }

        let mut allow = Vec::new();

        for (other, tree) in self.trees.iter() {
            if other != method && tree.traverse(segments, &mut |_| true).is_some() {
                allow.push(other.clone());
            }
        }

        self.any.traverse(segments, &mut |b| {
            allow.extend(b.allowed_methods());
            false
        });

        allow.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allow.dedup();

        if allow.is_empty() {
            Err(RouteNonMatch::not_found())
        } else {
            Err(RouteNonMatch::method_not_allowed(allow))
        }
    }

    /// Builds the URL of the route named `name`.
    ///
    /// Parameters are filled in from `params` and percent encoded. Parameters the pattern does
    /// not use are appended as a query string. Returns `None` for an unknown name, a missing
    /// required parameter, or a value rejected by a constrained parameter.
    ///
    /// When several routes carry the same name, the method trees are searched in the order of
    /// their method names, then the catch-all tree.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        let mut trees: Vec<_> = self.trees.iter().collect();
        trees.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));

        let pattern = trees
            .into_iter()
            .map(|(_, tree)| tree)
            .chain(std::iter::once(&self.any))
            .flat_map(|tree| tree.leaves())
            .find(|leaf| leaf.payload().name() == Some(name))
            .map(|leaf| leaf.pattern().clone())?;

        build_url(&pattern, params)
    }
}

fn build_url(pattern: &Pattern, params: &[(&str, &str)]) -> Option<String> {
    let mut used = vec![false; params.len()];
    let mut take = |name: &str| take_param(params, &mut used, name);

    let mut path = String::new();

    for segment in pattern.segments() {
        let value = match segment.segment_type() {
            SegmentType::Static => Some(encode_path_segment(segment.value())),
            SegmentType::Constrained { regex } => match take(segment.value()) {
                Some(v) if regex.is_match(v) => Some(encode_path_segment(v)),
                Some(_) => return None,
                None => None,
            },
            SegmentType::Dynamic => take(segment.value()).map(encode_path_segment),
            SegmentType::Glob { split_ext: false } => take(segment.value()).map(encode_glob),
            SegmentType::Glob { split_ext: true } => match (take("path"), take("ext")) {
                (Some(p), Some(e)) => Some(format!("{}.{}", encode_glob(p), encode_path_segment(e))),
                _ => None,
            },
        };

        match value {
            Some(value) if !value.is_empty() => {
                path.push('/');
                path.push_str(&value);
            }
            _ if segment.is_optional() => break,
            _ => return None,
        }
    }

    if path.is_empty() {
        path.push('/');
    }

    let query: Vec<String> = params
        .iter()
        .zip(used.iter())
        .filter(|(_, used)| !**used)
        .map(|((n, v), _)| format!("{}={}", encode_query_component(n), encode_query_component(v)))
        .collect();

    if !query.is_empty() {
        path.push('?');
        path.push_str(&query.join("&"));
    }

    Some(path)
}

fn take_param<'p>(params: &[(&str, &'p str)], used: &mut [bool], name: &str) -> Option<&'p str> {
    let pos = params.iter().position(|(n, _)| *n == name)?;
    used[pos] = true;
    Some(params[pos].1)
}

fn encode_glob(value: &str) -> String {
    value
        .split('/')
        .filter(|s| !s.is_empty())
        .map(encode_path_segment)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::pin::Pin;

    use hyper::{Body, Response, StatusCode};

    use crate::handler::{HandlerFuture, IntoHandlerFuture};
    use crate::helpers::http::response::create_empty_response;
    use crate::router::route::dispatch::DispatcherImpl;
    use crate::state::State;

    fn handler(state: State) -> (State, Response<Body>) {
        let res = create_empty_response(&state, StatusCode::OK);
        (state, res)
    }

    fn binding(methods: &[Method], name: &str) -> RouteBinding {
        RouteBinding::handler(methods.to_vec(), Box::new(DispatcherImpl::new(|| Ok(handler))))
            .with_name(name)
    }

    fn registry(routes: &[(Method, &str, &str)]) -> Registry {
        let mut registry = Registry::new();
        for (method, pattern, name) in routes {
            registry
                .add_route(&[method.clone()], pattern, binding(&[method.clone()], name))
                .unwrap();
        }
        registry
    }

    fn found(registry: &Registry, method: Method, path: &[&str]) -> Option<String> {
        registry
            .find_route(&method, path)
            .ok()
            .and_then(|m| m.payload().name().map(str::to_owned))
    }

    struct Users;

    impl Controller for Users {
        fn actions(&self) -> &[&'static str] {
            &["get", "post", "list"]
        }

        fn call(&self, action: &str, state: State) -> Pin<Box<HandlerFuture>> {
            (state, action.to_owned()).into_handler_future()
        }

        fn name(&self) -> Option<&str> {
            Some("Users")
        }
    }

    #[test]
    fn routes_by_method() {
        let registry = registry(&[
            (Method::GET, "/user/:id", "show"),
            (Method::PUT, "/user/:id", "update"),
        ]);

        assert_eq!(found(&registry, Method::GET, &["user", "1"]), Some("show".to_owned()));
        assert_eq!(found(&registry, Method::PUT, &["user", "1"]), Some("update".to_owned()));
    }

    #[test]
    fn reports_method_not_allowed_with_allow_list() {
        let registry = registry(&[
            (Method::GET, "/user/:id", "show"),
            (Method::PUT, "/user/:id", "update"),
        ]);

        let (status, allow) = registry
            .find_route(&Method::DELETE, &["user", "1"])
            .err()
            .unwrap()
            .deconstruct();
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(allow, vec![Method::GET, Method::PUT]);

        let status = registry.find_route(&Method::GET, &["nope"]).err().unwrap().status();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn catch_all_tree_is_searched_second() {
        let mut registry = registry(&[(Method::GET, "/things/:id", "get-thing")]);
        registry
            .add_controller("/things/:id", Arc::new(Users), &MethodMapping::empty(), None)
            .unwrap();
        registry
            .add_route(&[], "/ping", binding(&[], "ping"))
            .unwrap();

        assert_eq!(
            found(&registry, Method::GET, &["things", "1"]),
            Some("get-thing".to_owned())
        );
        assert!(registry.find_route(&Method::POST, &["things", "1"]).is_ok());
        assert_eq!(
            found(&registry, Method::PATCH, &["ping"]),
            Some("ping".to_owned())
        );

        let (status, allow) = registry
            .find_route(&Method::DELETE, &["things", "1"])
            .err()
            .unwrap()
            .deconstruct();
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(allow, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn auto_routes_cover_every_action() {
        let mut registry = Registry::new();
        registry.add_auto("/api", Arc::new(Users)).unwrap();

        for action in &["get", "post", "list"] {
            assert!(registry.find_route(&Method::DELETE, &["api", "users", action]).is_ok());
        }
        let m = registry
            .find_route(&Method::GET, &["api", "users", "list", "a", "b"])
            .ok()
            .unwrap();
        assert_eq!(m.param_values(), vec!["a/b"]);
    }

    #[test]
    fn auto_routes_need_a_name() {
        struct Nameless;
        impl Controller for Nameless {
            fn actions(&self) -> &[&'static str] {
                &["get"]
            }
            fn call(&self, _: &str, state: State) -> Pin<Box<HandlerFuture>> {
                (state, StatusCode::OK).into_handler_future()
            }
        }

        assert!(matches!(
            Registry::new().add_auto("/", Arc::new(Nameless)),
            Err(ConfigError::UnnamedController)
        ));
    }

    #[test]
    fn raw_prefix_routes_match_below() {
        let mut registry = Registry::new();
        let raw = |_req: hyper::Request<Body>| async { Ok::<_, crate::handler::HandlerError>(Response::new(Body::empty())) };
        registry.add_raw("/legacy", Arc::new(raw), true).unwrap();

        assert!(registry.find_route(&Method::GET, &["legacy"]).is_ok());
        assert!(registry.find_route(&Method::POST, &["legacy", "a", "b"]).is_ok());
    }

    #[test]
    fn namespace_merge_requires_prefix() {
        let mut parent = Registry::new();
        let child = registry(&[(Method::GET, "/shop/:id", "shop")]);
        parent.merge(&Pattern::parse_prefix("/v1").unwrap(), child);

        assert_eq!(
            found(&parent, Method::GET, &["v1", "shop", "42"]),
            Some("shop".to_owned())
        );
        assert_eq!(found(&parent, Method::GET, &["shop", "42"]), None);
    }

    #[test]
    fn colliding_namespaces_keep_both_route_sets() {
        let mut parent = Registry::new();
        let prefix = Pattern::parse_prefix("/api").unwrap();

        parent.merge(
            &prefix,
            registry(&[(Method::GET, "/same", "first"), (Method::GET, "/a", "a")]),
        );
        parent.merge(
            &prefix,
            registry(&[(Method::GET, "/same", "second"), (Method::GET, "/b", "b")]),
        );

        assert_eq!(found(&parent, Method::GET, &["api", "a"]), Some("a".to_owned()));
        assert_eq!(found(&parent, Method::GET, &["api", "b"]), Some("b".to_owned()));
        assert_eq!(
            found(&parent, Method::GET, &["api", "same"]),
            Some("first".to_owned())
        );
        assert_eq!(parent.tree(&Method::GET).unwrap().leaves().len(), 4);
    }

    #[test]
    fn url_for_uses_fully_prefixed_pattern() {
        let mut inner = registry(&[(Method::GET, "/item/:id([0-9]+)/?:format", "item")]);
        inner
            .add_route(&[Method::GET], "/files/*", binding(&[Method::GET], "files"))
            .unwrap();
        let mut middle = Registry::new();
        middle.merge(&Pattern::parse_prefix("/shop").unwrap(), inner);
        let mut root = Registry::new();
        root.merge(&Pattern::parse_prefix("/v1").unwrap(), middle);

        assert_eq!(
            root.url_for("item", &[("id", "7")]),
            Some("/v1/shop/item/7".to_owned())
        );
        assert_eq!(
            root.url_for("item", &[("id", "7"), ("format", "json"), ("q", "a b")]),
            Some("/v1/shop/item/7/json?q=a%20b".to_owned())
        );
        assert_eq!(
            root.url_for("files", &[("splat", "css/site main.css")]),
            Some("/v1/shop/files/css/site%20main.css".to_owned())
        );
        assert_eq!(root.url_for("item", &[("id", "seven")]), None);
        assert_eq!(root.url_for("item", &[]), None);
        assert_eq!(root.url_for("missing", &[]), None);
    }

    #[test]
    fn url_for_prefers_routes_by_method_name() {
        let mut reg = registry(&[
            (Method::PUT, "/put", "dup"),
            (Method::GET, "/get", "dup"),
            (Method::POST, "/post", "dup"),
        ]);
        reg.add_route(&[Method::DELETE], "/delete", binding(&[Method::DELETE], "dup"))
            .unwrap();

        for _ in 0..8 {
            assert_eq!(reg.url_for("dup", &[]), Some("/delete".to_owned()));
        }
    }
}
