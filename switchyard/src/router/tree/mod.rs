//! Defines a hierarchial `Tree` with subtrees of `Node`.
//!
//! A `Tree` stores route patterns segment by segment and resolves request paths back to the
//! value registered for them, together with the parameters captured on the way.

use log::trace;

use crate::error::ConfigError;
use crate::helpers::http::request::path::RequestPathSegments;
use crate::router::tree::node::{Capture, Leaf, Node};
use crate::router::tree::segment::Pattern;

pub mod node;
pub mod regex;
pub mod segment;

/// A routing tree, mapping patterns to values of `T`.
///
/// ```rust
/// use switchyard::router::tree::Tree;
/// use switchyard::router::tree::segment::Pattern;
///
/// let mut tree = Tree::new();
/// tree.insert(&Pattern::parse("/user/new").unwrap(), "new");
/// tree.insert(&Pattern::parse("/user/:id").unwrap(), "show");
///
/// let m = tree.lookup("/user/new").unwrap();
/// assert_eq!(*m.payload(), "new");
///
/// let m = tree.lookup("/user/42").unwrap();
/// assert_eq!(*m.payload(), "show");
/// assert_eq!(m.param_values(), vec!["42"]);
/// ```
#[derive(Clone)]
pub struct Tree<T> {
    root: Node<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree::new()
    }
}

impl<T> Tree<T> {
    /// Creates a new `Tree` with an empty root.
    pub fn new() -> Self {
        trace!(" creating new tree");
        Tree { root: Node::new() }
    }

    /// Borrow the root `Node` of this `Tree`.
    pub fn borrow_root(&self) -> &Node<T> {
        &self.root
    }

    /// `true` when no route has been inserted.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Adds `payload` as a new leaf for `pattern`.
    ///
    /// Inserting a pattern which is already present adds another leaf after the existing ones;
    /// nothing is ever overwritten.
    pub fn insert(&mut self, pattern: &Pattern, payload: T)
    where
        T: Clone,
    {
        trace!(" inserting leaf for `{}`", pattern);
        self.root.insert(pattern, payload);
    }

    /// Parses `pattern` and inserts `payload` for it.
    pub fn insert_str(&mut self, pattern: &str, payload: T) -> Result<(), ConfigError>
    where
        T: Clone,
    {
        let pattern = Pattern::parse(pattern)?;
        self.insert(&pattern, payload);
        Ok(())
    }

    /// Resolves a raw request path to the first matching leaf.
    ///
    /// The path is split and percent-decoded the same way the `Router` does it for requests. A
    /// path which does not decode matches nothing.
    pub fn lookup(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        let segments = RequestPathSegments::new(path);
        if !segments.is_decoded() {
            return None;
        }
        self.traverse(&segments.as_strs(), &mut |_| true)
    }

    /// Resolves already split path segments to the first matching leaf whose payload `accept`
    /// agrees to.
    ///
    /// Lookup never modifies the tree, so any number of requests may traverse it at once.
    pub fn traverse(
        &self,
        segments: &[&str],
        accept: &mut dyn FnMut(&T) -> bool,
    ) -> Option<RouteMatch<'_, T>> {
        trace!(" starting tree traversal");
        let mut captured = Vec::with_capacity(segments.len());

        self.root
            .find(segments, &mut captured, accept)
            .map(|(leaf, params)| RouteMatch { leaf, params })
    }

    /// Moves every route of `other` beneath `prefix` in this tree.
    ///
    /// Each moved leaf has its pattern rewritten to start with `prefix`, so it still describes
    /// the full path it answers to. Leaves which end up at a position that already holds leaves
    /// are appended after them.
    pub fn merge(&mut self, prefix: &Pattern, other: Tree<T>) {
        trace!(" merging tree under `{}`", prefix);

        let mut other = other.root;
        other.rebase(prefix, &Capture::for_pattern(prefix));

        let mut node = &mut self.root;
        for segment in prefix.segments() {
            node = node.child_mut(segment);
        }
        node.absorb(other);
    }

    /// Every leaf in the tree.
    ///
    /// Leaves are listed depth first, each node's own leaves before those of its children.
    pub fn leaves(&self) -> Vec<&Leaf<T>> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }
}

/// The outcome of a successful lookup.
pub struct RouteMatch<'a, T> {
    leaf: &'a Leaf<T>,
    params: Vec<(String, String)>,
}

impl<'a, T> RouteMatch<'a, T> {
    /// The matched leaf.
    pub fn leaf(&self) -> &'a Leaf<T> {
        self.leaf
    }

    /// The value bound to the matched leaf.
    pub fn payload(&self) -> &'a T {
        self.leaf.payload()
    }

    /// The full pattern of the matched leaf.
    pub fn pattern(&self) -> &'a Pattern {
        self.leaf.pattern()
    }

    /// Captured parameters, in path order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Consumes the match, returning the captured parameters.
    pub fn into_params(self) -> Vec<(String, String)> {
        self.params
    }

    /// Names of the captured parameters, in path order.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Values of the captured parameters, in path order.
    pub fn param_values(&self) -> Vec<&str> {
        self.params.iter().map(|(_, v)| v.as_str()).collect()
    }
}
