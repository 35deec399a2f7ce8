//! Defines `Node` and `Leaf` for `Tree`.

use std::collections::HashMap;

use log::trace;

use crate::router::tree::regex::ConstrainedSegmentRegex;
use crate::router::tree::segment::{Pattern, Segment, SegmentType};

/// Describes how one captured value is stored as parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Capture {
    /// Stored as-is under the name.
    Named(String),

    /// Split at the last `.` of the final path segment into `path` and `ext`.
    PathExt,
}

impl Capture {
    fn for_segment(segment: &Segment) -> Option<Capture> {
        match segment.segment_type() {
            SegmentType::Static => None,
            SegmentType::Glob { split_ext: true } => Some(Capture::PathExt),
            _ => Some(Capture::Named(segment.value().to_owned())),
        }
    }

    pub(crate) fn for_pattern(pattern: &Pattern) -> Vec<Capture> {
        pattern
            .segments()
            .iter()
            .filter_map(Capture::for_segment)
            .collect()
    }
}

/// A complete, matchable route held by a `Node`.
///
/// The parameter names live here rather than on the nodes, so routes that share a position in
/// the tree can name their parameters independently.
#[derive(Clone)]
pub struct Leaf<T> {
    pattern: Pattern,
    captures: Vec<Capture>,
    payload: T,
}

impl<T> Leaf<T> {
    /// The full pattern this leaf was registered with, including every prefix it was merged
    /// under.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The value bound to the route.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Pairs the values captured on the way down with the names of this leaf. `None` means the
    /// values cannot be stored under this leaf, which only happens for a `*.*` capture without
    /// an extension.
    fn bind(&self, values: &[String]) -> Option<Vec<(String, String)>> {
        let mut params = Vec::with_capacity(values.len());

        for (capture, value) in self.captures.iter().zip(values.iter()) {
            match capture {
                Capture::Named(name) => params.push((name.clone(), value.clone())),
                Capture::PathExt => {
                    let last = value.rsplit('/').next().unwrap_or("");
                    match last.rfind('.') {
                        Some(dot) if dot > 0 && dot + 1 < last.len() => {
                            let split = value.len() - last.len() + dot;
                            params.push(("path".to_owned(), value[..split].to_owned()));
                            params.push(("ext".to_owned(), value[split + 1..].to_owned()));
                        }
                        _ => return None,
                    }
                }
            }
        }

        Some(params)
    }

    fn rebase(&mut self, prefix: &Pattern, prefix_captures: &[Capture]) {
        self.pattern = prefix.join(&self.pattern);

        let mut captures = prefix_captures.to_vec();
        captures.append(&mut self.captures);
        self.captures = captures;
    }
}

/// One level of a routing `Tree`.
///
/// A node owns its children outright: literal children keyed by segment, parameter children
/// reached by capturing the segment (one per distinct constraint, plus one unconstrained), and a
/// single glob child which consumes the remainder of the path.
#[derive(Clone)]
pub struct Node<T> {
    fixed: HashMap<String, Node<T>>,
    constrained: Vec<(ConstrainedSegmentRegex, Node<T>)>,
    dynamic: Option<Box<Node<T>>>,
    glob: Option<Box<Node<T>>>,
    leaves: Vec<Leaf<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Node::new()
    }
}

impl<T> Node<T> {
    /// Creates an empty node.
    pub fn new() -> Self {
        Node {
            fixed: HashMap::new(),
            constrained: Vec::new(),
            dynamic: None,
            glob: None,
            leaves: Vec::new(),
        }
    }

    /// Leaves attached directly to this node, in registration order.
    pub fn leaves(&self) -> &[Leaf<T>] {
        &self.leaves
    }

    /// `true` if neither this node nor any descendant holds a leaf or child.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
            && self.fixed.is_empty()
            && self.constrained.is_empty()
            && self.dynamic.is_none()
            && self.glob.is_none()
    }

    /// Returns the child reached through `segment`, creating it when absent.
    pub(crate) fn child_mut(&mut self, segment: &Segment) -> &mut Node<T> {
        match segment.segment_type() {
            SegmentType::Static => self
                .fixed
                .entry(segment.value().to_owned())
                .or_insert_with(Node::new),
            SegmentType::Constrained { regex } => {
                let pos = match self.constrained.iter().position(|(r, _)| r == regex) {
                    Some(pos) => pos,
                    None => {
                        self.constrained.push((regex.clone(), Node::new()));
                        self.constrained.len() - 1
                    }
                };
                &mut self.constrained[pos].1
            }
            SegmentType::Dynamic => &mut **self.dynamic.get_or_insert_with(Box::default),
            SegmentType::Glob { .. } => &mut **self.glob.get_or_insert_with(Box::default),
        }
    }

    /// Inserts `payload` for `pattern` below this node.
    ///
    /// Every optional segment adds a leaf at the node before it, so the route also matches with
    /// that segment and all that follow it left off.
    pub(crate) fn insert(&mut self, pattern: &Pattern, payload: T)
    where
        T: Clone,
    {
        let mut node = self;
        let mut captures = Vec::new();

        for segment in pattern.segments() {
            if segment.is_optional() {
                node.leaves.push(Leaf {
                    pattern: pattern.clone(),
                    captures: captures.clone(),
                    payload: payload.clone(),
                });
            }

            captures.extend(Capture::for_segment(segment));
            node = node.child_mut(segment);
        }

        node.leaves.push(Leaf {
            pattern: pattern.clone(),
            captures,
            payload,
        });
    }

    /// Moves every child and leaf of `other` into this node, appending leaves after the ones
    /// already present.
    pub(crate) fn absorb(&mut self, other: Node<T>) {
        let Node {
            fixed,
            constrained,
            dynamic,
            glob,
            mut leaves,
        } = other;

        for (segment, child) in fixed {
            match self.fixed.get_mut(&segment) {
                Some(existing) => existing.absorb(child),
                None => {
                    self.fixed.insert(segment, child);
                }
            }
        }

        for (regex, child) in constrained {
            match self.constrained.iter_mut().find(|(r, _)| *r == regex) {
                Some((_, existing)) => existing.absorb(child),
                None => self.constrained.push((regex, child)),
            }
        }

        if let Some(child) = dynamic {
            match self.dynamic {
                Some(ref mut existing) => existing.absorb(*child),
                None => self.dynamic = Some(child),
            }
        }

        if let Some(child) = glob {
            match self.glob {
                Some(ref mut existing) => existing.absorb(*child),
                None => self.glob = Some(child),
            }
        }

        self.leaves.append(&mut leaves);
    }

    /// Rewrites every leaf at and below this node as if it had been registered beneath `prefix`.
    pub(crate) fn rebase(&mut self, prefix: &Pattern, prefix_captures: &[Capture]) {
        for leaf in self.leaves.iter_mut() {
            leaf.rebase(prefix, prefix_captures);
        }

        for child in self.children_mut() {
            child.rebase(prefix, prefix_captures);
        }
    }

    fn children_mut(&mut self) -> impl Iterator<Item = &mut Node<T>> {
        self.fixed
            .values_mut()
            .chain(self.constrained.iter_mut().map(|(_, n)| n))
            .chain(self.dynamic.iter_mut().map(|b| &mut **b))
            .chain(self.glob.iter_mut().map(|b| &mut **b))
    }

    /// Appends every leaf at and below this node to `out`.
    pub(crate) fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf<T>>) {
        out.extend(self.leaves.iter());

        let mut fixed: Vec<_> = self.fixed.iter().collect();
        fixed.sort_by(|a, b| a.0.cmp(b.0));

        for (_, child) in fixed {
            child.collect_leaves(out);
        }
        for (_, child) in self.constrained.iter() {
            child.collect_leaves(out);
        }
        if let Some(ref child) = self.dynamic {
            child.collect_leaves(out);
        }
        if let Some(ref child) = self.glob {
            child.collect_leaves(out);
        }
    }

    /// Finds the first leaf matching `segments` which `accept` agrees to.
    ///
    /// Children are tried literal first, then constrained, then unconstrained, then the glob.
    /// When a subtree has no acceptable leaf for the rest of the path, the next kind of child at
    /// the same level is tried, so a dead end deep below a literal still falls back to a
    /// parameter or glob at any level above it.
    pub(crate) fn find<'n>(
        &'n self,
        segments: &[&str],
        captured: &mut Vec<String>,
        accept: &mut dyn FnMut(&T) -> bool,
    ) -> Option<(&'n Leaf<T>, Vec<(String, String)>)> {
        let (head, rest) = match segments.split_first() {
            Some(split) => split,
            None => return self.select(captured, accept),
        };

        if let Some(child) = self.fixed.get(*head) {
            trace!(" trying static segment `{}`", head);
            if let Some(found) = child.find(rest, captured, accept) {
                return Some(found);
            }
        }

        for (regex, child) in self.constrained.iter() {
            if regex.is_match(head) {
                trace!(" trying constrained segment `{}` for `{}`", regex.as_str(), head);
                captured.push((*head).to_owned());
                if let Some(found) = child.find(rest, captured, accept) {
                    return Some(found);
                }
                captured.pop();
            }
        }

        if let Some(ref child) = self.dynamic {
            trace!(" trying dynamic segment for `{}`", head);
            captured.push((*head).to_owned());
            if let Some(found) = child.find(rest, captured, accept) {
                return Some(found);
            }
            captured.pop();
        }

        if let Some(ref child) = self.glob {
            trace!(" trying glob for `{}`", segments.join("/"));
            captured.push(segments.join("/"));
            if let Some(found) = child.select(captured, accept) {
                return Some(found);
            }
            captured.pop();
        }

        None
    }

    fn select<'n>(
        &'n self,
        captured: &[String],
        accept: &mut dyn FnMut(&T) -> bool,
    ) -> Option<(&'n Leaf<T>, Vec<(String, String)>)> {
        for leaf in self.leaves.iter() {
            if let Some(params) = leaf.bind(captured) {
                if accept(&leaf.payload) {
                    return Some((leaf, params));
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(patterns: &[(&str, u32)]) -> Node<u32> {
        let mut root = Node::new();
        for (pattern, payload) in patterns {
            root.insert(&Pattern::parse(pattern).unwrap(), *payload);
        }
        root
    }

    fn find(root: &Node<u32>, path: &[&str]) -> Option<(u32, Vec<(String, String)>)> {
        root.find(path, &mut Vec::new(), &mut |_| true)
            .map(|(leaf, params)| (*leaf.payload(), params))
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| ((*n).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn backtracks_from_literal_dead_end() {
        let root = node_with(&[("/a/b/c", 1), ("/a/:x/d", 2)]);

        assert_eq!(find(&root, &["a", "b", "c"]), Some((1, vec![])));
        assert_eq!(find(&root, &["a", "b", "d"]), Some((2, params(&[("x", "b")]))));
    }

    #[test]
    fn backtracks_at_every_ancestor() {
        let root = node_with(&[("/a/b/c/d", 1), ("/:x/*", 2)]);

        assert_eq!(
            find(&root, &["a", "b", "c", "e"]),
            Some((2, params(&[("x", "a"), ("splat", "b/c/e")])))
        );
    }

    #[test]
    fn glob_requires_a_segment() {
        let root = node_with(&[("/static/*", 1)]);

        assert_eq!(find(&root, &["static"]), None);
        assert_eq!(
            find(&root, &["static", "css", "a.css"]),
            Some((1, params(&[("splat", "css/a.css")])))
        );
    }

    #[test]
    fn constrained_before_dynamic() {
        let root = node_with(&[("/item/:name", 1), ("/item/:id([0-9]+)", 2)]);

        assert_eq!(find(&root, &["item", "7"]), Some((2, params(&[("id", "7")]))));
        assert_eq!(
            find(&root, &["item", "seven"]),
            Some((1, params(&[("name", "seven")])))
        );
    }

    #[test]
    fn split_extension_glob() {
        let root = node_with(&[("/download/*.*", 1)]);

        assert_eq!(
            find(&root, &["download", "docs", "guide.tar.gz"]),
            Some((1, params(&[("path", "docs/guide.tar"), ("ext", "gz")])))
        );
        assert_eq!(find(&root, &["download", "README"]), None);
        assert_eq!(find(&root, &["download", "v1.0", "README"]), None);
    }

    #[test]
    fn optional_segments_add_leaves() {
        let root = node_with(&[("/page/?:id/?:format", 1)]);

        assert_eq!(find(&root, &["page"]), Some((1, vec![])));
        assert_eq!(find(&root, &["page", "3"]), Some((1, params(&[("id", "3")]))));
        assert_eq!(
            find(&root, &["page", "3", "json"]),
            Some((1, params(&[("id", "3"), ("format", "json")])))
        );
        assert_eq!(root.leaves().len(), 0);
    }

    #[test]
    fn accept_skips_leaves() {
        let root = node_with(&[("/user/:id", 1), ("/user/:name", 2), ("/*", 3)]);

        let found = root
            .find(&["user", "x"], &mut Vec::new(), &mut |p| *p != 1)
            .map(|(leaf, params)| (*leaf.payload(), params));
        assert_eq!(found, Some((2, params(&[("name", "x")]))));

        let found = root
            .find(&["user", "x"], &mut Vec::new(), &mut |p| *p == 3)
            .map(|(leaf, params)| (*leaf.payload(), params));
        assert_eq!(found, Some((3, params(&[("splat", "user/x")]))));
    }

    #[test]
    fn absorb_appends_leaves_in_order() {
        let mut left = node_with(&[("/same", 1), ("/left/:id", 2)]);
        let right = node_with(&[("/same", 3), ("/right/:id", 4)]);
        left.absorb(right);

        let mut leaves = Vec::new();
        left.collect_leaves(&mut leaves);
        let payloads: Vec<u32> = leaves.iter().map(|l| *l.payload()).collect();
        assert_eq!(payloads, vec![2, 4, 1, 3]);

        assert_eq!(find(&left, &["same"]), Some((1, vec![])));
        assert_eq!(find(&left, &["right", "9"]), Some((4, params(&[("id", "9")]))));
    }
}
