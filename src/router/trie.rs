//! Per-method prefix tree keyed by path segments.
//!
//! Every edge is one path segment. A segment that starts with `:` matches any
//! single request segment and one that starts with `*` swallows the rest of
//! the path. Children keep their insertion order, and both insertion and
//! search resolve ambiguity by taking the first compatible child:
//!
//! - on insert, the first child whose segment is equal to the new one *or*
//!   which is a wildcard is reused, so a wildcard absorbs later literals at
//!   the same depth;
//! - on search, every compatible child is tried depth-first in order and the
//!   first terminal node wins.

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    /// Full pattern of the route ending here. `None` on intermediate nodes.
    pub(crate) pattern: Option<String>,
    /// Literal text or a `:name` / `*name` token.
    pub(crate) segment: String,
    pub(crate) children: Vec<Node>,
    pub(crate) is_wild: bool,
}

/// A literal segment that would be routed into an existing wildcard child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Absorption {
    pub(crate) existing: String,
    pub(crate) segment: String,
}

pub(crate) fn is_wild_segment(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('*')
}

impl Node {
    fn new(segment: &str) -> Self {
        Node {
            pattern: None,
            segment: segment.to_string(),
            children: Vec::new(),
            is_wild: is_wild_segment(segment),
        }
    }

    // First child usable for insertion.
    fn match_child(&mut self, segment: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|child| child.segment == segment || child.is_wild)
    }

    // Every child usable for search, in insertion order.
    fn match_children(&self, segment: &str) -> Vec<&Node> {
        self.children
            .iter()
            .filter(|child| child.segment == segment || child.is_wild)
            .collect()
    }

    pub(crate) fn insert(&mut self, pattern: &str, parts: &[&str], depth: usize) {
        if depth == parts.len() {
            self.pattern = Some(pattern.to_string());
            return;
        }

        let part = parts[depth];
        if self.match_child(part).is_none() {
            self.children.push(Node::new(part));
        }
        if let Some(child) = self.match_child(part) {
            child.insert(pattern, parts, depth + 1);
        }
    }

    pub(crate) fn search(&self, parts: &[&str], depth: usize) -> Option<&Node> {
        if depth == parts.len() || self.segment.starts_with('*') {
            return self.pattern.as_ref().map(|_| self);
        }

        let part = parts[depth];
        self.match_children(part)
            .into_iter()
            .find_map(|child| child.search(parts, depth + 1))
    }

    /// Walks the path `insert` would take and reports the first depth where
    /// the reused child is a wildcard with a different segment.
    pub(crate) fn find_absorption(&self, parts: &[&str]) -> Option<Absorption> {
        let mut node = self;
        for part in parts {
            let child = node
                .children
                .iter()
                .find(|child| child.segment == *part || child.is_wild)?;
            if child.segment != *part {
                return Some(Absorption {
                    existing: child.segment.clone(),
                    segment: part.to_string(),
                });
            }
            node = child;
        }
        None
    }

    /// Collects every registered pattern below this node, depth-first.
    pub(crate) fn patterns(&self, out: &mut Vec<String>) {
        if let Some(pattern) = &self.pattern {
            out.push(pattern.clone());
        }
        for child in &self.children {
            child.patterns(out);
        }
    }
}
