//! Host DOM capability
//!
//! The registry never parses selectors or walks elements itself. Everything
//! it needs from the host environment goes through the [`Dom`] trait:
//! - `select`: elements under a scope that match a selector, in document order
//! - `matches`: whether one element matches a selector
//! - `parent`: the parent element, used for include-self lookups
//!
//! Implementations exist for an in-memory tree ([`crate::memory`]) and, with
//! the `wasm` feature, for the browser DOM.

use crate::error::Result;

/// Selector-matching delegate over a host element tree.
pub trait Dom {
    /// Handle to an element. Equality must be identity, not structure.
    type Node: Clone + PartialEq;

    /// The node `apply()` starts from.
    fn document(&self) -> Self::Node;

    /// Parent of `node`, or `None` at the top of the tree.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Descendants of `scope` (excluding `scope`) matching `selector`, in
    /// document order.
    fn select(&self, scope: &Self::Node, selector: &str) -> Result<Vec<Self::Node>>;

    /// Whether `node` itself matches `selector`.
    fn matches(&self, node: &Self::Node, selector: &str) -> Result<bool>;

    /// Whether `node` is `root` or lies below it.
    fn is_self_or_descendant(&self, root: &Self::Node, node: &Self::Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if &n == root {
                return true;
            }
            current = self.parent(&n);
        }
        false
    }

    /// Elements matching `selector` under `start`.
    ///
    /// With `include_self`, `start` itself is a candidate too. The lookup then
    /// runs against the parent of `start` and keeps only `start` and its
    /// descendants, so selectors that depend on the context above `start`
    /// still match. A parentless `start` is tested directly.
    fn find(
        &self,
        start: &Self::Node,
        selector: &str,
        include_self: bool,
    ) -> Result<Vec<Self::Node>> {
        if !include_self {
            return self.select(start, selector);
        }

        match self.parent(start) {
            Some(parent) => Ok(self
                .select(&parent, selector)?
                .into_iter()
                .filter(|n| self.is_self_or_descendant(start, n))
                .collect()),
            None => {
                let mut found = Vec::new();
                if self.matches(start, selector)? {
                    found.push(start.clone());
                }
                found.extend(self.select(start, selector)?);
                Ok(found)
            }
        }
    }
}

/// The nodes an apply pass starts from: one subtree or an ordered forest.
#[derive(Debug, Clone, PartialEq)]
pub enum Roots<N> {
    Single(N),
    Forest(Vec<N>),
}

impl<N> Roots<N> {
    pub fn single(node: N) -> Self {
        Self::Single(node)
    }

    pub fn forest(nodes: Vec<N>) -> Self {
        Self::Forest(nodes)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Forest(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<N> {
        match self {
            Self::Single(node) => vec![node],
            Self::Forest(nodes) => nodes,
        }
    }
}

impl<N> From<Vec<N>> for Roots<N> {
    fn from(nodes: Vec<N>) -> Self {
        Self::Forest(nodes)
    }
}

impl<N: Clone> From<&[N]> for Roots<N> {
    fn from(nodes: &[N]) -> Self {
        Self::Forest(nodes.to_vec())
    }
}

impl<N: Clone> From<&N> for Roots<N> {
    fn from(node: &N) -> Self {
        Self::Single(node.clone())
    }
}
