//! Behaviour rules and their ordering
//!
//! A [`Rule`] binds a callback to a CSS selector. Rules are identified by
//! their [`RuleKey`] (`selector` + `id`) and applied in a total order:
//! ascending `priority`, then ascending `id`, then ascending `selector`.

use crate::error::BehaviourResult;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Callback invoked once per matched element per apply pass.
pub type BehaviourFn<N> = Rc<dyn Fn(&N) -> BehaviourResult>;

/// Wrap a closure as a [`BehaviourFn`]. Useful when building a sheet of
/// differently-typed closures.
pub fn behaviour<N, F>(f: F) -> BehaviourFn<N>
where
    F: Fn(&N) -> BehaviourResult + 'static,
{
    Rc::new(f)
}

/// Dedup key of a rule. Two registrations with the same key are the same
/// logical rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleKey {
    pub selector: String,
    pub id: String,
}

/// A registered behaviour.
pub struct Rule<N> {
    selector: String,
    id: String,
    priority: i64,
    behaviour: BehaviourFn<N>,
}

impl<N> Rule<N> {
    pub fn new(
        selector: impl Into<String>,
        id: impl Into<String>,
        priority: i64,
        behaviour: BehaviourFn<N>,
    ) -> Self {
        Self {
            selector: selector.into(),
            id: id.into(),
            priority,
            behaviour,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Whether this rule has the given dedup key.
    pub fn has_key(&self, selector: &str, id: &str) -> bool {
        self.selector == selector && self.id == id
    }

    pub fn key(&self) -> RuleKey {
        RuleKey {
            selector: self.selector.clone(),
            id: self.id.clone(),
        }
    }

    /// Run the behaviour on one element.
    pub fn invoke(&self, node: &N) -> BehaviourResult {
        (self.behaviour)(node)
    }

    /// Compare two rules by application order.
    pub fn application_order(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.selector.cmp(&other.selector))
    }

    /// Callback-free description of this rule.
    pub fn info(&self) -> RuleInfo {
        RuleInfo {
            selector: self.selector.clone(),
            id: self.id.clone(),
            priority: self.priority,
        }
    }
}

impl<N> fmt::Debug for Rule<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("selector", &self.selector)
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Serializable view of a registered rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
    pub selector: String,
    pub id: String,
    pub priority: i64,
}
