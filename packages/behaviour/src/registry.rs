//! Behaviour registry
//!
//! Stores behaviour rules and applies them to DOM subtrees:
//! - Registration is idempotent per `(selector, id)`: the newest rule wins
//! - Rules are kept sorted by priority, then id, then selector
//! - Application is rule-outer, node-inner across the whole forest
//!
//! # Application order
//!
//! For each rule in order, every root is scanned and every match receives the
//! callback before the next rule starts. Behaviours rely on this: a rule that
//! tags rows must have finished on the entire forest before a later rule
//! reads those tags anywhere.
//!
//! # Re-entrancy
//!
//! All methods take `&self`. A pass works on a snapshot of the rules taken
//! when it starts, and holds no borrow while callbacks run, so a callback may
//! call [`BehaviourRegistry::specify`] (effective from the next pass) or start
//! a nested pass with [`BehaviourRegistry::apply_subtree`]. Callers that need
//! passes serialized instead use [`BehaviourRegistry::schedule`].
//!
//! # Example
//!
//! ```
//! use behaviour_engine::memory::{Document, Element};
//! use behaviour_engine::BehaviourRegistry;
//!
//! let doc = Document::new();
//! let table = Element::new("table").with_class("sortable");
//! doc.root().append_child(table.clone());
//!
//! let registry = BehaviourRegistry::new(doc);
//! registry.specify("TABLE.sortable", "sortable", 0, |e: &Element| {
//!     e.set_attr("data-sortable", "true");
//!     Ok(())
//! });
//!
//! let report = registry.apply().unwrap();
//! assert_eq!(report.total_matches(), 1);
//! assert_eq!(table.attr("data-sortable").as_deref(), Some("true"));
//! ```

use crate::config::{FailurePolicy, RegistryConfig};
use crate::dom::{Dom, Roots};
use crate::error::{BehaviourError, BehaviourResult, Result};
use crate::queue::{ApplyQueue, ApplyRequest};
use crate::report::{ApplyReport, RuleApplication};
use crate::rule::{BehaviourFn, Rule, RuleInfo, RuleKey};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Selector-to-behaviour registry bound to one host DOM.
pub struct BehaviourRegistry<D: Dom> {
    dom: D,
    config: RegistryConfig,
    /// Always sorted by application order
    rules: RefCell<Vec<Rc<Rule<D::Node>>>>,
    queue: ApplyQueue<D::Node>,
    /// Number of passes currently on the stack
    depth: Cell<usize>,
    draining: Cell<bool>,
}

impl<D: Dom> fmt::Debug for BehaviourRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviourRegistry")
            .field("config", &self.config)
            .field("rules", &self.rules.borrow().len())
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> BehaviourRegistry<D> {
    /// Create an empty registry with the default configuration.
    pub fn new(dom: D) -> Self {
        Self::with_config(dom, RegistryConfig::default())
    }

    pub fn with_config(dom: D, config: RegistryConfig) -> Self {
        Self {
            dom,
            config,
            rules: RefCell::new(Vec::new()),
            queue: ApplyQueue::new(),
            depth: Cell::new(0),
            draining: Cell::new(false),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a behaviour for elements matching `selector`.
    ///
    /// A rule with the same `(selector, id)` is replaced. Lower priorities
    /// are applied first; ties are broken by `id`, then by `selector`.
    ///
    /// Never fails: selectors are only checked when a pass matches them. An
    /// empty selector is accepted and matches nothing.
    pub fn specify<F>(
        &self,
        selector: impl Into<String>,
        id: impl Into<String>,
        priority: i64,
        behaviour: F,
    ) where
        F: Fn(&D::Node) -> BehaviourResult + 'static,
    {
        self.insert(Rule::new(selector, id, priority, Rc::new(behaviour)));
    }

    /// Register an ordered sheet of behaviours under one id.
    ///
    /// The first entry gets `first_priority`, each following entry one more.
    /// Returns the next unused priority, so sheets can be chained.
    /// Priorities saturate at `i64::MAX`: entries past it share that
    /// priority and fall back to the id and selector tie-break.
    pub fn specify_sheet<S, I>(&self, id: &str, first_priority: i64, sheet: I) -> i64
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, BehaviourFn<D::Node>)>,
    {
        let mut priority = first_priority;
        for (selector, behaviour) in sheet {
            self.insert(Rule::new(selector, id, priority, behaviour));
            priority = priority.saturating_add(1);
        }
        priority
    }

    fn insert(&self, rule: Rule<D::Node>) {
        if rule.selector().trim().is_empty() {
            tracing::debug!(id = %rule.id(), "Behaviour has an empty selector and will match nothing");
        }

        let mut rules = self.rules.borrow_mut();
        let existing = rules
            .iter()
            .position(|r| r.has_key(rule.selector(), rule.id()));
        if let Some(idx) = existing {
            tracing::debug!(id = %rule.id(), selector = %rule.selector(), priority = rule.priority(), "Replacing existing behaviour");
            rules.remove(idx);
        } else {
            tracing::debug!(id = %rule.id(), selector = %rule.selector(), priority = rule.priority(), "Adding behaviour");
        }

        rules.push(Rc::new(rule));
        rules.sort_by(|a, b| a.application_order(b));
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.borrow().is_empty()
    }

    pub fn contains(&self, selector: &str, id: &str) -> bool {
        self.rules.borrow().iter().any(|r| r.has_key(selector, id))
    }

    pub fn get(&self, selector: &str, id: &str) -> Option<RuleInfo> {
        self.rules
            .borrow()
            .iter()
            .find(|r| r.has_key(selector, id))
            .map(|r| r.info())
    }

    /// Registered rules in application order.
    pub fn rules(&self) -> Vec<RuleInfo> {
        self.rules.borrow().iter().map(|r| r.info()).collect()
    }

    /// Dedup keys in application order.
    pub fn keys(&self) -> Vec<RuleKey> {
        self.rules.borrow().iter().map(|r| r.key()).collect()
    }

    /// Apply all rules to the whole document.
    pub fn apply(&self) -> Result<ApplyReport> {
        let document = self.dom.document();
        self.apply_subtree(Roots::single(document), true)
    }

    /// Apply all rules to a subtree or forest.
    ///
    /// With `include_self`, each root is itself eligible to match; otherwise
    /// only its descendants are. Calling this again on the same nodes invokes
    /// every matching callback again.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Propagate`] the first selector or callback
    /// failure aborts the pass and is returned. Under
    /// [`FailurePolicy::Isolate`] failures are recorded in the report and
    /// this never fails.
    pub fn apply_subtree(
        &self,
        roots: impl Into<Roots<D::Node>>,
        include_self: bool,
    ) -> Result<ApplyReport> {
        let roots = roots.into().into_vec();
        self.run_pass(&roots, include_self)
    }

    /// Queue an apply pass and run the queue unless a pass is in progress.
    ///
    /// Requests made while a pass runs (typically from a callback) are
    /// deferred rather than nested. When the outermost call drains the queue,
    /// deferred requests run after the current one, in FIFO order. Requests
    /// deferred during a plain [`Self::apply_subtree`] pass wait for the next
    /// `schedule` or [`Self::flush`].
    ///
    /// Returns the reports of the passes that ran during this call. A failing
    /// pass is reported as in [`Self::flush`].
    pub fn schedule(
        &self,
        roots: impl Into<Roots<D::Node>>,
        include_self: bool,
    ) -> Result<Vec<ApplyReport>> {
        self.queue.push(ApplyRequest {
            roots: roots.into().into_vec(),
            include_self,
        });
        if self.depth.get() > 0 || self.draining.get() {
            tracing::debug!(pending = self.queue.len(), "Deferred apply request");
            return Ok(Vec::new());
        }
        self.flush()
    }

    /// Run all queued apply requests. No-op while a pass is in progress.
    ///
    /// A failing pass (under [`FailurePolicy::Propagate`]) stops the drain
    /// with [`BehaviourError::QueueStopped`], which carries the reports of
    /// the passes that completed before it. The failed request is dropped;
    /// later requests stay queued for the next `schedule` or `flush`.
    pub fn flush(&self) -> Result<Vec<ApplyReport>> {
        if self.depth.get() > 0 || self.draining.get() {
            return Ok(Vec::new());
        }
        let _draining = FlagGuard::raise(&self.draining);

        let mut reports = Vec::new();
        while let Some(request) = self.queue.pop() {
            match self.run_pass(&request.roots, request.include_self) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    tracing::warn!(
                        completed = reports.len(),
                        pending = self.queue.len(),
                        error = %err,
                        "Apply queue stopped"
                    );
                    return Err(BehaviourError::QueueStopped {
                        completed: reports,
                        source: Box::new(err),
                    });
                }
            }
        }
        Ok(reports)
    }

    /// Number of queued apply requests.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn run_pass(&self, roots: &[D::Node], include_self: bool) -> Result<ApplyReport> {
        let rules: Vec<Rc<Rule<D::Node>>> = self.rules.borrow().clone();
        let _depth = DepthGuard::enter(&self.depth);

        tracing::debug!(
            roots = roots.len(),
            rules = rules.len(),
            include_self,
            depth = self.depth.get(),
            "Applying behaviours"
        );

        let mut report = ApplyReport::new(roots.len(), include_self);
        for rule in &rules {
            let mut application = RuleApplication::for_rule(rule);
            for root in roots {
                let matched = match self.find(rule, root, include_self) {
                    Ok(matched) => matched,
                    Err(err) => {
                        self.handle_failure(err, &mut application)?;
                        continue;
                    }
                };
                application.matched += matched.len();
                for node in &matched {
                    if let Err(source) = rule.invoke(node) {
                        let err = BehaviourError::BehaviourFailed {
                            id: rule.id().to_string(),
                            selector: rule.selector().to_string(),
                            source,
                        };
                        self.handle_failure(err, &mut application)?;
                    }
                }
            }

            if application.matched > 0 {
                tracing::trace!(
                    id = %rule.id(),
                    selector = %rule.selector(),
                    priority = rule.priority(),
                    matched = application.matched,
                    "Applied behaviour"
                );
            }
            report.rules.push(application);
        }

        Ok(report)
    }

    fn find(
        &self,
        rule: &Rule<D::Node>,
        root: &D::Node,
        include_self: bool,
    ) -> Result<Vec<D::Node>> {
        if rule.selector().trim().is_empty() {
            return Ok(Vec::new());
        }
        self.dom.find(root, rule.selector(), include_self)
    }

    fn handle_failure(
        &self,
        err: BehaviourError,
        application: &mut RuleApplication,
    ) -> Result<()> {
        match self.config.failure_policy {
            FailurePolicy::Propagate => Err(err),
            FailurePolicy::Isolate => {
                tracing::warn!(
                    id = %application.id,
                    selector = %application.selector,
                    error = %err,
                    "Behaviour failed, continuing pass"
                );
                application.failures.push(err.to_string());
                Ok(())
            }
        }
    }
}

/// Keeps the pass depth counter correct even when a callback panics.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

struct FlagGuard<'a>(&'a Cell<bool>);

impl<'a> FlagGuard<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
