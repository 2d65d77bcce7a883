//! Apply pass reports
//!
//! Every apply pass returns an [`ApplyReport`] describing what happened:
//! - which rules ran, in which order
//! - how many elements each rule matched (and therefore how many callbacks ran)
//! - which selector or callback failures were isolated
//!
//! Reports serialize to JSON for the wasm binding and render as a text tree
//! for logs and debugging:
//!
//! ```text
//! apply_subtree (2 roots)
//! +-- hudson-behavior:TABLE.sortable @20 = 1 match
//! `-- tooltip:[tooltip] @30 = 2 matches, 1 failure
//!     `-- Behaviour 'tooltip' failed on '[tooltip]': missing text
//! ```

use crate::rule::Rule;
use serde::Serialize;

/// What one rule did during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleApplication {
    pub id: String,
    pub selector: String,
    pub priority: i64,
    /// Elements matched across all roots; each received one callback
    pub matched: usize,
    /// Isolated failures, as display strings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl RuleApplication {
    pub fn for_rule<N>(rule: &Rule<N>) -> Self {
        Self {
            id: rule.id().to_string(),
            selector: rule.selector().to_string(),
            priority: rule.priority(),
            matched: 0,
            failures: Vec::new(),
        }
    }

    fn render_line(&self, prefix: &str) -> String {
        let mut line = format!(
            "{}{}:{} @{} = {} {}",
            prefix,
            self.id,
            self.selector,
            self.priority,
            self.matched,
            if self.matched == 1 { "match" } else { "matches" }
        );
        if !self.failures.is_empty() {
            line.push_str(&format!(
                ", {} {}",
                self.failures.len(),
                if self.failures.len() == 1 {
                    "failure"
                } else {
                    "failures"
                }
            ));
        }
        line
    }
}

/// Result of one apply pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Number of roots the pass started from
    pub roots: usize,
    pub include_self: bool,
    /// One entry per rule, in application order
    pub rules: Vec<RuleApplication>,
}

impl ApplyReport {
    pub fn new(roots: usize, include_self: bool) -> Self {
        Self {
            roots,
            include_self,
            rules: Vec::new(),
        }
    }

    /// Total callback invocations in this pass.
    pub fn total_matches(&self) -> usize {
        self.rules.iter().map(|r| r.matched).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.rules.iter().map(|r| r.failures.len()).sum()
    }

    /// Whether the pass finished without isolated failures.
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    /// Look up the entry of a rule by its dedup key.
    pub fn rule(&self, selector: &str, id: &str) -> Option<&RuleApplication> {
        self.rules
            .iter()
            .find(|r| r.selector == selector && r.id == id)
    }

    /// Serialize the report as JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render the report as a text tree. Rules that matched nothing are
    /// left out.
    pub fn render(&self) -> String {
        let mut lines = vec![format!(
            "apply_subtree ({} {}{})",
            self.roots,
            if self.roots == 1 { "root" } else { "roots" },
            if self.include_self { ", include self" } else { "" }
        )];

        let active: Vec<&RuleApplication> = self
            .rules
            .iter()
            .filter(|r| r.matched > 0 || !r.failures.is_empty())
            .collect();
        let count = active.len();
        for (i, rule) in active.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let (prefix, child_indent) = if is_last {
                ("`-- ", "    ")
            } else {
                ("+-- ", "|   ")
            };
            lines.push(rule.render_line(prefix));

            let failure_count = rule.failures.len();
            for (j, failure) in rule.failures.iter().enumerate() {
                let failure_prefix = if j + 1 == failure_count {
                    "`-- "
                } else {
                    "+-- "
                };
                lines.push(format!("{}{}{}", child_indent, failure_prefix, failure));
            }
        }

        lines.join("\n")
    }
}
