//! Behaviour Engine
//!
//! Unobtrusive behaviour binding for server-rendered pages. Interactive
//! behaviour is attached to elements selected by CSS selectors, after page
//! load and again after every partial re-render. This library provides:
//! - A registry of `(selector, id, priority, callback)` rules with
//!   idempotent registration and a deterministic application order
//! - Rule-outer, node-inner application to a subtree or forest
//! - A [`Dom`] capability trait so the registry runs against any host tree,
//!   including the in-memory tree in [`memory`] and (feature `wasm`) the
//!   browser DOM
//!
//! # Example
//!
//! ```
//! use behaviour_engine::memory::{Document, Element};
//! use behaviour_engine::BehaviourRegistry;
//!
//! let doc = Document::new();
//! let row = Element::new("tr").with_class("build-row");
//! doc.root().append_child(row.clone());
//!
//! let registry = BehaviourRegistry::new(doc);
//! registry.specify("TR.build-row", "rows", 0, |e: &Element| {
//!     e.set_attr("data-bound", "true");
//!     Ok(())
//! });
//!
//! // After page load, and after every DOM update on the updated nodes:
//! registry.apply().unwrap();
//! registry.apply_subtree(vec![row.clone()], true).unwrap();
//! assert_eq!(row.attr("data-bound").as_deref(), Some("true"));
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod memory;
pub mod queue;
pub mod registry;
pub mod report;
pub mod rule;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used items
pub use config::{FailurePolicy, RegistryConfig, DEFAULT_PRIORITY};
pub use dom::{Dom, Roots};
pub use error::{BehaviourError, BehaviourResult, BoxError, Result};
pub use registry::BehaviourRegistry;
pub use report::{ApplyReport, RuleApplication};
pub use rule::{behaviour, BehaviourFn, Rule, RuleInfo, RuleKey};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
