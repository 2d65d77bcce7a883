//! WASM bindings for the behaviour engine
//!
//! This module binds the registry to the browser DOM. It is feature-gated
//! behind the `wasm` feature flag.
//!
//! # Key Constraints
//!
//! - **Selector matching is the browser's**: `querySelectorAll` and
//!   `Element.matches` do all matching; syntax errors surface as
//!   [`BehaviourError::InvalidSelector`] at apply time
//! - **Reports cross the boundary as plain objects** via `serde-wasm-bindgen`
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { WasmBehaviourRegistry } from 'behaviour-engine';
//!
//! await init();
//! const behaviour = new WasmBehaviourRegistry();
//!
//! behaviour.specify('TABLE.sortable', 'sortable', 0, (e) => {
//!     e.sortable = new Sortable(e);
//! });
//!
//! window.addEventListener('load', () => behaviour.apply());
//!
//! // After an AJAX update:
//! behaviour.applySubtree(newRows, true);
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::config::{priority_from_f64, FailurePolicy, RegistryConfig};
use crate::dom::{Dom, Roots};
use crate::error::{BehaviourError, BoxError, Result};
use crate::registry::BehaviourRegistry;

/// Helper to create consistent error JsValues
fn wasm_error(msg: &str) -> JsValue {
    JsValue::from_str(msg)
}

fn to_js_error(err: BehaviourError) -> JsValue {
    wasm_error(&err.to_string())
}

/// Best-effort message of a thrown JS value.
fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn to_js_value<T: Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| wasm_error(&format!("Failed to serialize result: {}", e)))
}

/// [`Dom`] over the live browser document.
#[derive(Debug, Clone)]
pub struct WebDom {
    root: Element,
}

impl WebDom {
    /// Bind to `window.document`.
    pub fn from_window() -> Result<Self> {
        let root = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
            .ok_or_else(|| BehaviourError::Dom("no document element available".to_string()))?;
        Ok(Self { root })
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn document(&self) -> Element {
        self.root.clone()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn select(&self, scope: &Element, selector: &str) -> Result<Vec<Element>> {
        let list = scope
            .query_selector_all(selector)
            .map_err(|e| BehaviourError::invalid_selector(selector, js_message(&e)))?;
        Ok((0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn matches(&self, node: &Element, selector: &str) -> Result<bool> {
        node.matches(selector)
            .map_err(|e| BehaviourError::invalid_selector(selector, js_message(&e)))
    }

    fn is_self_or_descendant(&self, root: &Element, node: &Element) -> bool {
        let node: &web_sys::Node = node;
        root.contains(Some(node))
    }
}

/// What `applySubtree` was called with.
#[derive(Debug, Clone, PartialEq)]
enum HostRoots<N> {
    Forest(Vec<N>),
    Element(N),
    /// A document, given as its root element
    Document(N),
}

impl<N> HostRoots<N> {
    /// Resolve the roots and the effective include-self flag. A document
    /// always includes its root element, so `<html>` can match just as with
    /// `document.querySelectorAll`.
    fn resolve(self, include_self: Option<bool>) -> (Roots<N>, bool) {
        let include_self = include_self.unwrap_or(false);
        match self {
            Self::Forest(nodes) => (Roots::forest(nodes), include_self),
            Self::Element(node) => (Roots::single(node), include_self),
            Self::Document(root) => (Roots::single(root), true),
        }
    }
}

/// Convert an `Element`, a `Document` or an array of elements to roots.
fn roots_from_js(
    value: JsValue,
    include_self: Option<bool>,
) -> std::result::Result<(Roots<Element>, bool), JsValue> {
    let roots = if js_sys::Array::is_array(&value) {
        let nodes = js_sys::Array::from(&value)
            .iter()
            .map(|item| {
                item.dyn_into::<Element>()
                    .map_err(|_| wasm_error("applySubtree expects an array of Elements"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        HostRoots::Forest(nodes)
    } else if let Some(document) = value.dyn_ref::<web_sys::Document>() {
        let root = document
            .document_element()
            .ok_or_else(|| wasm_error("document has no document element"))?;
        HostRoots::Document(root)
    } else {
        let element = value
            .dyn_into::<Element>()
            .map_err(|_| wasm_error("applySubtree expects an Element or an array of Elements"))?;
        HostRoots::Element(element)
    };
    Ok(roots.resolve(include_self))
}

/// WASM-facing behaviour registry bound to `window.document`.
#[wasm_bindgen]
pub struct WasmBehaviourRegistry {
    inner: BehaviourRegistry<WebDom>,
}

#[wasm_bindgen]
impl WasmBehaviourRegistry {
    /// Create a registry.
    ///
    /// # Arguments
    /// * `failure_policy` - `"isolate"` (default) or `"propagate"`
    #[wasm_bindgen(constructor)]
    pub fn new(failure_policy: Option<String>) -> std::result::Result<WasmBehaviourRegistry, JsValue> {
        let failure_policy = match failure_policy.as_deref() {
            None | Some("isolate") => FailurePolicy::Isolate,
            Some("propagate") => FailurePolicy::Propagate,
            Some(other) => {
                return Err(wasm_error(&format!("Unknown failure policy '{}'", other)));
            }
        };
        let dom = WebDom::from_window().map_err(to_js_error)?;
        let config = RegistryConfig::default().with_failure_policy(failure_policy);
        Ok(Self {
            inner: BehaviourRegistry::with_config(dom, config),
        })
    }

    /// Register `behaviour` for elements matching `selector`.
    ///
    /// `priority` must be an integer within `Number.MAX_SAFE_INTEGER`;
    /// fractional or out-of-range numbers are rejected instead of rounded.
    ///
    /// # Example (JavaScript)
    /// ```javascript
    /// behaviour.specify('#someid u', 'myrules.blah', 0, (e) => {
    ///     e.onmouseover = () => { e.innerHTML = 'BLAH!'; };
    /// });
    /// ```
    pub fn specify(
        &self,
        selector: &str,
        id: &str,
        priority: f64,
        behaviour: js_sys::Function,
    ) -> std::result::Result<(), JsValue> {
        let priority = priority_from_f64(priority).map_err(to_js_error)?;
        self.inner
            .specify(selector, id, priority, move |el: &Element| {
                let arg: &JsValue = el.as_ref();
                behaviour
                    .call1(&JsValue::NULL, arg)
                    .map(|_| ())
                    .map_err(|e| -> BoxError { js_message(&e).into() })
            });
        Ok(())
    }

    /// Apply all behaviours to an element, a document or an array of elements.
    ///
    /// # Returns
    /// * `Ok(JsValue)` - The pass report (`roots`, `include_self`, `rules`)
    /// * `Err(JsValue)` - The first failure, under the `propagate` policy
    #[wasm_bindgen(js_name = applySubtree)]
    pub fn apply_subtree(
        &self,
        roots: JsValue,
        include_self: Option<bool>,
    ) -> std::result::Result<JsValue, JsValue> {
        let (roots, include_self) = roots_from_js(roots, include_self)?;
        let report = self
            .inner
            .apply_subtree(roots, include_self)
            .map_err(to_js_error)?;
        to_js_value(&report)
    }

    /// Apply all behaviours to the whole document.
    pub fn apply(&self) -> std::result::Result<JsValue, JsValue> {
        let report = self.inner.apply().map_err(to_js_error)?;
        to_js_value(&report)
    }

    /// Queue an apply pass; passes requested from inside a behaviour run
    /// after the current one instead of nesting.
    pub fn schedule(
        &self,
        roots: JsValue,
        include_self: Option<bool>,
    ) -> std::result::Result<JsValue, JsValue> {
        let (roots, include_self) = roots_from_js(roots, include_self)?;
        let reports = self
            .inner
            .schedule(roots, include_self)
            .map_err(to_js_error)?;
        to_js_value(&reports)
    }

    /// Registered rules in application order.
    pub fn rules(&self) -> std::result::Result<JsValue, JsValue> {
        to_js_value(&self.inner.rules())
    }

    /// Get the number of registered rules.
    #[wasm_bindgen(js_name = ruleCount)]
    pub fn rule_count(&self) -> usize {
        self.inner.len()
    }

    /// Get the engine version.
    pub fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}
