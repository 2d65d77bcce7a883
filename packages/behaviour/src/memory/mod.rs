//! In-memory element tree
//!
//! A small, reference-counted element tree implementing [`Dom`]. It exists so
//! the registry can be exercised (and used headless) without a browser.
//!
//! Elements are cheap handles: cloning an [`Element`] clones the handle, not
//! the element, and equality is identity. Attributes are mutable through a
//! shared handle, which is what behaviour callbacks need.
//!
//! Selector support is a deliberately small subset, see [`selector`].
//!
//! # Example
//!
//! ```
//! use behaviour_engine::memory::{Document, Element};
//!
//! let doc = Document::new();
//! let row = Element::new("tr").with_class("build-row");
//! doc.root().append_child(Element::new("table").with_child(row.clone()));
//!
//! assert_eq!(doc.root().descendants().len(), 2);
//! assert!(row.has_class("build-row"));
//! ```

pub mod selector;

use crate::dom::Dom;
use crate::error::Result;
use selector::Selector;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Tag name of the document node.
pub const DOCUMENT_TAG: &str = "#document";

struct ElementData {
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    parent: RefCell<Weak<ElementData>>,
    children: RefCell<Vec<Element>>,
}

/// Shared handle to an element.
#[derive(Clone)]
pub struct Element(Rc<ElementData>);

impl Element {
    /// Create a detached element. Tag names are case-insensitive and stored
    /// lowercase.
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: RefCell::new(BTreeMap::new()),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        }))
    }

    pub fn with_id(self, id: &str) -> Self {
        self.set_attr("id", id);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(self, child: Element) -> Self {
        self.append_child(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    /// Whether this is the document node rather than an element.
    pub fn is_document(&self) -> bool {
        self.0.tag == DOCUMENT_TAG
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).cloned()
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.0.attributes.borrow().contains_key(name)
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        self.0
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow_mut().remove(name)
    }

    pub fn id(&self) -> Option<String> {
        self.attr("id")
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0
            .attributes
            .borrow()
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|entry| entry == class))
    }

    pub fn add_class(&self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes = self.classes();
        classes.push(class.to_string());
        self.set_attr("class", &classes.join(" "));
    }

    pub fn parent(&self) -> Option<Element> {
        self.0.parent.borrow().upgrade().map(Element)
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.children.borrow().clone()
    }

    /// Whether `other` is this element or lies below it.
    pub fn contains(&self, other: &Element) -> bool {
        let mut current = Some(other.clone());
        while let Some(el) = current {
            if &el == self {
                return true;
            }
            current = el.parent();
        }
        false
    }

    /// Appending an element into its own subtree would make the tree cyclic.
    fn accepts_child(&self, child: &Element) -> bool {
        if child.contains(self) {
            tracing::debug!(parent = ?self, child = ?child, "Ignoring insert of an ancestor into its own subtree");
            return false;
        }
        true
    }

    /// Append `child` as the last child, detaching it from its previous
    /// parent first. Appending an element into its own subtree is ignored.
    pub fn append_child(&self, child: Element) {
        if !self.accepts_child(&child) {
            return;
        }
        child.detach();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child);
    }

    /// Insert `child` right before `reference`, which must be a child of
    /// this element. Falls back to appending otherwise. Like
    /// [`Self::append_child`], inserting an ancestor is ignored.
    pub fn insert_before(&self, child: Element, reference: &Element) {
        if !self.accepts_child(&child) {
            return;
        }
        child.detach();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        let mut children = self.0.children.borrow_mut();
        match children.iter().position(|c| c == reference) {
            Some(idx) => children.insert(idx, child),
            None => children.push(child),
        }
    }

    /// Remove this element from its parent. No-op when detached.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.0.children.borrow_mut().retain(|c| c != self);
        }
        *self.0.parent.borrow_mut() = Weak::new();
    }

    /// All descendants in document order, excluding this element.
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        let mut stack: Vec<Element> = self.children().into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            stack.extend(el.children().into_iter().rev());
            out.push(el);
        }
        out
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.0.tag)?;
        for (name, value) in self.0.attributes.borrow().iter() {
            write!(f, " {}=\"{}\"", name, value)?;
        }
        write!(f, ">")
    }
}

/// An in-memory document: a tree rooted at a document node.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            root: Element::new(DOCUMENT_TAG),
        }
    }

    /// The document node. It never matches a selector itself.
    pub fn root(&self) -> Element {
        self.root.clone()
    }

    /// Elements in the whole document matching `selector`.
    pub fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.select(&self.root, selector)
    }
}

impl Dom for Document {
    type Node = Element;

    fn document(&self) -> Element {
        self.root()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent()
    }

    fn select(&self, scope: &Element, selector: &str) -> Result<Vec<Element>> {
        let selector = Selector::parse(selector)?;
        Ok(scope
            .descendants()
            .into_iter()
            .filter(|el| selector.matches(el))
            .collect())
    }

    fn matches(&self, node: &Element, selector: &str) -> Result<bool> {
        Ok(Selector::parse(selector)?.matches(node))
    }
}
