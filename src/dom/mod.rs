//! Minimal mutable document model
//!
//! Elements are shared handles: cloning an [`Element`] yields another handle
//! to the same node, so a stanza and the tree it came from observe the same
//! attributes and children. Parent links are weak and only used for
//! namespace context.

mod parse;
mod serialize;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub use parse::parse_document;

/// Namespace bound to the reserved `xml` prefix
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A child of an element
#[derive(Debug, Clone)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data
    Text(String),
}

struct ElementData {
    name: String,
    namespace: Option<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    parent: Weak<RefCell<ElementData>>,
}

/// Shared handle to one element node
#[derive(Clone)]
pub struct Element(Rc<RefCell<ElementData>>);

impl Element {
    /// Create a detached element with the given (possibly prefixed) name
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self(Rc::new(RefCell::new(ElementData {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            attrs: Vec::new(),
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    /// Name as written, including any prefix
    #[must_use]
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Name without its prefix
    #[must_use]
    pub fn local_name(&self) -> String {
        let data = self.0.borrow();
        match data.name.split_once(':') {
            Some((_, local)) => local.to_string(),
            None => data.name.clone(),
        }
    }

    /// Resolved namespace URI
    #[must_use]
    pub fn namespace(&self) -> Option<String> {
        self.0.borrow().namespace.clone()
    }

    /// Whether this element has the given namespace and local name
    #[must_use]
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace().as_deref() == Some(namespace) && self.local_name() == local_name
    }

    /// Whether both handles point at the same node
    #[must_use]
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        self.0.borrow().parent.upgrade().map(Element)
    }

    /// Get a plain attribute
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    /// Set a plain attribute, keeping its position if it already exists
    pub fn set_attr(&self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut data = self.0.borrow_mut();
        match data.attrs.iter().position(|(key, _)| key == name) {
            Some(index) => data.attrs[index].1 = value,
            None => data.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&self, name: &str) {
        self.0.borrow_mut().attrs.retain(|(key, _)| key != name);
    }

    /// All attributes in document order
    #[must_use]
    pub fn attrs(&self) -> Vec<(String, String)> {
        self.0.borrow().attrs.clone()
    }

    /// Get an attribute in the given namespace
    #[must_use]
    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<String> {
        self.attr(&self.qualify_attr(namespace, name))
    }

    pub fn set_attr_ns(&self, namespace: &str, name: &str, value: impl Into<String>) {
        let key = self.qualify_attr(namespace, name);
        self.set_attr(&key, value);
    }

    pub fn remove_attr_ns(&self, namespace: &str, name: &str) {
        let key = self.qualify_attr(namespace, name);
        self.remove_attr(&key);
    }

    fn qualify_attr(&self, namespace: &str, name: &str) -> String {
        if namespace == XML_NS {
            return format!("xml:{name}");
        }
        match self.lookup_prefix(namespace) {
            Some(prefix) => format!("{prefix}:{name}"),
            None => name.to_string(),
        }
    }

    /// Find a prefix declared for `namespace` on this element or an ancestor
    #[must_use]
    pub fn lookup_prefix(&self, namespace: &str) -> Option<String> {
        let mut current = Some(self.clone());
        while let Some(element) = current {
            let found = element.0.borrow().attrs.iter().find_map(|(key, value)| {
                key.strip_prefix("xmlns:")
                    .filter(|_| value == namespace)
                    .map(str::to_string)
            });
            if found.is_some() {
                return found;
            }
            current = element.parent();
        }
        None
    }

    /// Ordered snapshot of the child nodes
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    /// Ordered snapshot of the child elements, skipping text
    #[must_use]
    pub fn child_elements(&self) -> Vec<Element> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Element(element) => Some(element.clone()),
                Node::Text(_) => None,
            })
            .collect()
    }

    /// Append `child`, detaching it from any previous parent first
    pub fn append_child(&self, child: &Element) {
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(Node::Element(child.clone()));
    }

    pub fn append_text(&self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        let mut data = self.0.borrow_mut();
        if let Some(Node::Text(last)) = data.children.last_mut() {
            last.push_str(&text);
        } else {
            data.children.push(Node::Text(text));
        }
    }

    /// Remove `child` if it is a direct child of this element
    pub fn remove_child(&self, child: &Element) -> bool {
        let mut data = self.0.borrow_mut();
        let before = data.children.len();
        data.children
            .retain(|node| !matches!(node, Node::Element(element) if element.ptr_eq(child)));
        let removed = data.children.len() != before;
        drop(data);
        if removed {
            child.0.borrow_mut().parent = Weak::new();
        }
        removed
    }

    /// Remove this element from its parent, if any
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Concatenated direct text content
    #[must_use]
    pub fn text(&self) -> String {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text(&self, text: &str) {
        let old = std::mem::take(&mut self.0.borrow_mut().children);
        for node in old {
            if let Node::Element(element) = node {
                element.0.borrow_mut().parent = Weak::new();
            }
        }
        self.append_text(text);
    }

    /// Direct children with the given namespace and local name
    #[must_use]
    pub fn find(&self, namespace: &str, local_name: &str) -> Vec<Element> {
        self.child_elements()
            .into_iter()
            .filter(|child| child.is(namespace, local_name))
            .collect()
    }

    /// First matching direct child, created and appended when absent
    pub fn find_or_create(&self, namespace: &str, local_name: &str) -> Element {
        if let Some(existing) = self.find(namespace, local_name).into_iter().next() {
            return existing;
        }
        let created = create_element(namespace, local_name, self.namespace().as_deref());
        self.append_child(&created);
        created
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Element").field(&self.to_string()).finish()
    }
}

/// Create a detached element in `namespace`
///
/// An `xmlns` declaration is only emitted when the element will not inherit
/// the same namespace from its intended parent.
#[must_use]
pub fn create_element(namespace: &str, local_name: &str, parent_namespace: Option<&str>) -> Element {
    let element = Element::new(local_name, Some(namespace));
    if parent_namespace != Some(namespace) {
        element.set_attr("xmlns", namespace);
    }
    element
}
