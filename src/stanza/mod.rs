//! Stanza instances
//!
//! A [`Stanza`] is a typed view over one element. It stores no field
//! values itself: every read and write goes through the schema's field
//! descriptors to the shared element, so two stanzas wrapping the same
//! node always agree.

mod json;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::trace;
use serde_json::{Map, Value};

use crate::dom::Element;
use crate::registry::Registry;
use crate::schema::{FieldValue, ParentContext, SchemaClass, format_timestamp};

struct StanzaInner {
    class: SchemaClass,
    xml: Element,
    extensions: RefCell<IndexMap<String, Stanza>>,
    parent: RefCell<Weak<StanzaInner>>,
}

/// An instance of a registered schema bound to an element
///
/// Cloning yields another handle to the same instance, including its cache
/// of nested extensions.
#[derive(Clone)]
pub struct Stanza(Rc<StanzaInner>);

impl Stanza {
    pub(crate) fn from_parts(class: SchemaClass, xml: Element) -> Self {
        Self(Rc::new(StanzaInner {
            class,
            xml,
            extensions: RefCell::new(IndexMap::new()),
            parent: RefCell::new(Weak::new()),
        }))
    }

    /// The schema this instance was built from
    #[must_use]
    pub fn class(&self) -> &SchemaClass {
        &self.0.class
    }

    /// The backing element
    #[must_use]
    pub fn xml(&self) -> &Element {
        &self.0.xml
    }

    #[must_use]
    pub fn registry(&self) -> Option<Registry> {
        self.0.class.registry()
    }

    /// The stanza this one was created or discovered under
    #[must_use]
    pub fn parent(&self) -> Option<Stanza> {
        self.0.parent.borrow().upgrade().map(Stanza)
    }

    pub(crate) fn set_parent(&self, parent: &Stanza) {
        *self.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
    }

    /// Read a field; `None` when the schema has no such field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        let descriptor = self.0.class.field(name)?;
        Some(descriptor.get(self))
    }

    /// Read a field as plain data; unknown fields read as `null`
    #[must_use]
    pub fn value(&self, name: &str) -> Value {
        self.get(name).map_or(Value::Null, |value| value.to_json())
    }

    /// Write a field
    ///
    /// Returns `false` when the schema has no such field or the field is
    /// read-only.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        match self.0.class.field(name) {
            Some(descriptor) => descriptor.set(self, &value),
            None => {
                trace!("Ignoring write to unknown field '{}' of {}", name, self.0.class.qname());
                false
            }
        }
    }

    /// Write a timestamp field
    pub fn set_date(&self, name: &str, date: DateTime<Utc>) -> bool {
        self.set(name, format_timestamp(&date))
    }

    /// Write a binary field
    pub fn set_bytes(&self, name: &str, bytes: &[u8]) -> bool {
        self.set(name, Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()))
    }

    /// Read a single nested stanza field
    #[must_use]
    pub fn child(&self, name: &str) -> Option<Stanza> {
        self.get(name).and_then(FieldValue::into_stanza)
    }

    /// Read a repeated nested stanza field
    #[must_use]
    pub fn children(&self, name: &str) -> Vec<Stanza> {
        self.get(name).map(FieldValue::into_stanzas).unwrap_or_default()
    }

    /// Apply an object of field values through the field setters
    ///
    /// Keys without a matching settable field are skipped, as is any
    /// non-object input.
    pub fn assign(&self, data: &Value) {
        let Value::Object(entries) = data else {
            return;
        };
        for (name, value) in entries {
            match self.0.class.field(name) {
                Some(descriptor) if descriptor.has_setter() => {
                    descriptor.set(self, value);
                }
                _ => trace!("Skipping '{}' while assigning to {}", name, self.0.class.qname()),
            }
        }
    }

    /// A cached nested stanza, without creating anything
    #[must_use]
    pub fn cached_extension(&self, name: &str) -> Option<Stanza> {
        self.0.extensions.borrow().get(name).cloned()
    }

    /// All cached nested stanzas in the order they were cached
    #[must_use]
    pub fn cached_extensions(&self) -> Vec<(String, Stanza)> {
        self.0
            .extensions
            .borrow()
            .iter()
            .map(|(name, stanza)| (name.clone(), stanza.clone()))
            .collect()
    }

    pub(crate) fn cache_extension(&self, name: &str, extension: Stanza) {
        self.0.extensions.borrow_mut().insert(name.to_string(), extension);
    }

    /// The `child` extension of this stanza, wrapped or created on first use
    pub(crate) fn extension_for(&self, child: &SchemaClass) -> Stanza {
        if let Some(cached) = self.cached_extension(child.name()) {
            return cached;
        }

        let context = Some(ParentContext::Stanza(self));
        let extension = match self.xml().find(child.namespace(), child.element()).into_iter().next() {
            Some(existing) => child.construct(None, Some(existing), context),
            None => {
                let created = child.construct(Some(&Value::Object(Map::new())), None, context);
                self.xml().append_child(created.xml());
                created
            }
        };
        self.cache_extension(child.name(), extension.clone());
        extension
    }

    /// Whether both handles refer to the same instance
    #[must_use]
    pub fn ptr_eq(&self, other: &Stanza) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.xml)
    }
}

impl fmt::Debug for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stanza")
            .field("class", &self.0.class.name())
            .field("xml", &self.0.xml.to_string())
            .finish()
    }
}
