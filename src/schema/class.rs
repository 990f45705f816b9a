//! Registered schemas and stanza construction.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use log::trace;
use parking_lot::RwLock;
use serde_json::Value;
use smallvec::SmallVec;

use super::definition::{InitHook, Schema};
use super::field_def::FieldDescriptor;
use super::qname::QName;
use crate::dom::{Element, create_element};
use crate::registry::{Registry, RegistryInner};
use crate::stanza::Stanza;

/// What a new stanza is being created under
///
/// Used to decide whether the new element needs its own `xmlns`
/// declaration, and to link the new stanza back to a parent stanza.
#[derive(Clone, Copy)]
pub enum ParentContext<'a> {
    /// A parent stanza; the new stanza gets a back-reference to it
    Stanza(&'a Stanza),
    /// A plain element the new one will be appended to
    Node(&'a Element),
    /// Only the namespace the new element will be placed under
    Namespace(&'a str),
}

impl ParentContext<'_> {
    fn namespace(&self) -> Option<String> {
        match self {
            ParentContext::Stanza(stanza) => stanza.xml().namespace(),
            ParentContext::Node(node) => node.namespace(),
            ParentContext::Namespace(namespace) => Some((*namespace).to_string()),
        }
    }
}

pub(crate) struct SchemaDef {
    name: String,
    qname: QName,
    top_level: bool,
    event_name: Option<String>,
    tags: SmallVec<[String; 2]>,
    prefixes: Vec<(String, String)>,
    fields: RwLock<IndexMap<String, FieldDescriptor>>,
    init: Option<InitHook>,
    registry: Weak<RegistryInner>,
}

/// A schema owned by a registry
///
/// Cheap to clone; clones share the same field table, so a field added
/// through one handle (for example by `Registry::extend`) is visible to
/// every instance built from any of them.
#[derive(Clone)]
pub struct SchemaClass(Arc<SchemaDef>);

impl SchemaClass {
    pub(crate) fn from_schema(schema: Schema, registry: Weak<RegistryInner>) -> Self {
        let element = schema.element.unwrap_or_else(|| schema.name.clone());
        Self(Arc::new(SchemaDef {
            qname: QName::new(schema.namespace, element),
            name: schema.name,
            top_level: schema.top_level,
            event_name: schema.event_name,
            tags: schema.tags,
            prefixes: schema.prefixes,
            fields: RwLock::new(schema.fields),
            init: schema.init,
            registry,
        }))
    }

    /// Field name under which parents refer to this schema
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.0.qname.namespace()
    }

    #[must_use]
    pub fn element(&self) -> &str {
        self.0.qname.element()
    }

    #[must_use]
    pub fn qname(&self) -> &QName {
        &self.0.qname
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.0.tags
    }

    #[must_use]
    pub fn prefixes(&self) -> &[(String, String)] {
        &self.0.prefixes
    }

    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.0.top_level
    }

    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        self.0.event_name.as_deref()
    }

    /// Look up a field descriptor
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldDescriptor> {
        self.0.fields.read().get(name).cloned()
    }

    /// Snapshot of the field table in declaration order
    #[must_use]
    pub fn fields(&self) -> Vec<(String, FieldDescriptor)> {
        self.0
            .fields
            .read()
            .iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.clone()))
            .collect()
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.0.fields.read().contains_key(name)
    }

    /// Add or replace a field on the shared table
    pub fn add_field(&self, name: impl Into<String>, descriptor: FieldDescriptor) {
        self.0.fields.write().insert(name.into(), descriptor);
    }

    /// The registry this schema was defined in, while it is alive
    #[must_use]
    pub fn registry(&self) -> Option<Registry> {
        self.0.registry.upgrade().map(Registry::from_inner)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &SchemaClass) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A fresh instance with a newly created element
    #[must_use]
    pub fn new_instance(&self) -> Stanza {
        self.construct(None, None, None)
    }

    /// A fresh instance with `data` applied through the field setters
    #[must_use]
    pub fn from_data(&self, data: &Value) -> Stanza {
        self.construct(Some(data), None, None)
    }

    /// An instance backed by an existing element
    #[must_use]
    pub fn wrap(&self, node: Element) -> Stanza {
        self.construct(None, Some(node), None)
    }

    /// Build an instance
    ///
    /// Without `node` a new element is created, declaring `xmlns` only when
    /// the parent context is in another namespace. Registered child
    /// elements are then wrapped and cached under their schema names, the
    /// last matching child winning. Finally `data` is applied and the
    /// init hook runs.
    #[must_use]
    pub fn construct(
        &self,
        data: Option<&Value>,
        node: Option<Element>,
        parent: Option<ParentContext<'_>>,
    ) -> Stanza {
        let xml = node.unwrap_or_else(|| {
            let parent_namespace = parent.as_ref().and_then(ParentContext::namespace);
            create_element(self.namespace(), self.element(), parent_namespace.as_deref())
        });

        for (prefix, namespace) in self.prefixes() {
            xml.set_attr(&format!("xmlns:{prefix}"), namespace.as_str());
        }

        let stanza = Stanza::from_parts(self.clone(), xml.clone());
        if let Some(ParentContext::Stanza(parent)) = parent {
            stanza.set_parent(parent);
        }

        if let Some(registry) = self.registry() {
            for child in xml.child_elements() {
                let namespace = child.namespace().unwrap_or_default();
                let Some(class) = registry.get_definition(&child.local_name(), &namespace) else {
                    continue;
                };
                trace!("Discovered <{}> as '{}' under {}", child.name(), class.name(), self.qname());
                let extension = class.construct(None, Some(child), Some(ParentContext::Stanza(&stanza)));
                stanza.cache_extension(class.name(), extension);
            }
        }

        if let Some(data) = data {
            stanza.assign(data);
        }

        if let Some(init) = &self.0.init {
            init(&stanza, data);
        }

        stanza
    }
}

impl PartialEq for SchemaClass {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SchemaClass {}

impl fmt::Debug for SchemaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaClass")
            .field("name", &self.name())
            .field("qname", &self.qname().to_string())
            .field("top_level", &self.is_top_level())
            .field("fields", &self.0.fields.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
