//! Schema registry
//!
//! The [`Registry`] owns every schema defined through it, the extension
//! bindings between them, a tag index for bulk discovery, and the deferred
//! subscribers used to resolve forward references between schemas.
//!
//! Registration is expected to happen up front. After that a registry can
//! be shared freely for lookups, parsing and instance construction:
//! cloning a `Registry` yields another handle to the same tables.

mod callbacks;

use std::sync::Arc;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace, warn};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

pub use callbacks::DefinitionCallback;
use callbacks::Subscribers;

use crate::config::RegistryConfig;
use crate::dom::{Element, parse_document};
use crate::error::{Result, StanzaError};
use crate::schema::{FieldDescriptor, QName, Schema, SchemaClass, types};
use crate::stanza::Stanza;

/// A registration function applied through [`Registry::use_plugin`]
pub type Plugin = fn(&Registry);

#[derive(Default)]
struct Tables {
    definitions: FxHashMap<QName, SchemaClass>,
    extensions: FxHashMap<QName, IndexMap<String, SchemaClass>>,
    tags: FxHashMap<String, Vec<SchemaClass>>,
    definition_listeners: Subscribers<QName>,
    tag_listeners: Subscribers<String>,
}

pub(crate) struct RegistryInner {
    config: RegistryConfig,
    tables: RwLock<Tables>,
    plugins: Mutex<FxHashSet<usize>>,
}

/// A registry of schemas
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Create an empty registry with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with a custom configuration
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                tables: RwLock::new(Tables::default()),
                plugins: Mutex::new(FxHashSet::default()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Apply a registration function once
    ///
    /// Applying the same function to the same registry again does nothing.
    pub fn use_plugin(&self, plugin: Plugin) -> &Self {
        let key = plugin as usize;
        if self.inner.plugins.lock().insert(key) {
            debug!("Applying plugin {key:#x}");
            plugin(self);
        }
        self
    }

    /// Register a schema
    ///
    /// Replaces any schema already registered under the same qualified
    /// name, appends the new class to each of its tags, then notifies the
    /// subscribers for its qualified name followed by those for its tags.
    pub fn define(&self, schema: Schema) -> SchemaClass {
        let class = SchemaClass::from_schema(schema, Arc::downgrade(&self.inner));
        let qname = class.qname().clone();

        let (by_name, by_tag) = {
            let mut tables = self.inner.tables.write();
            let previous = tables.definitions.insert(qname.clone(), class.clone());
            if previous.is_some() && self.inner.config.warn_on_redefinition {
                warn!("Redefining schema {qname}");
            }
            for tag in class.tags() {
                tables.tags.entry(tag.clone()).or_default().push(class.clone());
            }

            let by_name = tables.definition_listeners.snapshot(&qname);
            let by_tag = class
                .tags()
                .iter()
                .flat_map(|tag| tables.tag_listeners.snapshot(tag.as_str()))
                .collect_vec();
            (by_name, by_tag)
        };

        debug!(
            "Defined '{}' as {} with tags [{}]",
            class.name(),
            qname,
            class.tags().iter().join(", ")
        );

        for callback in by_name.iter().chain(by_tag.iter()) {
            trace!("Delivering {qname} to a deferred subscriber");
            callback(&class);
        }

        class
    }

    /// Add a field to an already defined class
    pub fn add(&self, class: &SchemaClass, name: &str, descriptor: FieldDescriptor) {
        class.add_field(name, descriptor);
    }

    /// Bind `child` as a single nested schema of `parent`
    ///
    /// `parent` gains a field named after the child schema.
    pub fn extend(&self, parent: &SchemaClass, child: &SchemaClass) {
        self.bind(parent, child, None, false);
    }

    /// Bind `child` as a repeated nested schema of `parent`
    ///
    /// `parent` gains a list field named `multi_name`, plus the single field
    /// named after the child schema unless `hide_single` is set.
    pub fn extend_multi(
        &self,
        parent: &SchemaClass,
        child: &SchemaClass,
        multi_name: &str,
        hide_single: bool,
    ) {
        self.bind(parent, child, Some(multi_name), hide_single);
    }

    fn bind(&self, parent: &SchemaClass, child: &SchemaClass, multi_name: Option<&str>, hide_single: bool) {
        {
            let mut tables = self.inner.tables.write();
            tables
                .definitions
                .insert(child.qname().clone(), child.clone());
            tables.extensions.entry(child.qname().clone()).or_default();
            tables
                .extensions
                .entry(parent.qname().clone())
                .or_default()
                .insert(child.name().to_string(), child.clone());
        }

        if multi_name.is_none() || !hide_single {
            parent.add_field(child.name(), types::extension(child));
        }
        if let Some(multi_name) = multi_name {
            parent.add_field(multi_name, types::multi_extension(child));
        }

        debug!(
            "Extended {} with '{}'{}",
            parent.qname(),
            child.name(),
            multi_name.map(|m| format!(" (multi '{m}')")).unwrap_or_default()
        );
    }

    /// Call `callback` with the class registered as `namespace|element`
    ///
    /// Fires immediately when the name is already defined, and again each
    /// time it is (re)defined later.
    pub fn with_definition<F>(&self, element: &str, namespace: &str, callback: F)
    where
        F: Fn(&SchemaClass) + Send + Sync + 'static,
    {
        let callback: DefinitionCallback = Arc::new(callback);
        let qname = QName::new(namespace, element);
        let existing = {
            let mut tables = self.inner.tables.write();
            tables
                .definition_listeners
                .subscribe(qname.clone(), Arc::clone(&callback));
            tables.definitions.get(&qname).cloned()
        };
        if let Some(class) = existing {
            trace!("Delivering {qname} to a new subscriber");
            callback(&class);
        }
    }

    /// Call `callback` with every class tagged `tag`
    ///
    /// Classes already tagged are replayed immediately in registration
    /// order; classes defined later are delivered as they are defined.
    pub fn with_tag<F>(&self, tag: &str, callback: F)
    where
        F: Fn(&SchemaClass) + Send + Sync + 'static,
    {
        let callback: DefinitionCallback = Arc::new(callback);
        let existing = {
            let mut tables = self.inner.tables.write();
            tables
                .tag_listeners
                .subscribe(tag.to_string(), Arc::clone(&callback));
            tables.tags.get(tag).cloned().unwrap_or_default()
        };
        for class in &existing {
            callback(class);
        }
    }

    /// Classes tagged `tag`, in registration order
    #[must_use]
    pub fn tagged(&self, tag: &str) -> Vec<SchemaClass> {
        self.inner.tables.read().tags.get(tag).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn get_definition(&self, element: &str, namespace: &str) -> Option<SchemaClass> {
        self.inner
            .tables
            .read()
            .definitions
            .get(&QName::new(namespace, element))
            .cloned()
    }

    /// Like [`Registry::get_definition`], but a miss is an error
    pub fn require_definition(&self, element: &str, namespace: &str) -> Result<SchemaClass> {
        self.get_definition(element, namespace)
            .ok_or_else(|| StanzaError::missing_definition(element, namespace))
    }

    /// Extension bindings recorded for `namespace|element`, by field name
    #[must_use]
    pub fn get_extensions(&self, element: &str, namespace: &str) -> IndexMap<String, SchemaClass> {
        self.inner
            .tables
            .read()
            .extensions
            .get(&QName::new(namespace, element))
            .cloned()
            .unwrap_or_default()
    }

    /// Wrap `node` with the class registered for its qualified name
    #[must_use]
    pub fn build(&self, node: Element) -> Option<Stanza> {
        let namespace = node.namespace().unwrap_or_default();
        let class = self.get_definition(&node.local_name(), &namespace)?;
        Some(class.wrap(node))
    }

    /// Parse a document and build its root element
    ///
    /// Yields `Ok(None)` when the root element has no registered class.
    pub fn parse(&self, text: &str) -> Result<Option<Stanza>> {
        let root = parse_document(text).inspect_err(|e| debug!("{e}"))?;
        let stanza = self.build(root);
        if stanza.is_none() {
            trace!("No definition for the root of {text:?}");
        }
        Ok(stanza)
    }

    /// Parse a document and wrap its root element with `class`
    pub fn parse_as(&self, text: &str, class: &SchemaClass) -> Result<Stanza> {
        let root = parse_document(text).inspect_err(|e| debug!("{e}"))?;
        Ok(class.wrap(root))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.inner.tables.read();
        f.debug_struct("Registry")
            .field("definitions", &tables.definitions.len())
            .field("tags", &tables.tags.keys().sorted().collect_vec())
            .finish_non_exhaustive()
    }
}
