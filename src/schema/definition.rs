//! Schema definitions as handed to `Registry::define`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use smallvec::SmallVec;

use super::field_def::FieldDescriptor;
use crate::stanza::Stanza;

/// Runs after a stanza is constructed and its data applied
pub type InitHook = Arc<dyn Fn(&Stanza, Option<&Value>) + Send + Sync>;

/// A schema definition
///
/// Built with chained setters and consumed by `Registry::define`, which
/// turns it into a shared [`SchemaClass`](super::SchemaClass).
#[derive(Clone)]
pub struct Schema {
    pub(crate) name: String,
    pub(crate) namespace: String,
    pub(crate) element: Option<String>,
    pub(crate) top_level: bool,
    pub(crate) event_name: Option<String>,
    pub(crate) tags: SmallVec<[String; 2]>,
    pub(crate) prefixes: Vec<(String, String)>,
    pub(crate) fields: IndexMap<String, FieldDescriptor>,
    pub(crate) init: Option<InitHook>,
}

impl Schema {
    /// Start a definition; the element name defaults to `name`
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            element: None,
            top_level: false,
            event_name: None,
            tags: SmallVec::new(),
            prefixes: Vec::new(),
            fields: IndexMap::new(),
            init: None,
        }
    }

    #[must_use]
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Mark the schema as a document root kind
    #[must_use]
    pub fn top_level(mut self, top_level: bool) -> Self {
        self.top_level = top_level;
        self
    }

    /// Attach an informational event name
    #[must_use]
    pub fn event_name(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = Some(event_name.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Declare `xmlns:prefix="namespace"` on every constructed element
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), namespace.into()));
        self
    }

    /// Add a field; a later field with the same name replaces the earlier one
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), descriptor);
        self
    }

    /// Set the hook run at the end of every construction
    #[must_use]
    pub fn init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Stanza, Option<&Value>) + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("element", &self.element)
            .field("top_level", &self.top_level)
            .field("tags", &self.tags)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
