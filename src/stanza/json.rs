//! Plain data projection of stanzas.

use serde_json::{Map, Value};

use super::Stanza;
use crate::schema::FieldValue;

/// Project one field value, or `None` when it should be left out
///
/// Nested stanzas are always kept. Plain values are dropped when they are
/// `null`, `false`, empty strings, or empty arrays and objects.
fn project(value: FieldValue) -> Option<Value> {
    match value {
        FieldValue::Stanza(stanza) => Some(stanza.to_json()),
        FieldValue::Stanzas(stanzas) if stanzas.is_empty() => None,
        FieldValue::Stanzas(stanzas) => Some(Value::Array(stanzas.iter().map(Stanza::to_json).collect())),
        other => {
            let value = other.to_json();
            let empty = match &value {
                Value::Null | Value::Bool(false) => true,
                Value::String(text) => text.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::Object(entries) => entries.is_empty(),
                Value::Bool(true) | Value::Number(_) => false,
            };
            (!empty).then_some(value)
        }
    }
}

impl Stanza {
    /// Project this stanza into plain data
    ///
    /// Cached extensions come first, then the remaining fields in
    /// declaration order. Fields whose names start with `_` are internal
    /// and never projected. Extension fields that nothing backs yet are
    /// skipped, so projecting never adds nodes to the element.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut output = Map::new();

        for (name, extension) in self.cached_extensions() {
            if name.starts_with('_') {
                continue;
            }
            output.insert(name, extension.to_json());
        }

        let class = self.class();
        let registered = self
            .registry()
            .map(|registry| registry.get_extensions(class.element(), class.namespace()))
            .unwrap_or_default();

        for (name, descriptor) in class.fields() {
            if name.starts_with('_') || registered.contains_key(&name) || output.contains_key(&name) {
                continue;
            }
            if !descriptor.is_present(self) {
                continue;
            }
            if let Some(value) = project(descriptor.get(self)) {
                output.insert(name, value);
            }
        }

        Value::Object(output)
    }
}
