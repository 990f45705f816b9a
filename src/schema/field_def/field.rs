//! Field descriptor core types
//!
//! A [`FieldDescriptor`] is a get/set capability pair closed over fixed
//! parameters. It holds no state of its own and always works through the
//! element of the stanza it is invoked on.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::stanza::Stanza;

/// The kind of a field descriptor
///
/// Kinds are informational. Whether the JSON projection reads a field is
/// decided by the descriptor's presence probe, not by its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain or namespaced attribute
    Attribute,
    /// Boolean attribute ("1"/"true")
    BoolAttribute,
    /// Element text content
    Text,
    /// Text of one named child
    SubText,
    /// Texts of repeated named children
    MultiSubText,
    /// Attribute of repeated named children
    MultiSubAttribute,
    /// Language-keyed texts of repeated named children
    SubLangText,
    /// Attribute of one named child
    SubAttribute,
    /// Boolean attribute of one named child
    BoolSubAttribute,
    /// Presence of a named child
    BoolSub,
    /// Integer or float number
    Number,
    /// ISO-8601 timestamp
    Date,
    /// Base64 payload in text content
    Base64,
    /// `xml:lang` attribute
    Lang,
    /// One member of a fixed set of child tags
    Enum,
    /// Lazily created nested schema
    Extension,
    /// Repeated nested schemas
    MultiExtension,
    /// Nested schema inside a wrapper element
    SubExtension,
    /// Repeated nested schemas inside a wrapper element
    SubMultiExtension,
    /// Caller supplied accessors
    Custom,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Attribute => "attribute",
            FieldKind::BoolAttribute => "boolAttribute",
            FieldKind::Text => "text",
            FieldKind::SubText => "subText",
            FieldKind::MultiSubText => "multiSubText",
            FieldKind::MultiSubAttribute => "multiSubAttribute",
            FieldKind::SubLangText => "subLangText",
            FieldKind::SubAttribute => "subAttribute",
            FieldKind::BoolSubAttribute => "boolSubAttribute",
            FieldKind::BoolSub => "boolSub",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Base64 => "b64Text",
            FieldKind::Lang => "langAttribute",
            FieldKind::Enum => "enumSub",
            FieldKind::Extension => "extension",
            FieldKind::MultiExtension => "multiExtension",
            FieldKind::SubExtension => "subExtension",
            FieldKind::SubMultiExtension => "subMultiExtension",
            FieldKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// The value read from a field
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Plain data; `Value::Null` means the field has no value
    Json(Value),
    /// Parsed timestamp
    Date(DateTime<Utc>),
    /// Decoded binary payload
    Bytes(Vec<u8>),
    /// A nested stanza
    Stanza(Stanza),
    /// Nested stanzas in document order
    Stanzas(Vec<Stanza>),
}

impl FieldValue {
    /// The plain data form of this value
    ///
    /// Dates render as ISO-8601 with millisecond precision. Binary payloads
    /// render as a string when they are valid UTF-8 and as an array of byte
    /// values otherwise; both forms are accepted back by `b64_text`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Json(value) => value.clone(),
            FieldValue::Date(date) => Value::String(format_timestamp(date)),
            FieldValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Value::String(text.to_string()),
                Err(_) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            },
            FieldValue::Stanza(stanza) => stanza.to_json(),
            FieldValue::Stanzas(stanzas) => {
                Value::Array(stanzas.iter().map(Stanza::to_json).collect())
            }
        }
    }

    /// Whether this is the "no value" marker
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Json(Value::Null))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Json(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Json(Value::Bool(flag)) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Json(value) => value.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Json(value) => value.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_stanza(self) -> Option<Stanza> {
        match self {
            FieldValue::Stanza(stanza) => Some(stanza),
            _ => None,
        }
    }

    /// Nested stanzas; a single stanza yields a one-element list
    #[must_use]
    pub fn into_stanzas(self) -> Vec<Stanza> {
        match self {
            FieldValue::Stanzas(stanzas) => stanzas,
            FieldValue::Stanza(stanza) => vec![stanza],
            _ => Vec::new(),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Json(value)
    }
}

/// Render a timestamp the way the date descriptors write it
#[must_use]
pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads a field from a stanza
pub type Getter = Arc<dyn Fn(&Stanza) -> FieldValue + Send + Sync>;

/// Writes plain data into a field of a stanza
pub type Setter = Arc<dyn Fn(&Stanza, &Value) + Send + Sync>;

/// Reports whether a lazily materialized field has anything backing it yet
pub type Probe = Arc<dyn Fn(&Stanza) -> bool + Send + Sync>;

/// A get/set capability pair for one field
#[derive(Clone)]
pub struct FieldDescriptor {
    kind: FieldKind,
    getter: Getter,
    setter: Option<Setter>,
    probe: Option<Probe>,
}

impl FieldDescriptor {
    /// Create a descriptor from a getter and setter
    pub fn new<G, S>(kind: FieldKind, getter: G, setter: S) -> Self
    where
        G: Fn(&Stanza) -> FieldValue + Send + Sync + 'static,
        S: Fn(&Stanza, &Value) + Send + Sync + 'static,
    {
        Self {
            kind,
            getter: Arc::new(getter),
            setter: Some(Arc::new(setter)),
            probe: None,
        }
    }

    /// Create a descriptor without a setter
    ///
    /// Assignments to read-only fields, including those made while applying
    /// construction data, are ignored.
    pub fn read_only<G>(kind: FieldKind, getter: G) -> Self
    where
        G: Fn(&Stanza) -> FieldValue + Send + Sync + 'static,
    {
        Self {
            kind,
            getter: Arc::new(getter),
            setter: None,
            probe: None,
        }
    }

    /// Attach a presence probe
    ///
    /// When a probe reports `false`, the JSON projection skips the field
    /// without invoking the getter, so serializing never creates nodes.
    #[must_use]
    pub fn with_probe<P>(mut self, probe: P) -> Self
    where
        P: Fn(&Stanza) -> bool + Send + Sync + 'static,
    {
        self.probe = Some(Arc::new(probe));
        self
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the field from `stanza`
    #[must_use]
    pub fn get(&self, stanza: &Stanza) -> FieldValue {
        (self.getter)(stanza)
    }

    /// Write `value` into `stanza`; returns `false` for read-only fields
    pub fn set(&self, stanza: &Stanza, value: &Value) -> bool {
        match &self.setter {
            Some(setter) => {
                setter(stanza, value);
                true
            }
            None => false,
        }
    }

    /// Whether anything backs this field on `stanza` yet
    #[must_use]
    pub fn is_present(&self, stanza: &Stanza) -> bool {
        self.probe.as_ref().is_none_or(|probe| probe(stanza))
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("kind", &self.kind)
            .field("has_setter", &self.setter.is_some())
            .field("has_probe", &self.probe.is_some())
            .finish()
    }
}
