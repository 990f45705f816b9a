//! Field descriptor factories
//!
//! Each function returns a [`FieldDescriptor`] closed over its parameters.
//! Getters never fail: absent or malformed content reads as the declared
//! default. Setters treat falsy plain values (`null`, `false`, `0`, `""`)
//! as "remove" unless noted otherwise.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

use super::dates::parse_timestamp;
use super::field::{FieldDescriptor, FieldKind, FieldValue, format_timestamp};
use super::helpers::{
    get_attribute, get_attribute_ns, get_bool_attribute, get_bool_sub, get_bool_sub_attribute,
    get_multi_sub_attribute, get_multi_sub_text, get_sub_attribute, get_sub_lang_text, get_sub_text,
    get_text, is_truthy, parse_float_prefix, parse_int_prefix, set_attribute, set_attribute_ns,
    set_bool_attribute, set_bool_sub, set_bool_sub_attribute, set_multi_sub_attribute,
    set_multi_sub_text, set_sub_attribute, set_sub_lang_text, set_sub_text, set_text, value_text,
};
use crate::config::DateFormatConfig;
use crate::dom::{Element, XML_NS, create_element};
use crate::schema::{ParentContext, SchemaClass};
use crate::stanza::Stanza;

/// Text of a truthy value, or "" for a falsy one
fn truthy_text(value: &Value) -> String {
    if is_truthy(value) {
        value_text(value)
    } else {
        String::new()
    }
}

/// A list of strings from an array value; anything else is an empty list
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect(),
        _ => Vec::new(),
    }
}

fn json_strings(values: Vec<String>) -> FieldValue {
    FieldValue::Json(Value::Array(values.into_iter().map(Value::String).collect()))
}

/// Build a custom descriptor from a getter and a setter
pub fn field<G, S>(getter: G, setter: S) -> FieldDescriptor
where
    G: Fn(&Stanza) -> FieldValue + Send + Sync + 'static,
    S: Fn(&Stanza, &Value) + Send + Sync + 'static,
{
    FieldDescriptor::new(FieldKind::Custom, getter, setter)
}

/// Plain attribute; reads as `default` when absent or empty
pub fn attribute(name: &str, default: Option<&str>) -> FieldDescriptor {
    let attr = name.to_string();
    let default = default.map(str::to_string);
    let set_attr = attr.clone();
    FieldDescriptor::new(
        FieldKind::Attribute,
        move |stanza| {
            FieldValue::Json(Value::String(get_attribute(
                stanza.xml(),
                &attr,
                default.as_deref(),
            )))
        },
        move |stanza, value| set_attribute(stanza.xml(), &set_attr, &truthy_text(value), false),
    )
}

/// Attribute in a namespace other than the element's own
pub fn attribute_ns(namespace: &str, name: &str, default: Option<&str>) -> FieldDescriptor {
    let namespace = namespace.to_string();
    let attr = name.to_string();
    let default = default.map(str::to_string);
    let (set_ns, set_attr) = (namespace.clone(), attr.clone());
    FieldDescriptor::new(
        FieldKind::Attribute,
        move |stanza| {
            FieldValue::Json(Value::String(get_attribute_ns(
                stanza.xml(),
                &namespace,
                &attr,
                default.as_deref(),
            )))
        },
        move |stanza, value| {
            set_attribute_ns(stanza.xml(), &set_ns, &set_attr, &truthy_text(value), false);
        },
    )
}

/// `"1"`/`"true"` reads as true; true writes `"1"`, false removes
pub fn bool_attribute(name: &str) -> FieldDescriptor {
    let attr = name.to_string();
    let set_attr = attr.clone();
    FieldDescriptor::new(
        FieldKind::BoolAttribute,
        move |stanza| FieldValue::Json(Value::Bool(get_bool_attribute(stanza.xml(), &attr))),
        move |stanza, value| set_bool_attribute(stanza.xml(), &set_attr, is_truthy(value)),
    )
}

/// Attribute of the first `<sub xmlns=namespace>` child
pub fn sub_attribute(namespace: &str, sub: &str, attr: &str) -> FieldDescriptor {
    let (namespace, sub, attr) = (namespace.to_string(), sub.to_string(), attr.to_string());
    let (set_ns, set_sub, set_attr) = (namespace.clone(), sub.clone(), attr.clone());
    FieldDescriptor::new(
        FieldKind::SubAttribute,
        move |stanza| {
            FieldValue::Json(Value::String(get_sub_attribute(
                stanza.xml(),
                &namespace,
                &sub,
                &attr,
                None,
            )))
        },
        move |stanza, value| {
            set_sub_attribute(stanza.xml(), &set_ns, &set_sub, &set_attr, &truthy_text(value));
        },
    )
}

pub fn bool_sub_attribute(namespace: &str, sub: &str, attr: &str) -> FieldDescriptor {
    let (namespace, sub, attr) = (namespace.to_string(), sub.to_string(), attr.to_string());
    let (set_ns, set_sub, set_attr) = (namespace.clone(), sub.clone(), attr.clone());
    FieldDescriptor::new(
        FieldKind::BoolSubAttribute,
        move |stanza| {
            FieldValue::Json(Value::Bool(get_bool_sub_attribute(
                stanza.xml(),
                &namespace,
                &sub,
                &attr,
            )))
        },
        move |stanza, value| {
            set_bool_sub_attribute(stanza.xml(), &set_ns, &set_sub, &set_attr, is_truthy(value));
        },
    )
}

/// Direct text content of the element
pub fn text() -> FieldDescriptor {
    FieldDescriptor::new(
        FieldKind::Text,
        |stanza| FieldValue::Json(Value::String(get_text(stanza.xml()))),
        |stanza, value| set_text(stanza.xml(), &value_text(value)),
    )
}

/// Text of a single named child
///
/// Writing `true` leaves an empty child, which is how flag elements are
/// expressed.
pub fn sub_text(namespace: &str, element: &str) -> FieldDescriptor {
    let (namespace, element) = (namespace.to_string(), element.to_string());
    let (set_ns, set_el) = (namespace.clone(), element.clone());
    FieldDescriptor::new(
        FieldKind::SubText,
        move |stanza| {
            FieldValue::Json(Value::String(get_sub_text(
                stanza.xml(),
                &namespace,
                &element,
                None,
            )))
        },
        move |stanza, value| {
            let text = match value {
                Value::Bool(true) => Some(String::new()),
                other if is_truthy(other) => Some(value_text(other)),
                _ => None,
            };
            set_sub_text(stanza.xml(), &set_ns, &set_el, text.as_deref());
        },
    )
}

/// Texts of repeated named children
///
/// A string value is split on newlines; an array is taken item by item.
pub fn multi_sub_text(namespace: &str, element: &str) -> FieldDescriptor {
    let (namespace, element) = (namespace.to_string(), element.to_string());
    let (set_ns, set_el) = (namespace.clone(), element.clone());
    FieldDescriptor::new(
        FieldKind::MultiSubText,
        move |stanza| json_strings(get_multi_sub_text(stanza.xml(), &namespace, &element)),
        move |stanza, value| {
            let values = match value {
                Value::String(text) => text.split('\n').map(str::to_string).collect(),
                other => string_list(other),
            };
            set_multi_sub_text(stanza.xml(), &set_ns, &set_el, &values);
        },
    )
}

/// One attribute from each of the repeated named children
pub fn multi_sub_attribute(namespace: &str, element: &str, attr: &str) -> FieldDescriptor {
    let (namespace, element, attr) = (namespace.to_string(), element.to_string(), attr.to_string());
    let (set_ns, set_el, set_attr) = (namespace.clone(), element.clone(), attr.clone());
    FieldDescriptor::new(
        FieldKind::MultiSubAttribute,
        move |stanza| {
            json_strings(get_multi_sub_attribute(
                stanza.xml(),
                &namespace,
                &element,
                &attr,
            ))
        },
        move |stanza, value| {
            let values = match value {
                Value::String(text) => text.split('\n').map(str::to_string).collect(),
                other => string_list(other),
            };
            set_multi_sub_attribute(stanza.xml(), &set_ns, &set_el, &set_attr, &values);
        },
    )
}

/// Language-keyed texts; children without `xml:lang` are keyed by `default_lang`
pub fn sub_lang_text(namespace: &str, element: &str, default_lang: &str) -> FieldDescriptor {
    let (namespace, element, default_lang) = (
        namespace.to_string(),
        element.to_string(),
        default_lang.to_string(),
    );
    let (set_ns, set_el, set_lang) = (namespace.clone(), element.clone(), default_lang.clone());
    FieldDescriptor::new(
        FieldKind::SubLangText,
        move |stanza| {
            FieldValue::Json(Value::Object(get_sub_lang_text(
                stanza.xml(),
                &namespace,
                &element,
                &default_lang,
            )))
        },
        move |stanza, value| set_sub_lang_text(stanza.xml(), &set_ns, &set_el, value, &set_lang),
    )
}

/// Presence of a named child
pub fn bool_sub(namespace: &str, element: &str) -> FieldDescriptor {
    let (namespace, element) = (namespace.to_string(), element.to_string());
    let (set_ns, set_el) = (namespace.clone(), element.clone());
    FieldDescriptor::new(
        FieldKind::BoolSub,
        move |stanza| FieldValue::Json(Value::Bool(get_bool_sub(stanza.xml(), &namespace, &element))),
        move |stanza, value| set_bool_sub(stanza.xml(), &set_ns, &set_el, is_truthy(value)),
    )
}

/// The element's `xml:lang` attribute
pub fn lang_attribute() -> FieldDescriptor {
    FieldDescriptor::new(
        FieldKind::Lang,
        |stanza| {
            FieldValue::Json(Value::String(
                stanza.xml().attr_ns(XML_NS, "lang").unwrap_or_default(),
            ))
        },
        |stanza, value| stanza.xml().set_attr_ns(XML_NS, "lang", value_text(value)),
    )
}

/// Base64 payload carried in the element text
///
/// An empty payload is written as the `=` sentinel. A string value is
/// encoded from its UTF-8 bytes; an array of byte values is encoded as is.
pub fn b64_text() -> FieldDescriptor {
    FieldDescriptor::new(
        FieldKind::Base64,
        |stanza| {
            let content = stanza.xml().text();
            if content.is_empty() || content == "=" {
                return FieldValue::Json(Value::String(String::new()));
            }
            let compact: String = content.split_whitespace().collect();
            match STANDARD.decode(compact) {
                Ok(bytes) => FieldValue::Bytes(bytes),
                Err(_) => FieldValue::Json(Value::String(String::new())),
            }
        },
        |stanza, value| {
            let bytes = match value {
                Value::String(text) => Some(text.as_bytes().to_vec()),
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect(),
                _ => None,
            };
            match bytes {
                Some(bytes) if bytes.is_empty() => stanza.xml().set_text("="),
                Some(bytes) => stanza.xml().set_text(&STANDARD.encode(bytes)),
                None => stanza.xml().set_text(""),
            }
        },
    )
}

fn date_config(stanza: &Stanza) -> DateFormatConfig {
    stanza
        .registry()
        .map(|registry| registry.config().date_format_config.clone())
        .unwrap_or_default()
}

fn date_field<R, W>(read: R, write: W, now: bool) -> FieldDescriptor
where
    R: Fn(&Element) -> String + Send + Sync + 'static,
    W: Fn(&Element, &str) + Send + Sync + 'static,
{
    FieldDescriptor::new(
        FieldKind::Date,
        move |stanza| {
            let data = read(stanza.xml());
            let parsed = if data.is_empty() {
                None
            } else {
                parse_timestamp(&data, &date_config(stanza))
            };
            match parsed {
                Some(date) => FieldValue::Date(date),
                None if now => FieldValue::Date(Utc::now()),
                None => FieldValue::Json(Value::Null),
            }
        },
        move |stanza, value| {
            if !is_truthy(value) {
                return;
            }
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Number(millis) => match millis.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis) {
                    Some(date) => format_timestamp(&date),
                    None => return,
                },
                _ => return,
            };
            write(stanza.xml(), &text);
        },
    )
}

/// Timestamp attribute; absent reads as now when `now` is set
pub fn date_attribute(attr: &str, now: bool) -> FieldDescriptor {
    let attr = attr.to_string();
    let set_attr = attr.clone();
    date_field(
        move |xml| get_attribute(xml, &attr, None),
        move |xml, text| set_attribute(xml, &set_attr, text, false),
        now,
    )
}

/// Timestamp in the text of a named child
pub fn date_sub(namespace: &str, sub: &str, now: bool) -> FieldDescriptor {
    let (namespace, sub) = (namespace.to_string(), sub.to_string());
    let (set_ns, set_sub) = (namespace.clone(), sub.clone());
    date_field(
        move |xml| get_sub_text(xml, &namespace, &sub, None),
        move |xml, text| set_sub_text(xml, &set_ns, &set_sub, Some(text)),
        now,
    )
}

/// Timestamp in an attribute of a named child
pub fn date_sub_attribute(namespace: &str, sub: &str, attr: &str, now: bool) -> FieldDescriptor {
    let (namespace, sub, attr) = (namespace.to_string(), sub.to_string(), attr.to_string());
    let (set_ns, set_sub, set_attr) = (namespace.clone(), sub.clone(), attr.clone());
    date_field(
        move |xml| get_sub_attribute(xml, &namespace, &sub, &attr, None),
        move |xml, text| set_sub_attribute(xml, &set_ns, &set_sub, &set_attr, text),
        now,
    )
}

fn number_field<R, W>(read: R, write: W, float: bool, default: Option<Number>) -> FieldDescriptor
where
    R: Fn(&Element) -> String + Send + Sync + 'static,
    W: Fn(&Element, &str) + Send + Sync + 'static,
{
    let fallback = default.map_or(Value::Null, Value::Number);
    FieldDescriptor::new(
        FieldKind::Number,
        move |stanza| {
            let data = read(stanza.xml());
            let parsed = if float {
                parse_float_prefix(&data)
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            } else {
                parse_int_prefix(&data).map(Value::from)
            };
            FieldValue::Json(parsed.unwrap_or_else(|| fallback.clone()))
        },
        move |stanza, value| write(stanza.xml(), &value_text(value)),
    )
}

/// Integer (or float) attribute; unparseable or absent reads as `default`
pub fn number_attribute(attr: &str, float: bool, default: Option<Number>) -> FieldDescriptor {
    let attr = attr.to_string();
    let set_attr = attr.clone();
    number_field(
        move |xml| get_attribute(xml, &attr, None),
        move |xml, text| set_attribute(xml, &set_attr, text, false),
        float,
        default,
    )
}

/// Integer (or float) text of a named child
pub fn number_sub(namespace: &str, sub: &str, float: bool, default: Option<Number>) -> FieldDescriptor {
    let (namespace, sub) = (namespace.to_string(), sub.to_string());
    let (set_ns, set_sub) = (namespace.clone(), sub.clone());
    number_field(
        move |xml| get_sub_text(xml, &namespace, &sub, None),
        move |xml, text| {
            let text = (!text.is_empty()).then_some(text);
            set_sub_text(xml, &set_ns, &set_sub, text);
        },
        float,
        default,
    )
}

pub fn number_sub_attribute(
    namespace: &str,
    sub: &str,
    attr: &str,
    float: bool,
    default: Option<Number>,
) -> FieldDescriptor {
    let (namespace, sub, attr) = (namespace.to_string(), sub.to_string(), attr.to_string());
    let (set_ns, set_sub, set_attr) = (namespace.clone(), sub.clone(), attr.clone());
    number_field(
        move |xml| get_sub_attribute(xml, &namespace, &sub, &attr, None),
        move |xml, text| set_sub_attribute(xml, &set_ns, &set_sub, &set_attr, text),
        float,
        default,
    )
}

/// At most one child out of a fixed set of tag names
///
/// Reads the name of the first present member (in `values` order), or "".
/// Writing removes every other present member and ensures the selected one.
pub fn enum_sub(namespace: &str, values: &[&str]) -> FieldDescriptor {
    let namespace = namespace.to_string();
    let values: Vec<String> = values.iter().map(|v| (*v).to_string()).collect();
    let (set_ns, set_values) = (namespace.clone(), values.clone());
    FieldDescriptor::new(
        FieldKind::Enum,
        move |stanza| {
            let found = values
                .iter()
                .find_map(|value| stanza.xml().find(&namespace, value).into_iter().next())
                .map(|element| element.name())
                .unwrap_or_default();
            FieldValue::Json(Value::String(found))
        },
        move |stanza, value| {
            let xml = stanza.xml();
            let selected = truthy_text(value);
            let mut already_exists = false;
            for member in &set_values {
                if let Some(existing) = xml.find(&set_ns, member).first() {
                    if *member == selected {
                        already_exists = true;
                    } else {
                        xml.remove_child(existing);
                    }
                }
            }
            if !selected.is_empty() && !already_exists {
                xml.append_child(&create_element(&set_ns, &selected, None));
            }
        },
    )
}

/// One nested `child` schema, created on first access and cached
///
/// Writing merges the plain value onto the (possibly new) child; `true`
/// creates the child without extra data and falsy values are ignored.
pub fn extension(child: &SchemaClass) -> FieldDescriptor {
    let (get_class, set_class, probe_class) = (child.clone(), child.clone(), child.clone());
    FieldDescriptor::new(
        FieldKind::Extension,
        move |stanza| FieldValue::Stanza(stanza.extension_for(&get_class)),
        move |stanza, value| {
            if is_truthy(value) {
                stanza.extension_for(&set_class).assign(value);
            }
        },
    )
    .with_probe(move |stanza| {
        stanza.cached_extension(probe_class.name()).is_some()
            || !stanza
                .xml()
                .find(probe_class.namespace(), probe_class.element())
                .is_empty()
    })
}

/// Every nested `child` schema, rebuilt from the tree on each read
///
/// Writing removes every matching child and appends one per array item.
pub fn multi_extension(child: &SchemaClass) -> FieldDescriptor {
    let (get_class, set_class) = (child.clone(), child.clone());
    FieldDescriptor::new(
        FieldKind::MultiExtension,
        move |stanza| {
            let empty = Value::Object(Map::new());
            let children = stanza
                .xml()
                .find(get_class.namespace(), get_class.element())
                .into_iter()
                .map(|node| get_class.construct(Some(&empty), Some(node), Some(ParentContext::Stanza(stanza))))
                .collect();
            FieldValue::Stanzas(children)
        },
        move |stanza, value| {
            let xml = stanza.xml();
            for existing in xml.find(set_class.namespace(), set_class.element()) {
                xml.remove_child(&existing);
            }
            if let Value::Array(items) = value {
                for item in items {
                    let created = set_class.construct(Some(item), None, Some(ParentContext::Stanza(stanza)));
                    xml.append_child(created.xml());
                }
            }
        },
    )
}

fn sub_extension_for(stanza: &Stanza, name: &str, namespace: &str, sub: &str, child: &SchemaClass) -> Stanza {
    if let Some(cached) = stanza.cached_extension(name) {
        return cached;
    }

    let wrapper = stanza.xml().find_or_create(namespace, sub);

    let context = Some(ParentContext::Node(&wrapper));
    let extension = match wrapper.find(child.namespace(), child.element()).into_iter().next() {
        Some(existing) => child.construct(None, Some(existing), context),
        None => {
            let created = child.construct(Some(&Value::Object(Map::new())), None, context);
            wrapper.append_child(created.xml());
            created
        }
    };
    extension.set_parent(stanza);
    stanza.cache_extension(name, extension.clone());
    extension
}

/// A nested `child` schema one level inside a `<sub xmlns=namespace>` wrapper
///
/// The wrapper is located or created on first access. Writing a falsy value
/// removes the wrapper entirely.
pub fn sub_extension(name: &str, namespace: &str, sub: &str, child: &SchemaClass) -> FieldDescriptor {
    let (name, namespace, sub) = (name.to_string(), namespace.to_string(), sub.to_string());
    let (set_name, set_ns, set_sub) = (name.clone(), namespace.clone(), sub.clone());
    let (probe_name, probe_ns, probe_sub) = (name.clone(), namespace.clone(), sub.clone());
    let (get_class, set_class) = (child.clone(), child.clone());
    FieldDescriptor::new(
        FieldKind::SubExtension,
        move |stanza| FieldValue::Stanza(sub_extension_for(stanza, &name, &namespace, &sub, &get_class)),
        move |stanza, value| {
            let xml = stanza.xml();
            if !is_truthy(value) {
                if let Some(wrapper) = xml.find(&set_ns, &set_sub).first() {
                    xml.remove_child(wrapper);
                }
                return;
            }
            sub_extension_for(stanza, &set_name, &set_ns, &set_sub, &set_class).assign(value);
        },
    )
    .with_probe(move |stanza| {
        stanza.cached_extension(&probe_name).is_some()
            || !stanza.xml().find(&probe_ns, &probe_sub).is_empty()
    })
}

/// Repeated nested `child` schemas inside one `<sub xmlns=namespace>` wrapper
///
/// Writing replaces the whole wrapper; an empty list leaves no wrapper.
pub fn sub_multi_extension(namespace: &str, sub: &str, child: &SchemaClass) -> FieldDescriptor {
    let (namespace, sub) = (namespace.to_string(), sub.to_string());
    let (set_ns, set_sub) = (namespace.clone(), sub.clone());
    let (get_class, set_class) = (child.clone(), child.clone());
    FieldDescriptor::new(
        FieldKind::SubMultiExtension,
        move |stanza| {
            let Some(wrapper) = stanza.xml().find(&namespace, &sub).into_iter().next() else {
                return FieldValue::Stanzas(Vec::new());
            };
            let empty = Value::Object(Map::new());
            let children = wrapper
                .find(get_class.namespace(), get_class.element())
                .into_iter()
                .map(|node| get_class.construct(Some(&empty), Some(node), Some(ParentContext::Stanza(stanza))))
                .collect();
            FieldValue::Stanzas(children)
        },
        move |stanza, value| {
            let xml = stanza.xml();
            if let Some(existing) = xml.find(&set_ns, &set_sub).first() {
                xml.remove_child(existing);
            }
            let items = match value {
                Value::Array(items) if !items.is_empty() => items,
                _ => return,
            };
            let wrapper = create_element(&set_ns, &set_sub, Some(stanza.class().namespace()));
            for item in items {
                let created = set_class.construct(Some(item), None, Some(ParentContext::Namespace(&set_ns)));
                wrapper.append_child(created.xml());
            }
            xml.append_child(&wrapper);
        },
    )
}
