//! Element-level accessors shared by the field descriptors
//!
//! Every function here works directly on an [`Element`] and never fails:
//! missing nodes read as defaults and empty values remove what they target.

use serde_json::{Map, Value};

use crate::dom::{Element, XML_NS, create_element};

/// Loose truthiness for plain data: `null`, `false`, `0`, `NaN` and `""` are
/// falsy, everything else is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a plain value
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

/// Parse the leading integer of `text`, ignoring trailing garbage
#[must_use]
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['+', '-']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

/// Parse the leading decimal number of `text`, ignoring trailing garbage
#[must_use]
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = usize::from(trimmed.starts_with(['+', '-']));
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    trimmed[..end].parse().ok()
}

/// Attribute value, or `default` when absent or empty
#[must_use]
pub fn get_attribute(xml: &Element, attr: &str, default: Option<&str>) -> String {
    xml.attr(attr)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.unwrap_or_default().to_string())
}

/// Write an attribute; an empty value removes it unless `force` is set
pub fn set_attribute(xml: &Element, attr: &str, value: &str, force: bool) {
    if !value.is_empty() || force {
        xml.set_attr(attr, value);
    } else {
        xml.remove_attr(attr);
    }
}

#[must_use]
pub fn get_attribute_ns(xml: &Element, namespace: &str, attr: &str, default: Option<&str>) -> String {
    xml.attr_ns(namespace, attr)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.unwrap_or_default().to_string())
}

pub fn set_attribute_ns(xml: &Element, namespace: &str, attr: &str, value: &str, force: bool) {
    if !value.is_empty() || force {
        xml.set_attr_ns(namespace, attr, value);
    } else {
        xml.remove_attr_ns(namespace, attr);
    }
}

#[must_use]
pub fn get_bool_attribute(xml: &Element, attr: &str) -> bool {
    matches!(xml.attr(attr).as_deref(), Some("1" | "true"))
}

pub fn set_bool_attribute(xml: &Element, attr: &str, value: bool) {
    if value {
        xml.set_attr(attr, "1");
    } else {
        xml.remove_attr(attr);
    }
}

/// Attribute of the first matching child
#[must_use]
pub fn get_sub_attribute(
    xml: &Element,
    namespace: &str,
    sub: &str,
    attr: &str,
    default: Option<&str>,
) -> String {
    match xml.find(namespace, sub).first() {
        Some(child) => get_attribute(child, attr, default),
        None => String::new(),
    }
}

/// Write an attribute on the first matching child, creating the child when
/// there is a value to write
pub fn set_sub_attribute(xml: &Element, namespace: &str, sub: &str, attr: &str, value: &str) {
    let subs = xml.find(namespace, sub);
    match subs.first() {
        None if !value.is_empty() => {
            let child = create_element(namespace, sub, xml.namespace().as_deref());
            child.set_attr(attr, value);
            xml.append_child(&child);
        }
        None => {}
        Some(first) if !value.is_empty() => first.set_attr(attr, value),
        Some(_) => {
            for child in &subs {
                child.remove_attr(attr);
            }
        }
    }
}

#[must_use]
pub fn get_bool_sub_attribute(xml: &Element, namespace: &str, sub: &str, attr: &str) -> bool {
    matches!(
        get_sub_attribute(xml, namespace, sub, attr, None).as_str(),
        "1" | "true"
    )
}

pub fn set_bool_sub_attribute(xml: &Element, namespace: &str, sub: &str, attr: &str, value: bool) {
    set_sub_attribute(xml, namespace, sub, attr, if value { "1" } else { "" });
}

#[must_use]
pub fn get_text(xml: &Element) -> String {
    xml.text()
}

pub fn set_text(xml: &Element, value: &str) {
    xml.set_text(value);
}

/// Text of the first matching child, or `default`
#[must_use]
pub fn get_sub_text(xml: &Element, namespace: &str, element: &str, default: Option<&str>) -> String {
    xml.find(namespace, element)
        .first()
        .map(Element::text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| default.unwrap_or_default().to_string())
}

/// Replace every matching child with at most one new child
///
/// `None` only removes. `Some("")` leaves an empty child behind, which is
/// how a bare flag element is written.
pub fn set_sub_text(xml: &Element, namespace: &str, element: &str, value: Option<&str>) {
    for child in xml.find(namespace, element) {
        xml.remove_child(&child);
    }
    if let Some(text) = value {
        let child = create_element(namespace, element, xml.namespace().as_deref());
        child.set_text(text);
        xml.append_child(&child);
    }
}

#[must_use]
pub fn get_multi_sub_text(xml: &Element, namespace: &str, element: &str) -> Vec<String> {
    xml.find(namespace, element).iter().map(Element::text).collect()
}

/// Rebuild the matching children from `values`, skipping empty entries
pub fn set_multi_sub_text(xml: &Element, namespace: &str, element: &str, values: &[String]) {
    for child in xml.find(namespace, element) {
        xml.remove_child(&child);
    }
    for value in values.iter().filter(|value| !value.is_empty()) {
        let child = create_element(namespace, element, xml.namespace().as_deref());
        child.set_text(value);
        xml.append_child(&child);
    }
}

#[must_use]
pub fn get_multi_sub_attribute(xml: &Element, namespace: &str, element: &str, attr: &str) -> Vec<String> {
    xml.find(namespace, element)
        .iter()
        .map(|child| get_attribute(child, attr, None))
        .collect()
}

/// Rebuild the matching children, one per value, each carrying `attr`
pub fn set_multi_sub_attribute(
    xml: &Element,
    namespace: &str,
    element: &str,
    attr: &str,
    values: &[String],
) {
    for child in xml.find(namespace, element) {
        xml.remove_child(&child);
    }
    for value in values {
        let child = create_element(namespace, element, xml.namespace().as_deref());
        set_attribute(&child, attr, value, false);
        xml.append_child(&child);
    }
}

/// Map of `xml:lang` to text; children without a language use `default_lang`
#[must_use]
pub fn get_sub_lang_text(
    xml: &Element,
    namespace: &str,
    element: &str,
    default_lang: &str,
) -> Map<String, Value> {
    let mut results = Map::new();
    for child in xml.find(namespace, element) {
        let lang = child
            .attr_ns(XML_NS, "lang")
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| default_lang.to_string());
        results.insert(lang, Value::String(child.text()));
    }
    results
}

/// Rebuild the language-keyed children
///
/// A plain string becomes a single child without a language. A map becomes
/// one child per entry; the `default_lang` entry carries no `xml:lang`.
pub fn set_sub_lang_text(xml: &Element, namespace: &str, element: &str, value: &Value, default_lang: &str) {
    for child in xml.find(namespace, element) {
        xml.remove_child(&child);
    }
    let parent_ns = xml.namespace();
    match value {
        Value::String(text) => {
            let child = create_element(namespace, element, parent_ns.as_deref());
            child.set_text(text);
            xml.append_child(&child);
        }
        Value::Object(entries) => {
            for (lang, text) in entries {
                let child = create_element(namespace, element, parent_ns.as_deref());
                if lang != default_lang {
                    child.set_attr_ns(XML_NS, "lang", lang.as_str());
                }
                child.set_text(&value_text(text));
                xml.append_child(&child);
            }
        }
        _ => {}
    }
}

#[must_use]
pub fn get_bool_sub(xml: &Element, namespace: &str, element: &str) -> bool {
    !xml.find(namespace, element).is_empty()
}

/// `true` ensures one (empty) child exists, `false` removes every match
pub fn set_bool_sub(xml: &Element, namespace: &str, element: &str, value: bool) {
    let subs = xml.find(namespace, element);
    if value {
        if subs.is_empty() {
            let child = create_element(namespace, element, xml.namespace().as_deref());
            xml.append_child(&child);
        }
    } else {
        for child in &subs {
            xml.remove_child(child);
        }
    }
}
