//! Text to element tree, on top of `quick-xml` events.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rustc_hash::FxHashMap;

use super::{Element, XML_NS};
use crate::error::{Result, StanzaError};

/// prefix -> namespace; the default namespace is stored under ""
type Scope = FxHashMap<String, String>;

/// Parse `text` into its root element
///
/// Comments, processing instructions and the XML declaration are dropped.
/// Whitespace around the root element is ignored; any other content outside
/// of it is an error.
pub fn parse_document(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    let mut base = Scope::default();
    base.insert("xml".to_string(), XML_NS.to_string());

    let mut stack: Vec<(Element, Scope)> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| StanzaError::parse(text, e))?;
        match event {
            Event::Start(start) => {
                let parent_scope = stack.last().map_or(&base, |(_, scope)| scope);
                let (element, scope) = open_element(text, &start, parent_scope)?;
                attach(text, &stack, &mut root, &element)?;
                stack.push((element, scope));
            }
            Event::Empty(start) => {
                let parent_scope = stack.last().map_or(&base, |(_, scope)| scope);
                let (element, _) = open_element(text, &start, parent_scope)?;
                attach(text, &stack, &mut root, &element)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(|e| StanzaError::parse(text, e))?;
                append_text(text, &stack, &content)?;
            }
            Event::CData(content) => {
                let content = String::from_utf8_lossy(&content.into_inner()).into_owned();
                append_text(text, &stack, &content)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some((open, _)) = stack.last() {
        return Err(StanzaError::parse(
            text,
            format!("unclosed element <{}>", open.name()),
        ));
    }

    root.ok_or_else(|| StanzaError::parse(text, "no root element"))
}

fn open_element(text: &str, start: &BytesStart<'_>, parent_scope: &Scope) -> Result<(Element, Scope)> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut scope = parent_scope.clone();
    let mut attrs = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| StanzaError::parse(text, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| StanzaError::parse(text, e))?
            .into_owned();

        if key == "xmlns" {
            scope.insert(String::new(), value.clone());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value.clone());
        }
        attrs.push((key, value));
    }

    let prefix = name.split_once(':').map_or("", |(prefix, _)| prefix);
    let namespace = scope
        .get(prefix)
        .map(String::as_str)
        .filter(|ns| !ns.is_empty());
    if !prefix.is_empty() && namespace.is_none() {
        return Err(StanzaError::parse(
            text,
            format!("unbound namespace prefix '{prefix}' on <{name}>"),
        ));
    }

    let element = Element::new(name.as_str(), namespace);
    for (key, value) in attrs {
        element.set_attr(&key, value);
    }
    Ok((element, scope))
}

fn attach(
    text: &str,
    stack: &[(Element, Scope)],
    root: &mut Option<Element>,
    element: &Element,
) -> Result<()> {
    match stack.last() {
        Some((parent, _)) => parent.append_child(element),
        None if root.is_some() => {
            return Err(StanzaError::parse(text, "more than one root element"));
        }
        None => *root = Some(element.clone()),
    }
    Ok(())
}

fn append_text(text: &str, stack: &[(Element, Scope)], content: &str) -> Result<()> {
    match stack.last() {
        Some((parent, _)) => parent.append_text(content),
        None if content.trim().is_empty() => {}
        None => return Err(StanzaError::parse(text, "text outside of the root element")),
    }
    Ok(())
}
