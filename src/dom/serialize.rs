//! Canonical text rendering of an element tree.

use std::fmt;

use quick_xml::escape::{escape, partial_escape};

use super::{Element, Node};

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        write!(f, "<{}", data.name)?;
        for (key, value) in &data.attrs {
            write!(f, " {}=\"{}\"", key, escape(value.as_str()))?;
        }
        if data.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for child in &data.children {
            match child {
                Node::Element(element) => write!(f, "{element}")?,
                Node::Text(text) => f.write_str(&partial_escape(text.as_str()))?,
            }
        }
        write!(f, "</{}>", data.name)
    }
}
