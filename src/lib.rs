//! A declarative mapping layer between namespaced XML elements and typed
//! objects.
//!
//! Schemas are defined on a [`Registry`] as a qualified element name plus a
//! table of field descriptors. Instances ([`Stanza`]) read and write those
//! fields straight through to the underlying element, nest other schemas as
//! extensions, and project themselves to plain JSON data.

pub mod config;
pub mod dom;
pub mod error;
pub mod registry;
pub mod schema;
pub mod stanza;

// Re-export the most common types for easier use
pub use config::{DateFormatConfig, RegistryConfig};
pub use dom::{Element, Node, XML_NS, create_element, parse_document};
pub use error::{Result, StanzaError};
pub use registry::{DefinitionCallback, Plugin, Registry};
pub use schema::{
    FieldDescriptor, FieldKind, FieldValue, ParentContext, QName, Schema, SchemaClass, types,
};
pub use stanza::Stanza;
