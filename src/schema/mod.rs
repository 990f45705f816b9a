//! Schema definitions, registered schema classes and their field descriptors.

mod class;
mod definition;
pub mod field_def;
mod qname;

pub use class::{ParentContext, SchemaClass};
pub use definition::{InitHook, Schema};
pub use field_def::{
    FieldDescriptor, FieldKind, FieldValue, Getter, Probe, Setter, format_timestamp, helpers, types,
};
pub use qname::QName;
