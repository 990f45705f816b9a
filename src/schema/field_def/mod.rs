//! Field descriptors
//!
//! This module provides the descriptor type every schema field is built
//! from, the catalog of descriptor factories, and the element-level helper
//! functions the factories are written in terms of.

pub mod dates;
pub mod field;
pub mod helpers;
mod macros;
pub mod types;

pub use field::{FieldDescriptor, FieldKind, FieldValue, Getter, Probe, Setter, format_timestamp};
