//! Macros for schema definitions
//!
//! This module provides a macro to reduce boilerplate when declaring schemas.

/// Macro to declare a schema with its field descriptors
///
/// Expands to a [`Schema`](crate::schema::Schema) builder. The descriptor
/// factories from `schema::types` are in scope inside `fields`.
///
/// # Example
///
/// ```rust
/// use stanza_map::{Registry, schema};
///
/// let registry = Registry::new();
/// let message = registry.define(schema! {
///     name: "message",
///     namespace: "jabber:client",
///     top_level: true,
///     tags: ["content"],
///     fields: {
///         "to" => attribute("to", None),
///         "body" => sub_text("jabber:client", "body"),
///     }
/// });
/// assert_eq!(message.element(), "message");
/// ```
#[macro_export]
macro_rules! schema {
    (
        name: $name:expr,
        namespace: $namespace:expr
        $(, element: $element:expr)?
        $(, top_level: $top_level:expr)?
        $(, event_name: $event_name:expr)?
        $(, tags: [$($tag:expr),* $(,)?])?
        $(, prefixes: { $($prefix:expr => $prefix_ns:expr),* $(,)? })?
        $(, fields: { $($field_name:expr => $descriptor:expr),* $(,)? })?
        $(,)?
    ) => {
        {
            #[allow(unused_imports)]
            use $crate::schema::types::*;

            let definition = $crate::schema::Schema::new($name, $namespace)
                $(.element($element))?
                $(.top_level($top_level))?
                $(.event_name($event_name))?
                $($(.tag($tag))*)?
                $($(.prefix($prefix, $prefix_ns))*)?
                $($(.field($field_name, $descriptor))*)?;
            definition
        }
    };
}
