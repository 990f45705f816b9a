//! Qualified element names.

use std::fmt;
use std::str::FromStr;

use crate::error::StanzaError;

/// A (namespace, local name) pair identifying one schema
///
/// The textual form is `namespace|element`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: String,
    element: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            element: element.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.namespace, self.element)
    }
}

impl FromStr for QName {
    type Err = StanzaError;

    /// Parse `namespace|element`. Namespaces may themselves contain `|`, so
    /// the split happens at the last separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('|') {
            Some((namespace, element)) if !element.is_empty() => Ok(Self::new(namespace, element)),
            _ => Err(StanzaError::parse(s, "expected a qualified name of the form 'namespace|element'")),
        }
    }
}

impl From<(&str, &str)> for QName {
    /// Build from `(namespace, element)`
    fn from((namespace, element): (&str, &str)) -> Self {
        Self::new(namespace, element)
    }
}
