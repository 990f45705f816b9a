//! Configuration for the stanza `Registry`.

use serde::{Deserialize, Serialize};

/// Date parsing configuration used by the date field descriptors
///
/// RFC 3339 timestamps are always tried first. The formats listed here are
/// the fallbacks for documents that carry plain dates or naive timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormatConfig {
    /// Naive date-time formats, interpreted as UTC
    pub datetime_formats: Vec<String>,
    /// Plain date formats, interpreted as midnight UTC
    pub date_formats: Vec<String>,
    /// Enable heuristic format detection
    pub enable_format_detection: bool,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            datetime_formats: vec![
                "%Y-%m-%dT%H:%M:%S%.f".to_string(), // 2023-01-15T10:20:30.000
                "%Y-%m-%dT%H:%M:%S".to_string(),    // 2023-01-15T10:20:30
                "%Y-%m-%d %H:%M:%S".to_string(),    // 2023-01-15 10:20:30
                "%Y%m%dT%H:%M:%S".to_string(),      // XEP-0082 legacy: 20230115T10:20:30
            ],
            date_formats: vec![
                "%Y-%m-%d".to_string(), // ISO format: 2023-01-15
                "%Y%m%d".to_string(),   // Compact: 20230115
            ],
            enable_format_detection: true,
        }
    }
}

/// Configuration for the `Registry`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Date format configuration for date field descriptors
    pub date_format_config: DateFormatConfig,
    /// Log a warning when `define` replaces an existing qualified name
    pub warn_on_redefinition: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            date_format_config: DateFormatConfig::default(),
            warn_on_redefinition: true,
        }
    }
}
