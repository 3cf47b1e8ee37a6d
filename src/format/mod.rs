//! Output formatters
//!
//! Provides trait-based output formatting for resolution results.

pub mod json;
pub mod text;
pub mod url;

use crate::config::Config;
use crate::error::Result;
use crate::resolve::Resolution;
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format a resolution
    ///
    /// # Arguments
    /// * `resolution` - The resolved location and its warnings
    /// * `config` - Application config (for url providers, etc.)
    fn format(&self, resolution: &Resolution, config: &Config) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        "url" => Some(Box::new(url::UrlFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    vec![
        FormatInfo {
            name: "json".to_string(),
            description: "Full JSON resolution".to_string(),
        },
        FormatInfo {
            name: "text".to_string(),
            description: "Human-readable text".to_string(),
        },
        FormatInfo {
            name: "url".to_string(),
            description: "Map URL for the resolved coordinates".to_string(),
        },
    ]
}

#[cfg(test)]
pub(crate) fn sample_resolution(source: crate::resolve::SourceTag) -> Resolution {
    use crate::geo::Coordinates;
    use crate::resolve::ResolvedLocation;

    Resolution {
        location: ResolvedLocation {
            display_name: Some("Dubai".to_string()),
            region: Some("Dubai".to_string()),
            country: Some("United Arab Emirates".to_string()),
            coordinates: Coordinates::new(25.2048, 55.2708),
            time_zone: Some("Asia/Dubai".to_string()),
            source,
        },
        warnings: Vec::new(),
    }
}
