//! Human-readable text output formatter

use crate::config::Config;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::resolve::Resolution;

const UNKNOWN: &str = "unknown";

/// Text formatter - outputs human-readable summary
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format(&self, resolution: &Resolution, _config: &Config) -> Result<String> {
        let loc = &resolution.location;
        let mut output = String::new();

        // Header
        let headline: Vec<&str> = [&loc.display_name, &loc.region, &loc.country]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .collect();
        if headline.is_empty() {
            output.push_str("Unnamed location\n");
        } else {
            output.push_str(&format!("{}\n", headline.join(", ")));
        }

        output.push_str(&format!("Coordinates: {}\n", loc.coordinates));
        output.push_str(&format!(
            "Time zone: {}\n",
            loc.time_zone.as_deref().unwrap_or(UNKNOWN)
        ));
        output.push_str(&format!("Source: {}\n", loc.source));

        if loc.needs_accuracy_disclaimer() {
            output.push_str("Note: location is approximate; search for a city for better accuracy\n");
        }

        Ok(output)
    }
}
