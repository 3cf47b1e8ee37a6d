//! JSON output formatter

use crate::config::Config;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::resolve::Resolution;
use serde::Serialize;

/// JSON formatter - outputs the resolution as pretty-printed JSON
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    resolution: &'a Resolution,
    accuracy_disclaimer: bool,
}

impl OutputFormatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Full JSON resolution"
    }

    fn format(&self, resolution: &Resolution, _config: &Config) -> Result<String> {
        let output = JsonOutput {
            resolution,
            accuracy_disclaimer: resolution.location.needs_accuracy_disclaimer(),
        };
        Ok(serde_json::to_string_pretty(&output)?)
    }
}
