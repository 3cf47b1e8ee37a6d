//! URL output formatter

use crate::config::Config;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::resolve::Resolution;

/// URL formatter - outputs a map URL for the resolved coordinates
pub struct UrlFormatter;

impl UrlFormatter {
    /// Format URL with optional provider override
    pub fn format_with_provider(
        &self,
        resolution: &Resolution,
        config: &Config,
        provider: Option<&str>,
    ) -> Result<String> {
        let coords = resolution.location.coordinates;
        config.format_url(provider, coords.lat, coords.lon)
    }
}

impl OutputFormatter for UrlFormatter {
    fn name(&self) -> &str {
        "url"
    }

    fn description(&self) -> &str {
        "Map URL for the resolved coordinates"
    }

    fn format(&self, resolution: &Resolution, config: &Config) -> Result<String> {
        self.format_with_provider(resolution, config, None)
    }
}
