//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/wayfinder/config.toml
//!
//! The forced-location values can also come from the `FORCE_CITY` and
//! `FORCE_COORDS` environment variables, which win over the file.

pub mod defaults;

use crate::constants::env;
use crate::error::{Error, Result};
use crate::resolve::FillPolicy;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolution chain settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Provider network settings
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Map URL settings
    #[serde(default)]
    pub url: UrlConfig,
}

/// Resolution chain settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Forced city name; empty means unset
    #[serde(default)]
    pub forced_city: String,

    /// Forced "lat,lon" pair; empty means unset
    #[serde(default)]
    pub forced_coords: String,

    /// City geocoded by the hard fallback step
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Fill missing country/time zone on coordinate-based results
    #[serde(default = "default_true")]
    pub fill_defaults: bool,

    #[serde(default = "default_fill_country")]
    pub fill_country: String,

    #[serde(default = "default_fill_time_zone")]
    pub fill_time_zone: String,

    /// Reverse-geocode fields win over the IP provider's own fields
    #[serde(default = "default_true")]
    pub ip_prefer_reverse: bool,
}

/// Provider network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,

    #[serde(default = "default_reverse_timeout")]
    pub reverse_timeout_secs: u64,

    #[serde(default = "default_ip_timeout")]
    pub ip_timeout_secs: u64,

    /// IP-location services, tried in order
    #[serde(default = "default_ip_providers")]
    pub ip_providers: Vec<String>,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Sessions idle this long are dropped; 0 keeps them until deleted
    #[serde(default = "default_session_idle")]
    pub session_idle_secs: u64,
}

/// Map URL settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlConfig {
    /// Default URL provider
    #[serde(default = "default_url_provider")]
    pub default: String,

    /// URL provider templates
    #[serde(default = "default_url_providers")]
    pub providers: HashMap<String, String>,
}

// Default value functions for serde
fn default_true() -> bool {
    true
}
fn default_city() -> String {
    DEFAULT_CITY.to_string()
}
fn default_fill_country() -> String {
    DEFAULT_FILL_COUNTRY.to_string()
}
fn default_fill_time_zone() -> String {
    DEFAULT_FILL_TIME_ZONE.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_forward_timeout() -> u64 {
    DEFAULT_FORWARD_TIMEOUT_SECS
}
fn default_reverse_timeout() -> u64 {
    DEFAULT_REVERSE_TIMEOUT_SECS
}
fn default_ip_timeout() -> u64 {
    DEFAULT_IP_TIMEOUT_SECS
}
fn default_ip_providers() -> Vec<String> {
    DEFAULT_IP_PROVIDERS.iter().map(|s| s.to_string()).collect()
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_session_idle() -> u64 {
    DEFAULT_SESSION_IDLE_SECS
}
fn default_url_provider() -> String {
    DEFAULT_URL_PROVIDER.to_string()
}
fn default_url_providers() -> HashMap<String, String> {
    let mut providers = HashMap::new();
    providers.insert(
        "google".to_string(),
        "https://www.google.com/maps/@{lat},{lon},12z".to_string(),
    );
    providers.insert(
        "openstreetmap".to_string(),
        "https://www.openstreetmap.org/#map=11/{lat}/{lon}".to_string(),
    );
    providers.insert(
        "apple".to_string(),
        "https://maps.apple.com/?ll={lat},{lon}".to_string(),
    );
    providers
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            forced_city: String::new(),
            forced_coords: String::new(),
            default_city: default_city(),
            fill_defaults: true,
            fill_country: default_fill_country(),
            fill_time_zone: default_fill_time_zone(),
            ip_prefer_reverse: true,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            forward_timeout_secs: default_forward_timeout(),
            reverse_timeout_secs: default_reverse_timeout(),
            ip_timeout_secs: default_ip_timeout(),
            ip_providers: default_ip_providers(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_secs: default_session_idle(),
        }
    }
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            default: default_url_provider(),
            providers: default_url_providers(),
        }
    }
}

impl ResolverConfig {
    /// Forced city, if set to something non-blank
    pub fn forced_city(&self) -> Option<&str> {
        non_blank(&self.forced_city)
    }

    /// Forced coordinate string, if set to something non-blank
    pub fn forced_coords(&self) -> Option<&str> {
        non_blank(&self.forced_coords)
    }

    /// How missing fields are filled on coordinate-based results
    pub fn fill_policy(&self) -> FillPolicy {
        FillPolicy {
            fill_defaults: self.fill_defaults,
            country: self.fill_country.clone(),
            time_zone: self.fill_time_zone.clone(),
            ip_prefer_reverse: self.ip_prefer_reverse,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from the default path, then apply environment overrides
    pub fn load_effective() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            let config: Config = toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Check the values `set` would reject, for configs read from a file
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("providers.forward_timeout_secs", self.providers.forward_timeout_secs),
            ("providers.reverse_timeout_secs", self.providers.reverse_timeout_secs),
            ("providers.ip_timeout_secs", self.providers.ip_timeout_secs),
        ];
        for (key, secs) in timeouts {
            if secs == 0 {
                return Err(Error::Config(format!("{} must be positive", key)));
            }
        }

        check_ip_providers(&self.providers.ip_providers)
    }

    /// Apply `FORCE_CITY` / `FORCE_COORDS` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(env::FORCE_CITY).ok(),
            std::env::var(env::FORCE_COORDS).ok(),
        );
    }

    /// Apply forced-location overrides; `None` leaves the current value alone
    pub fn apply_overrides(&mut self, forced_city: Option<String>, forced_coords: Option<String>) {
        if let Some(city) = forced_city {
            self.resolver.forced_city = city;
        }
        if let Some(coords) = forced_coords {
            self.resolver.forced_coords = coords;
        }
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["resolver", "forced_city"] => Some(self.resolver.forced_city.clone()),
            ["resolver", "forced_coords"] => Some(self.resolver.forced_coords.clone()),
            ["resolver", "default_city"] => Some(self.resolver.default_city.clone()),
            ["resolver", "fill_defaults"] => Some(self.resolver.fill_defaults.to_string()),
            ["resolver", "fill_country"] => Some(self.resolver.fill_country.clone()),
            ["resolver", "fill_time_zone"] => Some(self.resolver.fill_time_zone.clone()),
            ["resolver", "ip_prefer_reverse"] => Some(self.resolver.ip_prefer_reverse.to_string()),

            ["providers", "user_agent"] => Some(self.providers.user_agent.clone()),
            ["providers", "forward_timeout_secs"] => {
                Some(self.providers.forward_timeout_secs.to_string())
            }
            ["providers", "reverse_timeout_secs"] => {
                Some(self.providers.reverse_timeout_secs.to_string())
            }
            ["providers", "ip_timeout_secs"] => Some(self.providers.ip_timeout_secs.to_string()),
            ["providers", "ip_providers"] => Some(self.providers.ip_providers.join(",")),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),
            ["server", "session_idle_secs"] => Some(self.server.session_idle_secs.to_string()),

            ["url", "default"] => Some(self.url.default.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["resolver", "forced_city"] => {
                self.resolver.forced_city = value.to_string();
            }
            ["resolver", "forced_coords"] => {
                self.resolver.forced_coords = value.to_string();
            }
            ["resolver", "default_city"] => {
                self.resolver.default_city = value.to_string();
            }
            ["resolver", "fill_defaults"] => {
                self.resolver.fill_defaults = parse_bool(value)?;
            }
            ["resolver", "fill_country"] => {
                self.resolver.fill_country = value.to_string();
            }
            ["resolver", "fill_time_zone"] => {
                self.resolver.fill_time_zone = value.to_string();
            }
            ["resolver", "ip_prefer_reverse"] => {
                self.resolver.ip_prefer_reverse = parse_bool(value)?;
            }

            ["providers", "user_agent"] => {
                self.providers.user_agent = value.to_string();
            }
            ["providers", "forward_timeout_secs"] => {
                self.providers.forward_timeout_secs = parse_timeout(value)?;
            }
            ["providers", "reverse_timeout_secs"] => {
                self.providers.reverse_timeout_secs = parse_timeout(value)?;
            }
            ["providers", "ip_timeout_secs"] => {
                self.providers.ip_timeout_secs = parse_timeout(value)?;
            }
            ["providers", "ip_providers"] => {
                let names: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                check_ip_providers(&names)?;
                self.providers.ip_providers = names;
            }

            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "port"] => {
                self.server.port = value.parse().map_err(|_| {
                    Error::Config(format!("Invalid port value: {}", value))
                })?;
            }

            ["server", "session_idle_secs"] => {
                self.server.session_idle_secs = value.parse().map_err(|_| {
                    Error::Config(format!("Invalid session idle value: {}", value))
                })?;
            }

            ["url", "default"] => {
                self.url.default = value.to_string();
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "resolver.forced_city",
            "resolver.forced_coords",
            "resolver.default_city",
            "resolver.fill_defaults",
            "resolver.fill_country",
            "resolver.fill_time_zone",
            "resolver.ip_prefer_reverse",
            "providers.user_agent",
            "providers.forward_timeout_secs",
            "providers.reverse_timeout_secs",
            "providers.ip_timeout_secs",
            "providers.ip_providers",
            "server.host",
            "server.port",
            "server.session_idle_secs",
            "url.default",
        ]
    }

    /// Format a map URL using the specified provider
    ///
    /// Replaces {lat} and {lon} placeholders with actual values
    pub fn format_url(&self, provider: Option<&str>, lat: f64, lon: f64) -> Result<String> {
        let provider_name = provider.unwrap_or(&self.url.default);

        let template = self.url.providers.get(provider_name).ok_or_else(|| {
            Error::Config(format!("Unknown URL provider: {}", provider_name))
        })?;

        Ok(template
            .replace("{lat}", &lat.to_string())
            .replace("{lon}", &lon.to_string()))
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn check_ip_providers(names: &[String]) -> Result<()> {
    let known = crate::geo::ip_location::available_ip_providers();
    match names.iter().find(|n| !known.iter().any(|k| k.name == n.as_str())) {
        Some(unknown) => Err(Error::Config(format!("Unknown IP provider: {}", unknown))),
        None => Ok(()),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid boolean value: {}", value)))
}

/// Timeouts must be positive so every provider call stays bounded
fn parse_timeout(value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(Error::Config(format!("Invalid timeout value: {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.resolver.default_city, "Karachi");
        assert!(config.resolver.fill_defaults);
        assert!(config.resolver.forced_city().is_none());
        assert_eq!(
            config.providers.ip_providers,
            vec!["ipapi.co", "ipinfo.io", "ipwho.is"]
        );
        assert_eq!(config.providers.ip_timeout_secs, 10);
        assert_eq!(config.server.port, 7879);
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        assert_eq!(config.get("resolver.default_city"), Some("Karachi".to_string()));

        config.set("resolver.forced_city", "Dubai").unwrap();
        assert_eq!(config.resolver.forced_city(), Some("Dubai"));

        config.set("resolver.fill_defaults", "false").unwrap();
        assert!(!config.resolver.fill_defaults);

        config.set("providers.ip_providers", "ipwho.is, ip-api.com").unwrap();
        assert_eq!(config.get("providers.ip_providers"), Some("ipwho.is,ip-api.com".to_string()));
    }

    #[test]
    fn test_set_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("invalid.key", "value").is_err());
        assert!(config.set("resolver.fill_defaults", "maybe").is_err());
        assert!(config.set("providers.ip_timeout_secs", "0").is_err());
        assert!(config.set("providers.ip_providers", "ipapi.co,made-up").is_err());
        assert_eq!(config.providers.ip_providers.len(), 3);
    }

    #[test]
    fn test_blank_forced_values_are_unset() {
        let mut config = Config::default();
        config.resolver.forced_coords = "   ".to_string();
        assert!(config.resolver.forced_coords().is_none());

        config.resolver.forced_coords = " 25.2,55.3 ".to_string();
        assert_eq!(config.resolver.forced_coords(), Some("25.2,55.3"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.resolver.forced_city = "Lahore".to_string();

        config.apply_overrides(None, Some("1,2".to_string()));
        assert_eq!(config.resolver.forced_city(), Some("Lahore"));
        assert_eq!(config.resolver.forced_coords(), Some("1,2"));

        config.apply_overrides(Some(String::new()), None);
        assert!(config.resolver.forced_city().is_none());
    }

    #[test]
    fn test_fill_policy_from_config() {
        let mut config = Config::default();
        config.resolver.ip_prefer_reverse = false;
        let policy = config.resolver.fill_policy();

        assert!(policy.fill_defaults);
        assert!(!policy.ip_prefer_reverse);
        assert_eq!(policy.country, "Pakistan");
        assert_eq!(policy.time_zone, "Asia/Karachi");
    }

    #[test]
    fn test_format_url() {
        let config = Config::default();

        let url = config.format_url(Some("google"), 24.8607, 67.0011).unwrap();
        assert_eq!(url, "https://www.google.com/maps/@24.8607,67.0011,12z");

        let url = config.format_url(None, 24.8607, 67.0011).unwrap();
        assert!(url.contains("openstreetmap.org"));

        assert!(config.format_url(Some("unknown"), 0.0, 0.0).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wayfinder").join("config.toml");

        let mut config = Config::default();
        config.resolver.forced_coords = "25.2048,55.2708".to_string();
        config.providers.ip_providers = vec!["ipwho.is".to_string()];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.resolver.forced_coords(), Some("25.2048,55.2708"));
        assert_eq!(loaded.providers.ip_providers, vec!["ipwho.is"]);
    }

    #[test]
    fn test_load_rejects_zero_timeout_in_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[providers]\nip_timeout_secs = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("providers.ip_timeout_secs"));
    }

    #[test]
    fn test_load_rejects_unknown_ip_provider_in_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[providers]\nip_providers = [\"ipwho.is\", \"made-up\"]\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_session_idle_key() {
        let mut config = Config::default();
        assert_eq!(config.get("server.session_idle_secs"), Some("3600".to_string()));

        config.set("server.session_idle_secs", "0").unwrap();
        assert_eq!(config.server.session_idle_secs, 0);
        assert!(config.set("server.session_idle_secs", "-1").is_err());
    }

    #[test]
    fn test_load_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.resolver.default_city, "Karachi");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: Config = toml::from_str("[resolver]\nforced_city = \"Dubai\"\n").unwrap();
        assert_eq!(loaded.resolver.forced_city(), Some("Dubai"));
        assert_eq!(loaded.resolver.default_city, "Karachi");
        assert!(loaded.resolver.ip_prefer_reverse);
        assert_eq!(loaded.server.port, 7879);
    }

    #[test]
    fn test_serialization_format() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();

        assert!(toml.contains("[resolver]"));
        assert!(toml.contains("[providers]"));
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[url.providers]"));
    }

    #[test]
    fn test_available_keys_are_gettable() {
        let config = Config::default();
        for key in Config::available_keys() {
            assert!(config.get(key).is_some(), "missing getter for {}", key);
        }
    }
}
