//! Default configuration values
//!
//! Named constants for all tunable parameters

use crate::constants::{fallback, timeouts};

/// City geocoded by the hard fallback step
pub const DEFAULT_CITY: &str = fallback::CITY;

/// Country filled in when a coordinate-based result has none
pub const DEFAULT_FILL_COUNTRY: &str = fallback::COUNTRY;

/// Time zone filled in when a coordinate-based result has none
pub const DEFAULT_FILL_TIME_ZONE: &str = fallback::TIME_ZONE;

/// IP-location services, in the order they are tried
pub const DEFAULT_IP_PROVIDERS: &[&str] = &["ipapi.co", "ipinfo.io", "ipwho.is"];

/// User-Agent sent with every provider request
pub const DEFAULT_USER_AGENT: &str = concat!("wayfinder/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = timeouts::FORWARD_SECS;
pub const DEFAULT_REVERSE_TIMEOUT_SECS: u64 = timeouts::REVERSE_SECS;
pub const DEFAULT_IP_TIMEOUT_SECS: u64 = timeouts::IP_SECS;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7879;

/// Sessions idle for an hour are dropped
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

/// Default map URL provider
pub const DEFAULT_URL_PROVIDER: &str = "openstreetmap";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "wayfinder";
