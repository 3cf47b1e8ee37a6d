//! Centralized constants for the wayfinder crate
//!
//! Endpoints, timeouts and the literal fallback location live here so that
//! providers, config defaults and the resolver agree on them.

/// External API endpoints
pub mod api {
    /// Open-Meteo forward geocoding (place name search)
    pub const OPEN_METEO_SEARCH_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

    /// Open-Meteo reverse geocoding (coarse backup)
    pub const OPEN_METEO_REVERSE_URL: &str = "https://geocoding-api.open-meteo.com/v1/reverse";

    /// OpenStreetMap Nominatim reverse geocoding (detailed address)
    pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

    /// ipapi.co caller lookup
    pub const IPAPI_CO_URL: &str = "https://ipapi.co/json";

    /// ipinfo.io caller lookup
    pub const IPINFO_URL: &str = "https://ipinfo.io/json";

    /// ipwho.is caller lookup
    pub const IPWHOIS_URL: &str = "https://ipwho.is";

    /// ip-api.com caller lookup (plain HTTP on the free tier)
    pub const IP_API_URL: &str = "http://ip-api.com/json";
}

/// Per-call network budgets, in seconds
pub mod timeouts {
    pub const FORWARD_SECS: u64 = 20;
    pub const REVERSE_SECS: u64 = 12;
    pub const IP_SECS: u64 = 10;
}

/// The location used when every dynamic signal fails
pub mod fallback {
    pub const CITY: &str = "Karachi";
    pub const REGION: &str = "Sindh";
    pub const COUNTRY: &str = "Pakistan";
    pub const LAT: f64 = 24.8607;
    pub const LON: f64 = 67.0011;
    pub const TIME_ZONE: &str = "Asia/Karachi";
}

/// Environment variables that override the forced-location config values
pub mod env {
    pub const FORCE_CITY: &str = "FORCE_CITY";
    pub const FORCE_COORDS: &str = "FORCE_COORDS";
}
