//! Location resolution
//!
//! Turns whatever signals are available (a submitted search, forced
//! overrides, browser GPS, the caller's IP) into exactly one
//! `ResolvedLocation`. Strategies are consulted strictly in order and the
//! first one to produce a coordinate-bearing result wins; later strategies
//! make no network calls. Resolution never fails: the last step returns a
//! literal record when even the default-city geocode is unreachable.

pub mod fill;
pub mod strategies;

pub use fill::FillPolicy;
pub use strategies::Strategy;

use crate::config::{Config, ResolverConfig};
use crate::constants::fallback;
use crate::error::{Error, Result};
use crate::geo::{Coordinates, Place, ProviderSet};
use crate::session::SessionLocationStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Provenance of a resolved location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SourceTag {
    CitySearch,
    ForcedCoords,
    ForcedCity,
    /// Client-supplied coordinates, with the method that obtained them
    BrowserGps(String),
    /// IP geolocation, with the winning provider's name
    Ip(String),
    Fallback,
}

impl SourceTag {
    /// Whether the display layer should warn that the location is approximate
    pub fn needs_accuracy_disclaimer(&self) -> bool {
        matches!(self, SourceTag::Ip(_) | SourceTag::Fallback)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::CitySearch => write!(f, "city-search"),
            SourceTag::ForcedCoords => write!(f, "forced-coords"),
            SourceTag::ForcedCity => write!(f, "forced-city"),
            SourceTag::BrowserGps(method) => write!(f, "browser-gps:{}", method),
            SourceTag::Ip(provider) => write!(f, "ip:{}", provider),
            SourceTag::Fallback => write!(f, "fallback"),
        }
    }
}

impl FromStr for SourceTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "city-search" => Ok(SourceTag::CitySearch),
            "forced-coords" => Ok(SourceTag::ForcedCoords),
            "forced-city" => Ok(SourceTag::ForcedCity),
            "fallback" => Ok(SourceTag::Fallback),
            _ => {
                if let Some(method) = s.strip_prefix("browser-gps:") {
                    Ok(SourceTag::BrowserGps(method.to_string()))
                } else if let Some(provider) = s.strip_prefix("ip:") {
                    Ok(SourceTag::Ip(provider.to_string()))
                } else {
                    Err(Error::Config(format!("Unknown source tag: {}", s)))
                }
            }
        }
    }
}

impl From<SourceTag> for String {
    fn from(tag: SourceTag) -> Self {
        tag.to_string()
    }
}

impl TryFrom<String> for SourceTag {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// The canonical output of resolution
///
/// Display fields are only ever copied from providers (or the configured
/// fill values); coordinates are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub display_name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub coordinates: Coordinates,
    pub time_zone: Option<String>,
    pub source: SourceTag,
}

impl ResolvedLocation {
    pub fn from_place(place: Place, coordinates: Coordinates, source: SourceTag) -> Self {
        Self {
            display_name: place.name,
            region: place.region,
            country: place.country,
            coordinates,
            time_zone: place.time_zone,
            source,
        }
    }

    /// The hardcoded record returned when nothing else works
    pub fn fallback_literal() -> Self {
        Self {
            display_name: Some(fallback::CITY.to_string()),
            region: Some(fallback::REGION.to_string()),
            country: Some(fallback::COUNTRY.to_string()),
            coordinates: Coordinates::new(fallback::LAT, fallback::LON),
            time_zone: Some(fallback::TIME_ZONE.to_string()),
            source: SourceTag::Fallback,
        }
    }

    pub fn needs_accuracy_disclaimer(&self) -> bool {
        self.source.needs_accuracy_disclaimer()
    }
}

/// Coordinates reported by the client device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserCoordinates {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// How the client obtained the fix, e.g. "js-eval"
    #[serde(default = "default_browser_method")]
    pub method: String,
}

fn default_browser_method() -> String {
    "browser".to_string()
}

impl BrowserCoordinates {
    pub fn new(lat: f64, lon: f64, method: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            accuracy: None,
            method: method.into(),
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// The fix as coordinates, if it is in range
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::checked(Some(self.lat), Some(self.lon))
    }
}

/// Everything a single resolution may draw on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    /// Free text typed into the search box
    #[serde(default)]
    pub manual_search: Option<String>,
    /// The search was explicitly submitted this turn
    #[serde(default)]
    pub search_submitted: bool,
    #[serde(default)]
    pub forced_city: Option<String>,
    /// "lat,lon" as configured; parsed during resolution
    #[serde(default)]
    pub forced_coords: Option<String>,
    #[serde(default)]
    pub browser: Option<BrowserCoordinates>,
}

impl Signals {
    /// Signals carrying the configured forced overrides
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            forced_city: config.forced_city().map(String::from),
            forced_coords: config.forced_coords().map(String::from),
            ..Self::default()
        }
    }

    /// Record a submitted search
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.manual_search = Some(text.into());
        self.search_submitted = true;
        self
    }

    pub fn with_forced_city(mut self, city: impl Into<String>) -> Self {
        self.forced_city = Some(city.into());
        self
    }

    pub fn with_forced_coords(mut self, coords: impl Into<String>) -> Self {
        self.forced_coords = Some(coords.into());
        self
    }

    pub fn with_browser(mut self, browser: BrowserCoordinates) -> Self {
        self.browser = Some(browser);
        self
    }

    /// The submitted search text, if any
    pub fn submitted_search(&self) -> Option<&str> {
        if !self.search_submitted {
            return None;
        }
        non_blank(self.manual_search.as_deref())
    }

    pub fn forced_city(&self) -> Option<&str> {
        non_blank(self.forced_city.as_deref())
    }

    pub fn forced_coords(&self) -> Option<&str> {
        non_blank(self.forced_coords.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// A recoverable problem noticed while resolving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "input", rename_all = "snake_case")]
pub enum ResolveWarning {
    SearchNotFound(String),
    ForcedCoordsUnparsable(String),
    ForcedCityNotFound(String),
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::SearchNotFound(query) => {
                write!(f, "City '{}' not found; continuing with auto-detection", query)
            }
            ResolveWarning::ForcedCoordsUnparsable(input) => write!(
                f,
                "Could not parse forced coordinates '{}'. Expected 'lat,lon' (e.g. 25.2048,55.2708)",
                input
            ),
            ResolveWarning::ForcedCityNotFound(city) => write!(
                f,
                "Forced city '{}' not found via geocoder; falling back to auto-detect",
                city
            ),
        }
    }
}

/// A resolved location plus the warnings raised on the way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub location: ResolvedLocation,
    pub warnings: Vec<ResolveWarning>,
}

/// The ordered fallback resolver
pub struct LocationResolver {
    strategies: Vec<Box<dyn Strategy>>,
}

impl LocationResolver {
    /// Build the standard six-step chain over a provider set
    pub fn new(providers: ProviderSet, config: &ResolverConfig) -> Self {
        Self::with_strategies(strategies::standard_chain(
            providers,
            config.fill_policy(),
            &config.default_city,
        ))
    }

    /// Build the standard chain with network providers from the config
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = ProviderSet::from_config(&config.providers)?;
        Ok(Self::new(providers, &config.resolver))
    }

    /// Build a resolver over an explicit strategy list
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// Strategy names in precedence order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve the current location; never fails
    pub async fn resolve(&self, signals: &Signals) -> ResolvedLocation {
        self.resolve_with_report(signals).await.location
    }

    /// Resolve and also report the recoverable warnings raised
    pub async fn resolve_with_report(&self, signals: &Signals) -> Resolution {
        let mut warnings = Vec::new();

        for strategy in &self.strategies {
            if let Some(location) = strategy.try_resolve(signals, &mut warnings).await {
                info!(
                    "Resolved {} via {} ({})",
                    location.display_name.as_deref().unwrap_or("unnamed location"),
                    location.source,
                    location.coordinates
                );
                return Resolution { location, warnings };
            }
            debug!("Strategy {} produced nothing", strategy.name());
        }

        info!("No strategy produced a location; using the built-in fallback");
        Resolution {
            location: ResolvedLocation::fallback_literal(),
            warnings,
        }
    }

    /// Resolve and write the winner into a session store
    pub async fn resolve_into(
        &self,
        signals: &Signals,
        store: &mut SessionLocationStore,
    ) -> Resolution {
        let resolution = self.resolve_with_report(signals).await;
        store.set(resolution.location.clone());
        resolution
    }
}
