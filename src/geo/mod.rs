//! Geocoding module
//!
//! Provides the `GeoProvider` family: forward geocoding (place name to
//! coordinates), reverse geocoding (coordinates to place) and IP geolocation.
//! Every backend is one type implementing `GeoProvider` and owns the adapter
//! from its response shape into a `GeoHit`.

pub mod http;
pub mod ip_location;
pub mod nominatim;
pub mod open_meteo;
pub mod reverse;

use crate::config::ProvidersConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use reverse::ReverseChain;

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Validate that coordinates are finite and within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lon
            )));
        }
        Ok(())
    }

    /// Build coordinates from optional parts, keeping them only if valid
    pub fn checked(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        let coords = Self::new(lat?, lon?);
        coords.validate().ok().map(|_| coords)
    }

    /// Parse a "lat,lon" pair: exactly two comma-separated floats
    pub fn parse_pair(input: &str) -> Result<Self> {
        let parse_err = |reason: &str| Error::CoordinateParse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = input.split(',').map(str::trim).collect();
        let [lat, lon] = fields.as_slice() else {
            return Err(parse_err(&format!(
                "expected 2 comma-separated fields, found {}",
                fields.len()
            )));
        };

        let lat: f64 = lat
            .parse()
            .map_err(|_| parse_err(&format!("latitude '{}' is not a number", lat)))?;
        let lon: f64 = lon
            .parse()
            .map_err(|_| parse_err(&format!("longitude '{}' is not a number", lon)))?;

        let coords = Self::new(lat, lon);
        coords
            .validate()
            .map_err(|e| parse_err(&e.to_string()))?;
        Ok(coords)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Administrative metadata for a location; any subset may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Settlement name
    pub name: Option<String>,
    /// First-level administrative division
    pub region: Option<String>,
    pub country: Option<String>,
    /// IANA time zone identifier
    pub time_zone: Option<String>,
}

impl Place {
    /// True when none of name, region or country is known
    ///
    /// Time zone alone does not make a place usable for display.
    pub fn is_blank(&self) -> bool {
        self.name.is_none() && self.region.is_none() && self.country.is_none()
    }

    /// Trim every field and drop the empty ones, so a blank string falls
    /// through to the next source exactly like a missing one
    pub fn normalized(self) -> Self {
        Self {
            name: non_empty(self.name),
            region: non_empty(self.region),
            country: non_empty(self.country),
            time_zone: non_empty(self.time_zone),
        }
    }
}

/// Trim a provider string, keeping it only if something is left
pub fn non_empty(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// What a single provider returns for a successful lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoHit {
    pub place: Place,
    pub coordinates: Option<Coordinates>,
}

/// The shape of query a provider accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Place,
    Coords,
    CallerAddress,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Place => "place-name",
            QueryKind::Coords => "coordinate",
            QueryKind::CallerAddress => "caller-address",
        }
    }
}

/// A query to a provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderQuery {
    /// Free-text place name (forward geocoding)
    Place(String),
    /// Latitude/longitude pair (reverse geocoding)
    Coords(Coordinates),
    /// The caller's own network address (IP geolocation takes no input)
    CallerAddress,
}

impl ProviderQuery {
    pub fn place(name: impl Into<String>) -> Self {
        ProviderQuery::Place(name.into())
    }

    pub fn coords(coords: Coordinates) -> Self {
        ProviderQuery::Coords(coords)
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            ProviderQuery::Place(_) => QueryKind::Place,
            ProviderQuery::Coords(_) => QueryKind::Coords,
            ProviderQuery::CallerAddress => QueryKind::CallerAddress,
        }
    }
}

/// Trait for geocoding and IP-location backends
///
/// `Ok(None)` means the call succeeded but found nothing. Network, status and
/// payload failures are `Err`. Passing a query of the wrong shape is a caller
/// error and yields `Error::QueryShape`.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Provider identity, attached to the source tag when it wins
    fn name(&self) -> &'static str;

    /// The single query shape this provider accepts
    fn accepts(&self) -> QueryKind;

    /// Look up a query
    async fn lookup(&self, query: &ProviderQuery) -> Result<Option<GeoHit>>;

    /// Reject a query whose shape this provider does not accept
    fn check_shape(&self, query: &ProviderQuery) -> Result<()> {
        if query.kind() == self.accepts() {
            Ok(())
        } else {
            Err(Error::QueryShape {
                provider: self.name(),
                expected: self.accepts().as_str(),
                got: query.kind().as_str(),
            })
        }
    }
}

/// Shared handle to any provider
pub type SharedProvider = Arc<dyn GeoProvider>;

/// The full set of providers a resolver consults
#[derive(Clone)]
pub struct ProviderSet {
    pub forward: SharedProvider,
    pub reverse: ReverseChain,
    pub ip: Vec<SharedProvider>,
}

impl ProviderSet {
    /// Build the network-backed provider set described by the config
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let forward: SharedProvider = Arc::new(open_meteo::OpenMeteoSearch::new(config)?);
        let nominatim: SharedProvider = Arc::new(nominatim::NominatimReverse::new(config)?);
        let open_meteo: SharedProvider = Arc::new(open_meteo::OpenMeteoReverse::new(config)?);
        let reverse = ReverseChain::new(vec![nominatim, open_meteo]);
        let ip = config
            .ip_providers
            .iter()
            .map(|name| ip_location::get_ip_provider(name, config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { forward, reverse, ip })
    }

    /// Names of the configured providers, in consultation order
    pub fn describe(&self) -> ProviderNames {
        ProviderNames {
            forward: self.forward.name().to_string(),
            reverse: self.reverse.names(),
            ip: self.ip.iter().map(|p| p.name().to_string()).collect(),
        }
    }
}

/// Provider names, as reported by the CLI and HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderNames {
    pub forward: String,
    pub reverse: Vec<String>,
    pub ip: Vec<String>,
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory providers for resolver and chain tests

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// What a scripted provider does when called
    #[derive(Debug, Clone)]
    pub enum Script {
        Hit(GeoHit),
        Miss,
        Fail,
    }

    /// A provider that replays a fixed answer and counts its invocations
    pub struct ScriptedProvider {
        name: &'static str,
        kind: QueryKind,
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        pub fn new(name: &'static str, kind: QueryKind, script: Script) -> Arc<Self> {
            Arc::new(Self {
                name,
                kind,
                script,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn accepts(&self) -> QueryKind {
            self.kind
        }

        async fn lookup(&self, query: &ProviderQuery) -> Result<Option<GeoHit>> {
            self.check_shape(query)?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Hit(hit) => Ok(Some(hit.clone())),
                Script::Miss => Ok(None),
                Script::Fail => Err(Error::provider(self.name, "scripted failure")),
            }
        }
    }

    pub fn place(name: Option<&str>, region: Option<&str>, country: Option<&str>, tz: Option<&str>) -> Place {
        Place {
            name: name.map(String::from),
            region: region.map(String::from),
            country: country.map(String::from),
            time_zone: tz.map(String::from),
        }
    }

    pub fn hit(place: Place, coords: Option<(f64, f64)>) -> GeoHit {
        GeoHit {
            place,
            coordinates: coords.map(|(lat, lon)| Coordinates::new(lat, lon)),
        }
    }
}
