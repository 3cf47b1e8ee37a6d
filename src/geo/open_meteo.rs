//! Open-Meteo geocoding backends
//!
//! `OpenMeteoSearch` is the forward geocoder; `OpenMeteoReverse` is the
//! coarse reverse geocoder used after Nominatim.

use crate::config::ProvidersConfig;
use crate::constants::api::{OPEN_METEO_REVERSE_URL, OPEN_METEO_SEARCH_URL};
use crate::error::Result;
use crate::geo::http::{build_client, get_json};
use crate::geo::{Coordinates, GeoHit, GeoProvider, Place, ProviderQuery, QueryKind};
use async_trait::async_trait;
use serde::Deserialize;

/// Response envelope shared by search and reverse
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    results: Option<Vec<OpenMeteoResult>>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResult {
    name: Option<String>,
    admin1: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
}

impl OpenMeteoResponse {
    /// Adapt the first result, if any
    fn into_hit(self) -> Option<GeoHit> {
        let first = self.results?.into_iter().next()?;
        Some(GeoHit {
            coordinates: Coordinates::checked(first.latitude, first.longitude),
            place: Place {
                name: first.name,
                region: first.admin1,
                country: first.country,
                time_zone: first.timezone,
            }
            .normalized(),
        })
    }
}

/// Forward geocoder: place name to coordinates
#[derive(Debug, Clone)]
pub struct OpenMeteoSearch {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoSearch {
    pub const NAME: &'static str = "open-meteo";

    pub fn new(config: &ProvidersConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.forward_timeout_secs)?,
            base_url: OPEN_METEO_SEARCH_URL.to_string(),
        })
    }
}

#[async_trait]
impl GeoProvider for OpenMeteoSearch {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn accepts(&self) -> QueryKind {
        QueryKind::Place
    }

    async fn lookup(&self, query: &ProviderQuery) -> Result<Option<GeoHit>> {
        self.check_shape(query)?;
        let ProviderQuery::Place(name) = query else {
            return Ok(None);
        };

        let url = format!(
            "{}?name={}&count=1&language=en&format=json",
            self.base_url,
            urlencoding::encode(name.trim())
        );
        let response: OpenMeteoResponse = get_json(Self::NAME, self.client.get(&url)).await?;
        Ok(response.into_hit())
    }
}

/// Coarse reverse geocoder
#[derive(Debug, Clone)]
pub struct OpenMeteoReverse {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoReverse {
    pub const NAME: &'static str = "open-meteo-reverse";

    pub fn new(config: &ProvidersConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.reverse_timeout_secs)?,
            base_url: OPEN_METEO_REVERSE_URL.to_string(),
        })
    }
}

#[async_trait]
impl GeoProvider for OpenMeteoReverse {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn accepts(&self) -> QueryKind {
        QueryKind::Coords
    }

    async fn lookup(&self, query: &ProviderQuery) -> Result<Option<GeoHit>> {
        self.check_shape(query)?;
        let ProviderQuery::Coords(coords) = query else {
            return Ok(None);
        };

        let url = format!(
            "{}?latitude={}&longitude={}&language=en&format=json",
            self.base_url, coords.lat, coords.lon
        );
        let response: OpenMeteoResponse = get_json(Self::NAME, self.client.get(&url)).await?;
        Ok(response.into_hit())
    }
}
