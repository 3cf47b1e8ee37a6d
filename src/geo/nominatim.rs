//! Nominatim reverse geocoding backend (OpenStreetMap)
//!
//! The detailed-address reverse geocoder, consulted before Open-Meteo.
//! Nominatim requires an identifying User-Agent.

use crate::config::ProvidersConfig;
use crate::constants::api::NOMINATIM_REVERSE_URL;
use crate::error::Result;
use crate::geo::http::{build_client, get_json};
use crate::geo::{non_empty, GeoHit, GeoProvider, Place, ProviderQuery, QueryKind};
use async_trait::async_trait;
use serde::Deserialize;

/// Nominatim reverse geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimReverse {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim reverse response; unknown points come back as `{"error": ...}`
#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

impl NominatimResponse {
    /// Settlement name falls back through progressively coarser address parts
    fn into_hit(self) -> Option<GeoHit> {
        let address = self.address.unwrap_or_default();
        let place = Place {
            name: [
                address.city,
                address.town,
                address.village,
                address.municipality,
                address.county,
            ]
            .into_iter()
            .find_map(non_empty),
            region: non_empty(address.state).or_else(|| non_empty(address.region)),
            country: non_empty(address.country),
            time_zone: None,
        };

        if place.is_blank() {
            None
        } else {
            Some(GeoHit {
                place,
                coordinates: None,
            })
        }
    }
}

impl NominatimReverse {
    pub const NAME: &'static str = "nominatim";

    /// Create a new Nominatim backend
    pub fn new(config: &ProvidersConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.reverse_timeout_secs)?,
            base_url: NOMINATIM_REVERSE_URL.to_string(),
        })
    }
}

#[async_trait]
impl GeoProvider for NominatimReverse {
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
            "{}?format=json&lat={}&lon={}&zoom=10&addressdetails=1",
            self.base_url, coords.lat, coords.lon
        );
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en");

        let response: NominatimResponse = get_json(Self::NAME, request).await?;
        Ok(response.into_hit())
    }
}
