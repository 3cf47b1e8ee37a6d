//! IP-based geolocation
//!
//! Each service reports the caller's approximate position in its own JSON
//! shape; every adapter here turns that shape into a `GeoHit`. A response
//! only counts when it carries a valid coordinate pair.

use crate::config::ProvidersConfig;
use crate::constants::api::{IPAPI_CO_URL, IPINFO_URL, IPWHOIS_URL, IP_API_URL};
use crate::error::{Error, Result};
use crate::geo::http::{build_client, get_json};
use crate::geo::{
    non_empty, Coordinates, GeoHit, GeoProvider, Place, ProviderQuery, QueryKind, SharedProvider,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A response shape that can be adapted into a hit
pub trait IpResponse: DeserializeOwned + Send {
    fn into_hit(self) -> Option<GeoHit>;
}

/// ipapi.co response
#[derive(Debug, Deserialize)]
struct IpApiCoResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    country: Option<String>,
    timezone: Option<String>,
}

impl IpResponse for IpApiCoResponse {
    fn into_hit(self) -> Option<GeoHit> {
        let coordinates = Coordinates::checked(self.latitude, self.longitude)?;
        Some(GeoHit {
            coordinates: Some(coordinates),
            place: Place {
                name: self.city,
                region: self.region,
                country: non_empty(self.country_name).or(self.country),
                time_zone: self.timezone,
            }
            .normalized(),
        })
    }
}

/// ipinfo.io response; `loc` is a "lat,lon" string
#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    loc: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    timezone: Option<String>,
}

impl IpResponse for IpInfoResponse {
    fn into_hit(self) -> Option<GeoHit> {
        let coordinates = Coordinates::parse_pair(self.loc.as_deref()?).ok()?;
        Some(GeoHit {
            coordinates: Some(coordinates),
            place: Place {
                name: self.city,
                region: self.region,
                country: self.country,
                time_zone: self.timezone,
            }
            .normalized(),
        })
    }
}

/// ipwho.is reports the time zone either as a name or as a detail object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WhoIsTimeZone {
    Name(String),
    Detail { id: Option<String> },
}

/// ipwho.is response
#[derive(Debug, Deserialize)]
struct IpWhoIsResponse {
    success: Option<bool>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    timezone: Option<WhoIsTimeZone>,
}

impl IpResponse for IpWhoIsResponse {
    fn into_hit(self) -> Option<GeoHit> {
        if self.success == Some(false) {
            return None;
        }
        let coordinates = Coordinates::checked(self.latitude, self.longitude)?;
        let time_zone = match self.timezone {
            Some(WhoIsTimeZone::Name(name)) => Some(name),
            Some(WhoIsTimeZone::Detail { id }) => id,
            None => None,
        };
        Some(GeoHit {
            coordinates: Some(coordinates),
            place: Place {
                name: self.city,
                region: self.region,
                country: self.country,
                time_zone,
            }
            .normalized(),
        })
    }
}

/// ip-api.com response
#[derive(Debug, Deserialize)]
struct IpApiComResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    country: Option<String>,
    timezone: Option<String>,
}

impl IpResponse for IpApiComResponse {
    fn into_hit(self) -> Option<GeoHit> {
        if self.status != "success" {
            return None;
        }
        let coordinates = Coordinates::checked(self.lat, self.lon)?;
        Some(GeoHit {
            coordinates: Some(coordinates),
            place: Place {
                name: self.city,
                region: self.region_name,
                country: self.country,
                time_zone: self.timezone,
            }
            .normalized(),
        })
    }
}

/// One IP-location service: its identity, endpoint and response adapter
#[derive(Debug)]
pub struct IpLocator<R> {
    name: &'static str,
    url: String,
    client: reqwest::Client,
    _shape: std::marker::PhantomData<fn() -> R>,
}

impl<R> IpLocator<R> {
    fn build(name: &'static str, url: &str, config: &ProvidersConfig) -> Result<Self> {
        Ok(Self {
            name,
            url: url.to_string(),
            client: build_client(&config.user_agent, config.ip_timeout_secs)?,
            _shape: std::marker::PhantomData,
        })
    }
}

#[async_trait]
impl<R: IpResponse + 'static> GeoProvider for IpLocator<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn accepts(&self) -> QueryKind {
        QueryKind::CallerAddress
    }

    async fn lookup(&self, query: &ProviderQuery) -> Result<Option<GeoHit>> {
        self.check_shape(query)?;
        let response: R = get_json(self.name, self.client.get(&self.url)).await?;
        Ok(response.into_hit())
    }
}

/// Information about an IP-location backend
#[derive(Debug, Clone, Serialize)]
pub struct IpBackendInfo {
    pub name: &'static str,
    pub url: &'static str,
}

/// All IP-location backends this crate knows how to talk to
pub fn available_ip_providers() -> Vec<IpBackendInfo> {
    vec![
        IpBackendInfo { name: "ipapi.co", url: IPAPI_CO_URL },
        IpBackendInfo { name: "ipinfo.io", url: IPINFO_URL },
        IpBackendInfo { name: "ipwho.is", url: IPWHOIS_URL },
        IpBackendInfo { name: "ip-api.com", url: IP_API_URL },
    ]
}

/// Get an IP-location backend by name
pub fn get_ip_provider(name: &str, config: &ProvidersConfig) -> Result<SharedProvider> {
    let provider: SharedProvider = match name {
        "ipapi.co" => Arc::new(IpLocator::<IpApiCoResponse>::build("ipapi.co", IPAPI_CO_URL, config)?),
        "ipinfo.io" => Arc::new(IpLocator::<IpInfoResponse>::build("ipinfo.io", IPINFO_URL, config)?),
        "ipwho.is" => Arc::new(IpLocator::<IpWhoIsResponse>::build("ipwho.is", IPWHOIS_URL, config)?),
        "ip-api.com" => Arc::new(IpLocator::<IpApiComResponse>::build("ip-api.com", IP_API_URL, config)?),
        other => return Err(Error::UnknownProvider(other.to_string())),
    };
    Ok(provider)
}
