//! Ordered reverse-geocoding chain
//!
//! Backends are tried in order; the first whose answer carries any of
//! name, region or country wins. When none does, the caller gets an
//! all-empty `Place`. Backend failures count as "nothing".

use crate::geo::{Coordinates, Place, ProviderQuery, SharedProvider};
use tracing::debug;

/// An ordered list of reverse geocoders
#[derive(Clone)]
pub struct ReverseChain {
    backends: Vec<SharedProvider>,
}

impl ReverseChain {
    pub fn new(backends: Vec<SharedProvider>) -> Self {
        Self { backends }
    }

    /// Backend names in consultation order
    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Reverse geocode a coordinate pair; never fails
    pub async fn reverse(&self, coords: Coordinates) -> Place {
        let query = ProviderQuery::coords(coords);

        for backend in &self.backends {
            match backend.lookup(&query).await {
                Ok(Some(hit)) => {
                    let place = hit.place.normalized();
                    if !place.is_blank() {
                        debug!("Reverse geocoded {} via {}", coords, backend.name());
                        return place;
                    }
                    debug!("{} had only blank fields for {}", backend.name(), coords);
                }
                Ok(None) => debug!("{} had nothing for {}", backend.name(), coords),
                Err(e) => debug!("{} reverse lookup failed: {}", backend.name(), e),
            }
        }

        Place::default()
    }
}
