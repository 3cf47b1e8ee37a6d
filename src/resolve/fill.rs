//! Missing-field filling and IP/reverse precedence
//!
//! Coordinate-based results (forced coordinates, browser GPS, IP) get their
//! display fields from reverse geocoding, which may come back empty. Country
//! and time zone can then be filled with configured defaults. The settlement
//! name is never filled.

use crate::constants::fallback;
use crate::geo::Place;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillPolicy {
    /// Fill a missing country/time zone with the values below
    pub fill_defaults: bool,
    pub country: String,
    pub time_zone: String,
    /// For IP results: reverse-geocode fields win over the provider's own
    pub ip_prefer_reverse: bool,
}

impl Default for FillPolicy {
    fn default() -> Self {
        Self {
            fill_defaults: true,
            country: fallback::COUNTRY.to_string(),
            time_zone: fallback::TIME_ZONE.to_string(),
            ip_prefer_reverse: true,
        }
    }
}

impl FillPolicy {
    /// A policy that leaves missing fields empty
    pub fn no_fill() -> Self {
        Self {
            fill_defaults: false,
            ..Self::default()
        }
    }

    /// Fill country and time zone if enabled
    pub fn fill(&self, mut place: Place) -> Place {
        if self.fill_defaults {
            place.country.get_or_insert_with(|| self.country.clone());
            place.time_zone.get_or_insert_with(|| self.time_zone.clone());
        }
        place
    }

    /// Combine reverse-geocoded fields with an IP provider's own fields,
    /// field by field, in the configured precedence
    pub fn merge_ip(&self, reverse: Place, ip: Place) -> Place {
        let (first, second) = if self.ip_prefer_reverse {
            (reverse, ip)
        } else {
            (ip, reverse)
        };

        Place {
            name: first.name.or(second.name),
            region: first.region.or(second.region),
            country: first.country.or(second.country),
            time_zone: first.time_zone.or(second.time_zone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::testing::place;

    #[test]
    fn test_fill_only_missing_fields() {
        let policy = FillPolicy::default();
        let filled = policy.fill(place(None, None, Some("UAE"), None));

        assert_eq!(filled.country.as_deref(), Some("UAE"));
        assert_eq!(filled.time_zone.as_deref(), Some("Asia/Karachi"));
        assert!(filled.name.is_none());
        assert!(filled.region.is_none());
    }

    #[test]
    fn test_no_fill_leaves_fields_empty() {
        let filled = FillPolicy::no_fill().fill(Place::default());
        assert_eq!(filled, Place::default());
    }

    #[test]
    fn test_merge_prefers_reverse_by_default() {
        let reverse = place(Some("Clifton"), None, Some("Pakistan"), None);
        let ip = place(Some("Karachi"), Some("Sindh"), Some("PK"), Some("Asia/Karachi"));

        let merged = FillPolicy::default().merge_ip(reverse, ip);

        assert_eq!(merged.name.as_deref(), Some("Clifton"));
        assert_eq!(merged.region.as_deref(), Some("Sindh"));
        assert_eq!(merged.country.as_deref(), Some("Pakistan"));
        assert_eq!(merged.time_zone.as_deref(), Some("Asia/Karachi"));
    }

    #[test]
    fn test_merge_can_prefer_ip() {
        let policy = FillPolicy {
            ip_prefer_reverse: false,
            ..FillPolicy::default()
        };
        let reverse = place(Some("Clifton"), Some("Sindh"), None, None);
        let ip = place(Some("Karachi"), None, Some("PK"), None);

        let merged = policy.merge_ip(reverse, ip);

        assert_eq!(merged.name.as_deref(), Some("Karachi"));
        assert_eq!(merged.region.as_deref(), Some("Sindh"));
        assert_eq!(merged.country.as_deref(), Some("PK"));
    }
}
