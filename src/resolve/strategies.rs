//! The resolution strategies, one per precedence step
//!
//! A strategy first checks whether its signal is present; only then does it
//! touch the network. Provider errors never escape a strategy: they are
//! logged and treated as "no result".

use crate::geo::{
    Coordinates, GeoHit, GeoProvider, Place, ProviderQuery, ProviderSet, ReverseChain,
    SharedProvider,
};
use crate::resolve::{
    FillPolicy, ResolveWarning, ResolvedLocation, Signals, SourceTag,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// One step of the fallback chain
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce a location, or `None` to let the next strategy try
    async fn try_resolve(
        &self,
        signals: &Signals,
        warnings: &mut Vec<ResolveWarning>,
    ) -> Option<ResolvedLocation>;
}

/// The standard precedence order
pub fn standard_chain(
    providers: ProviderSet,
    fill: FillPolicy,
    default_city: &str,
) -> Vec<Box<dyn Strategy>> {
    let ProviderSet { forward, reverse, ip } = providers;

    vec![
        Box::new(CitySearch {
            forward: forward.clone(),
        }),
        Box::new(ForcedCoords {
            reverse: reverse.clone(),
            fill: fill.clone(),
        }),
        Box::new(ForcedCity {
            forward: forward.clone(),
        }),
        Box::new(BrowserGps {
            reverse: reverse.clone(),
            fill: fill.clone(),
        }),
        Box::new(IpLookup { ip, reverse, fill }),
        Box::new(DefaultCity {
            forward,
            city: default_city.to_string(),
        }),
    ]
}

/// Call a provider, turning every failure into absence and blank fields
/// into missing ones
async fn lookup_quietly(provider: &dyn GeoProvider, query: &ProviderQuery) -> Option<GeoHit> {
    match provider.lookup(query).await {
        Ok(hit) => hit.map(|hit| GeoHit {
            place: hit.place.normalized(),
            ..hit
        }),
        Err(e) => {
            debug!("{} lookup failed: {}", provider.name(), e);
            None
        }
    }
}

/// Forward geocode a name; only a hit with coordinates counts
async fn geocode(provider: &dyn GeoProvider, name: &str) -> Option<(Place, Coordinates)> {
    let hit = lookup_quietly(provider, &ProviderQuery::place(name)).await?;
    let coords = hit.coordinates?;
    Some((hit.place, coords))
}

/// Step 1: a search the user explicitly submitted
pub struct CitySearch {
    pub forward: SharedProvider,
}

#[async_trait]
impl Strategy for CitySearch {
    fn name(&self) -> &'static str {
        "city-search"
    }

    async fn try_resolve(
        &self,
        signals: &Signals,
        warnings: &mut Vec<ResolveWarning>,
    ) -> Option<ResolvedLocation> {
        let query = signals.submitted_search()?;

        match geocode(self.forward.as_ref(), query).await {
            Some((place, coords)) => Some(ResolvedLocation::from_place(
                place,
                coords,
                SourceTag::CitySearch,
            )),
            None => {
                let warning = ResolveWarning::SearchNotFound(query.to_string());
                warn!("{}", warning);
                warnings.push(warning);
                None
            }
        }
    }
}

/// Step 2: a configured "lat,lon" override
pub struct ForcedCoords {
    pub reverse: ReverseChain,
    pub fill: FillPolicy,
}

#[async_trait]
impl Strategy for ForcedCoords {
    fn name(&self) -> &'static str {
        "forced-coords"
    }

    async fn try_resolve(
        &self,
        signals: &Signals,
        warnings: &mut Vec<ResolveWarning>,
    ) -> Option<ResolvedLocation> {
        let raw = signals.forced_coords()?;

        let coords = match Coordinates::parse_pair(raw) {
            Ok(coords) => coords,
            Err(e) => {
                debug!("{}", e);
                let warning = ResolveWarning::ForcedCoordsUnparsable(raw.to_string());
                warn!("{}", warning);
                warnings.push(warning);
                return None;
            }
        };

        let place = self.fill.fill(self.reverse.reverse(coords).await);
        Some(ResolvedLocation::from_place(place, coords, SourceTag::ForcedCoords))
    }
}

/// Step 3: a configured city name override
pub struct ForcedCity {
    pub forward: SharedProvider,
}

#[async_trait]
impl Strategy for ForcedCity {
    fn name(&self) -> &'static str {
        "forced-city"
    }

    async fn try_resolve(
        &self,
        signals: &Signals,
        warnings: &mut Vec<ResolveWarning>,
    ) -> Option<ResolvedLocation> {
        let city = signals.forced_city()?;

        match geocode(self.forward.as_ref(), city).await {
            Some((place, coords)) => Some(ResolvedLocation::from_place(
                place,
                coords,
                SourceTag::ForcedCity,
            )),
            None => {
                let warning = ResolveWarning::ForcedCityNotFound(city.to_string());
                warn!("{}", warning);
                warnings.push(warning);
                None
            }
        }
    }
}

/// Step 4: coordinates the client already obtained
pub struct BrowserGps {
    pub reverse: ReverseChain,
    pub fill: FillPolicy,
}

#[async_trait]
impl Strategy for BrowserGps {
    fn name(&self) -> &'static str {
        "browser-gps"
    }

    async fn try_resolve(
        &self,
        signals: &Signals,
        _warnings: &mut Vec<ResolveWarning>,
    ) -> Option<ResolvedLocation> {
        let browser = signals.browser.as_ref()?;
        let Some(coords) = browser.coordinates() else {
            debug!("Ignoring out-of-range browser fix {}, {}", browser.lat, browser.lon);
            return None;
        };

        let place = self.fill.fill(self.reverse.reverse(coords).await);
        Some(ResolvedLocation::from_place(
            place,
            coords,
            SourceTag::BrowserGps(browser.method.clone()),
        ))
    }
}

/// Step 5: IP geolocation, first provider with coordinates wins
pub struct IpLookup {
    pub ip: Vec<SharedProvider>,
    pub reverse: ReverseChain,
    pub fill: FillPolicy,
}

#[async_trait]
impl Strategy for IpLookup {
    fn name(&self) -> &'static str {
        "ip"
    }

    async fn try_resolve(
        &self,
        _signals: &Signals,
        _warnings: &mut Vec<ResolveWarning>,
    ) -> Option<ResolvedLocation> {
        for provider in &self.ip {
            let Some(hit) = lookup_quietly(provider.as_ref(), &ProviderQuery::CallerAddress).await
            else {
                continue;
            };
            let Some(coords) = hit.coordinates else {
                debug!("{} answered without coordinates", provider.name());
                continue;
            };

            info!("Using less-accurate IP-based location from {}", provider.name());
            let reverse = self.reverse.reverse(coords).await;
            let place = self.fill.fill(self.fill.merge_ip(reverse, hit.place));
            return Some(ResolvedLocation::from_place(
                place,
                coords,
                SourceTag::Ip(provider.name().to_string()),
            ));
        }
        None
    }
}

/// Step 6: geocode the default city; the resolver supplies the literal
/// record if this also fails
pub struct DefaultCity {
    pub forward: SharedProvider,
    pub city: String,
}

#[async_trait]
impl Strategy for DefaultCity {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn try_resolve(
        &self,
        _signals: &Signals,
        _warnings: &mut Vec<ResolveWarning>,
    ) -> Option<ResolvedLocation> {
        let (place, coords) = geocode(self.forward.as_ref(), &self.city).await?;
        Some(ResolvedLocation::from_place(place, coords, SourceTag::Fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::testing::{hit, place, Script, ScriptedProvider};
    use crate::geo::QueryKind;
    use crate::resolve::{BrowserCoordinates, LocationResolver};
    use std::sync::Arc;

    fn dubai_hit() -> GeoHit {
        hit(
            place(Some("Dubai"), Some("Dubai"), Some("United Arab Emirates"), Some("Asia/Dubai")),
            Some((25.0772, 55.3093)),
        )
    }

    fn karachi_hit() -> GeoHit {
        hit(
            place(Some("Karachi"), Some("Sindh"), Some("Pakistan"), Some("Asia/Karachi")),
            Some((24.8608, 67.0104)),
        )
    }

    /// Scripted providers plus handles to inspect their call counts
    struct Harness {
        forward: Arc<ScriptedProvider>,
        reverse: Arc<ScriptedProvider>,
        ip: Vec<Arc<ScriptedProvider>>,
        fill: FillPolicy,
    }

    impl Harness {
        fn new(forward: Script, reverse: Script, ip: Vec<(&'static str, Script)>) -> Self {
            Self {
                forward: ScriptedProvider::new("forward", QueryKind::Place, forward),
                reverse: ScriptedProvider::new("reverse", QueryKind::Coords, reverse),
                ip: ip
                    .into_iter()
                    .map(|(name, script)| {
                        ScriptedProvider::new(name, QueryKind::CallerAddress, script)
                    })
                    .collect(),
                fill: FillPolicy::default(),
            }
        }

        /// Every network signal fails
        fn all_failing() -> Self {
            Self::new(
                Script::Fail,
                Script::Fail,
                vec![("p1", Script::Fail), ("p2", Script::Miss), ("p3", Script::Fail)],
            )
        }

        fn with_fill(mut self, fill: FillPolicy) -> Self {
            self.fill = fill;
            self
        }

        fn resolver(&self) -> LocationResolver {
            let providers = ProviderSet {
                forward: self.forward.clone() as SharedProvider,
                reverse: ReverseChain::new(vec![self.reverse.clone() as SharedProvider]),
                ip: self.ip.iter().map(|p| p.clone() as SharedProvider).collect(),
            };
            LocationResolver::with_strategies(standard_chain(providers, self.fill.clone(), "Karachi"))
        }
    }

    #[tokio::test]
    async fn test_forced_coords_keep_exact_coordinates() {
        for reverse in [Script::Fail, Script::Miss, Script::Hit(karachi_hit())] {
            let harness = Harness::new(Script::Fail, reverse, vec![]);
            let signals = Signals::default().with_forced_coords("25.2048, 55.2708");

            let loc = harness.resolver().resolve(&signals).await;

            assert_eq!(loc.source, SourceTag::ForcedCoords);
            assert_eq!(loc.coordinates, Coordinates::new(25.2048, 55.2708));
        }
    }

    #[tokio::test]
    async fn test_forced_coords_fill_when_reverse_is_empty() {
        let harness = Harness::new(Script::Fail, Script::Fail, vec![]);
        let signals = Signals::default().with_forced_coords("25.2048,55.2708");

        let loc = harness.resolver().resolve(&signals).await;

        assert!(loc.display_name.is_none());
        assert_eq!(loc.country.as_deref(), Some("Pakistan"));
        assert_eq!(loc.time_zone.as_deref(), Some("Asia/Karachi"));
    }

    #[tokio::test]
    async fn test_malformed_forced_coords_fall_through_in_order() {
        for raw in ["notanumber,1", "1,2,3"] {
            let harness = Harness::all_failing();
            let signals = Signals::default()
                .with_forced_coords(raw)
                .with_forced_city("Dubai");

            let resolution = harness.resolver().resolve_with_report(&signals).await;

            assert_eq!(
                resolution.warnings,
                vec![
                    ResolveWarning::ForcedCoordsUnparsable(raw.to_string()),
                    ResolveWarning::ForcedCityNotFound("Dubai".to_string()),
                ]
            );
            assert_eq!(resolution.location, ResolvedLocation::fallback_literal());
            // forced city, then default city
            assert_eq!(harness.forward.calls(), 2);
            assert!(harness.ip.iter().all(|p| p.calls() == 1));
            // parse failure never reaches the reverse geocoder
            assert_eq!(harness.reverse.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_manual_search_beats_forced_coords() {
        let harness = Harness::new(Script::Hit(dubai_hit()), Script::Fail, vec![]);
        let signals = Signals::default()
            .with_search("Dubai")
            .with_forced_coords("24.86,67.01");

        let loc = harness.resolver().resolve(&signals).await;

        assert_eq!(loc.source, SourceTag::CitySearch);
        assert_eq!(loc.display_name.as_deref(), Some("Dubai"));
        assert_eq!(harness.reverse.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsubmitted_search_is_ignored() {
        let harness = Harness::new(Script::Hit(dubai_hit()), Script::Miss, vec![]);
        let signals = Signals {
            manual_search: Some("Dubai".to_string()),
            forced_coords: Some("24.86,67.01".to_string()),
            ..Signals::default()
        };

        let loc = harness.resolver().resolve(&signals).await;

        assert_eq!(loc.source, SourceTag::ForcedCoords);
        assert_eq!(harness.forward.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_search_warns_and_continues() {
        let harness = Harness::new(Script::Miss, Script::Miss, vec![]);
        let signals = Signals::default()
            .with_search("Atlantis")
            .with_forced_coords("24.86,67.01");

        let resolution = harness.resolver().resolve_with_report(&signals).await;

        assert_eq!(
            resolution.warnings,
            vec![ResolveWarning::SearchNotFound("Atlantis".to_string())]
        );
        assert_eq!(resolution.location.source, SourceTag::ForcedCoords);
    }

    #[tokio::test]
    async fn test_forced_city() {
        let harness = Harness::new(Script::Hit(dubai_hit()), Script::Fail, vec![]);
        let signals = Signals::default().with_forced_city("Dubai");

        let loc = harness.resolver().resolve(&signals).await;

        assert_eq!(loc.source, SourceTag::ForcedCity);
        assert_eq!(loc.time_zone.as_deref(), Some("Asia/Dubai"));
    }

    #[tokio::test]
    async fn test_forward_hit_without_coordinates_is_a_miss() {
        let harness = Harness::new(
            Script::Hit(hit(place(Some("Dubai"), None, None, None), None)),
            Script::Miss,
            vec![],
        );
        let signals = Signals::default().with_forced_city("Dubai");

        let resolution = harness.resolver().resolve_with_report(&signals).await;

        assert_eq!(resolution.location, ResolvedLocation::fallback_literal());
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_everything_fails_returns_literal_karachi() {
        let harness = Harness::all_failing();

        let loc = harness.resolver().resolve(&Signals::default()).await;

        assert_eq!(loc.source, SourceTag::Fallback);
        assert_eq!(loc.coordinates, Coordinates::new(24.8607, 67.0011));
        assert_eq!(loc, ResolvedLocation::fallback_literal());
    }

    #[tokio::test]
    async fn test_default_city_geocode_is_tagged_fallback() {
        let harness = Harness::new(Script::Hit(karachi_hit()), Script::Fail, vec![("p1", Script::Fail)]);

        let loc = harness.resolver().resolve(&Signals::default()).await;

        assert_eq!(loc.source, SourceTag::Fallback);
        assert_eq!(loc.coordinates, Coordinates::new(24.8608, 67.0104));
    }

    #[tokio::test]
    async fn test_first_ip_provider_with_coordinates_wins() {
        let p2_hit = hit(place(Some("Lahore"), Some("Punjab"), Some("PK"), None), Some((31.55, 74.34)));
        let harness = Harness::new(
            Script::Fail,
            Script::Fail,
            vec![
                ("p1", Script::Fail),
                ("p2", Script::Hit(p2_hit)),
                ("p3", Script::Hit(dubai_hit())),
            ],
        );

        let loc = harness.resolver().resolve(&Signals::default()).await;

        assert_eq!(loc.source, SourceTag::Ip("p2".to_string()));
        assert_eq!(loc.coordinates, Coordinates::new(31.55, 74.34));
        assert_eq!(loc.display_name.as_deref(), Some("Lahore"));
        assert_eq!(harness.ip[0].calls(), 1);
        assert_eq!(harness.ip[1].calls(), 1);
        assert_eq!(harness.ip[2].calls(), 0);
        // the chain stopped before the default-city geocode
        assert_eq!(harness.forward.calls(), 0);
    }

    #[tokio::test]
    async fn test_ip_hit_without_coordinates_is_skipped() {
        let harness = Harness::new(
            Script::Fail,
            Script::Miss,
            vec![
                ("p1", Script::Hit(hit(place(Some("Nowhere"), None, None, None), None))),
                ("p2", Script::Hit(dubai_hit())),
            ],
        );

        let loc = harness.resolver().resolve(&Signals::default()).await;
        assert_eq!(loc.source, SourceTag::Ip("p2".to_string()));
    }

    #[tokio::test]
    async fn test_ip_prefers_reverse_fields() {
        let harness = Harness::new(
            Script::Fail,
            Script::Hit(hit(place(Some("Deira"), None, Some("UAE"), None), None)),
            vec![("p1", Script::Hit(dubai_hit()))],
        );

        let loc = harness.resolver().resolve(&Signals::default()).await;

        assert_eq!(loc.display_name.as_deref(), Some("Deira"));
        assert_eq!(loc.region.as_deref(), Some("Dubai"));
        assert_eq!(loc.country.as_deref(), Some("UAE"));
        assert_eq!(loc.time_zone.as_deref(), Some("Asia/Dubai"));
        assert!(loc.needs_accuracy_disclaimer());
    }

    #[tokio::test]
    async fn test_ip_can_prefer_provider_fields() {
        let harness = Harness::new(
            Script::Fail,
            Script::Hit(hit(place(Some("Deira"), None, Some("UAE"), None), None)),
            vec![("p1", Script::Hit(dubai_hit()))],
        )
        .with_fill(FillPolicy {
            ip_prefer_reverse: false,
            ..FillPolicy::default()
        });

        let loc = harness.resolver().resolve(&Signals::default()).await;

        assert_eq!(loc.display_name.as_deref(), Some("Dubai"));
        assert_eq!(loc.country.as_deref(), Some("United Arab Emirates"));
    }

    #[tokio::test]
    async fn test_blank_reverse_fields_do_not_hide_ip_fields() {
        let detailed = ScriptedProvider::new(
            "detailed",
            QueryKind::Coords,
            Script::Hit(hit(place(Some(""), Some(""), Some(""), None), None)),
        );
        let coarse = ScriptedProvider::new("coarse", QueryKind::Coords, Script::Miss);
        let ip = ScriptedProvider::new("p1", QueryKind::CallerAddress, Script::Hit(dubai_hit()));
        let providers = ProviderSet {
            forward: ScriptedProvider::new("forward", QueryKind::Place, Script::Fail),
            reverse: ReverseChain::new(vec![detailed.clone() as SharedProvider, coarse.clone()]),
            ip: vec![ip as SharedProvider],
        };
        let resolver = LocationResolver::with_strategies(standard_chain(
            providers,
            FillPolicy::default(),
            "Karachi",
        ));

        let loc = resolver.resolve(&Signals::default()).await;

        assert_eq!(loc.display_name.as_deref(), Some("Dubai"));
        assert_eq!(loc.region.as_deref(), Some("Dubai"));
        assert_eq!(loc.country.as_deref(), Some("United Arab Emirates"));
        assert_eq!(coarse.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_ip_fields_fall_back_to_reverse() {
        let harness = Harness::new(
            Script::Fail,
            Script::Hit(hit(place(Some("Deira"), Some("Dubai"), Some("UAE"), None), None)),
            vec![(
                "p1",
                Script::Hit(hit(place(Some(" "), Some(""), Some(""), Some("")), Some((25.2, 55.27)))),
            )],
        )
        .with_fill(FillPolicy {
            ip_prefer_reverse: false,
            ..FillPolicy::default()
        });

        let loc = harness.resolver().resolve(&Signals::default()).await;

        assert_eq!(loc.display_name.as_deref(), Some("Deira"));
        assert_eq!(loc.region.as_deref(), Some("Dubai"));
        assert_eq!(loc.country.as_deref(), Some("UAE"));
        assert_eq!(loc.time_zone.as_deref(), Some("Asia/Karachi"));
    }

    #[tokio::test]
    async fn test_browser_reverse_fill_in() {
        let harness = Harness::new(
            Script::Fail,
            Script::Hit(hit(place(None, None, Some("UAE"), None), None)),
            vec![],
        );
        let signals = Signals::default().with_browser(BrowserCoordinates::new(25.2, 55.27, "js-eval"));

        let loc = harness.resolver().resolve(&signals).await;

        assert_eq!(loc.source, SourceTag::BrowserGps("js-eval".to_string()));
        assert_eq!(loc.country.as_deref(), Some("UAE"));
        assert!(loc.display_name.is_none());
        assert_eq!(loc.time_zone.as_deref(), Some("Asia/Karachi"));
        assert!(!loc.needs_accuracy_disclaimer());
    }

    #[tokio::test]
    async fn test_browser_reverse_without_fill_leaves_time_zone_empty() {
        let harness = Harness::new(
            Script::Fail,
            Script::Hit(hit(place(None, None, Some("UAE"), None), None)),
            vec![],
        )
        .with_fill(FillPolicy::no_fill());
        let signals = Signals::default().with_browser(BrowserCoordinates::new(25.2, 55.27, "js-eval"));

        let loc = harness.resolver().resolve(&signals).await;

        assert_eq!(loc.country.as_deref(), Some("UAE"));
        assert!(loc.display_name.is_none());
        assert!(loc.time_zone.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_browser_fix_falls_through() {
        let harness = Harness::new(Script::Fail, Script::Miss, vec![("p1", Script::Hit(dubai_hit()))]);
        let signals = Signals::default().with_browser(BrowserCoordinates::new(250.0, 55.27, "js-eval"));

        let loc = harness.resolver().resolve(&signals).await;

        assert_eq!(loc.source, SourceTag::Ip("p1".to_string()));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let harness = Harness::new(
            Script::Miss,
            Script::Hit(hit(place(Some("Clifton"), None, None, None), None)),
            vec![("p1", Script::Fail), ("p2", Script::Hit(karachi_hit()))],
        );
        let resolver = harness.resolver();
        let signals = Signals::default().with_search("Atlantis");

        let first = resolver.resolve_with_report(&signals).await;
        let second = resolver.resolve_with_report(&signals).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_strategy_list_still_resolves() {
        let resolver = LocationResolver::with_strategies(Vec::new());
        let loc = resolver.resolve(&Signals::default()).await;
        assert_eq!(loc, ResolvedLocation::fallback_literal());
    }

    #[test]
    fn test_standard_chain_order() {
        let harness = Harness::all_failing();
        assert_eq!(
            harness.resolver().strategy_names(),
            vec!["city-search", "forced-coords", "forced-city", "browser-gps", "ip", "fallback"]
        );
    }
}
