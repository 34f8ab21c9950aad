//! Nearby query evaluation over an already loaded candidate set.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::types::{NearbyConfig, NearbyQuery, NearbyResult};
use crate::location::{distance_meters, is_fresh, mask, Coordinate, LocationRecord};
use crate::sharing::{SharingTier, TierResolver};
use crate::store::UserDirectory;

/// Display name used when the directory has none.
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

struct Match<'a> {
    owner_id: &'a str,
    distance_meters: u32,
    masked: Coordinate,
    tier: SharingTier,
}

/// Evaluates a nearby query against candidate locations.
///
/// A candidate is returned only if it is not the requester, its location
/// is fresh, it lies within the query radius and its resolved tier is
/// visible. Results are sorted by distance then owner ID and truncated to
/// `config.max_results`.
///
/// Tier lookup failures hide the affected candidate; they never fail the
/// query. Display names only decorate the results that survive filtering.
#[must_use]
pub fn find_nearby(
    query: &NearbyQuery,
    candidates: &[LocationRecord],
    resolver: &TierResolver<'_>,
    directory: &dyn UserDirectory,
    config: &NearbyConfig,
    now: DateTime<Utc>,
) -> Vec<NearbyResult> {
    let window = config.freshness_window();
    let radius = f64::from(query.radius_meters);

    let mut matches: Vec<Match<'_>> = candidates
        .iter()
        .filter(|candidate| candidate.owner_id != query.requester_id)
        .filter(|candidate| is_fresh(candidate.captured_at, now, window))
        .filter_map(|candidate| {
            let distance = distance_meters(query.center, candidate.coordinate);
            if distance.is_nan() || distance > radius {
                return None;
            }

            let tier = resolver.resolve(&query.requester_id, &candidate.owner_id);
            let masked = mask(candidate.coordinate, tier)?;

            Some(Match {
                owner_id: &candidate.owner_id,
                distance_meters: whole_meters(distance),
                masked,
                tier,
            })
        })
        .collect();

    matches.sort_by(compare_matches);
    matches.truncate(config.max_results);

    matches
        .into_iter()
        .map(|m| NearbyResult {
            owner_id: m.owner_id.to_string(),
            display_name: display_name(directory, m.owner_id),
            distance_meters: m.distance_meters,
            masked_coordinate: Some(m.masked),
            tier: m.tier,
        })
        .collect()
}

fn compare_matches(a: &Match<'_>, b: &Match<'_>) -> Ordering {
    a.distance_meters
        .cmp(&b.distance_meters)
        .then_with(|| a.owner_id.cmp(b.owner_id))
}

// Distances are already bounded by the u32 radius.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_meters(distance: f64) -> u32 {
    distance.round() as u32
}

fn display_name(directory: &dyn UserDirectory, owner_id: &str) -> String {
    match directory.display_name(owner_id) {
        Ok(Some(name)) => name,
        Ok(None) => ANONYMOUS_DISPLAY_NAME.to_string(),
        Err(e) => {
            warn!(owner_id, "Display name lookup failed: {e}");
            ANONYMOUS_DISPLAY_NAME.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::sharing::RelationshipSharingSetting;
    use crate::store::{MemoryStore, RelationshipStore};

    const SHINJUKU: (f64, f64) = (35.6762, 139.6503);
    const SHIBUYA: (f64, f64) = (35.6581, 139.7414);

    fn coord((latitude, longitude): (f64, f64)) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn query(radius_meters: u32) -> NearbyQuery {
        NearbyQuery {
            requester_id: "alice".to_string(),
            center: coord(SHINJUKU),
            radius_meters,
        }
    }

    fn candidate(owner: &str, at: (f64, f64), now: DateTime<Utc>) -> LocationRecord {
        LocationRecord::new(owner, coord(at), now - Duration::minutes(1))
    }

    fn run(
        query: &NearbyQuery,
        candidates: &[LocationRecord],
        store: &MemoryStore,
    ) -> Vec<NearbyResult> {
        let config = NearbyConfig::default();
        let resolver = TierResolver::new(store, config.default_tier);
        find_nearby(query, candidates, &resolver, store, &config, Utc::now())
    }

    #[test]
    fn shibuya_outside_five_km() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let results = run(&query(5_000), &[candidate("bob", SHIBUYA, now)], &store);
        assert!(results.is_empty());
    }

    #[test]
    fn shibuya_inside_ten_km_is_approximate() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let results = run(&query(10_000), &[candidate("bob", SHIBUYA, now)], &store);

        assert_eq!(results.len(), 1);
        let bob = &results[0];
        assert_eq!(bob.tier, SharingTier::Approximate);
        assert_eq!(
            bob.masked_coordinate,
            Some(Coordinate {
                latitude: 35.66,
                longitude: 139.74
            })
        );
        assert!(bob.distance_meters > 5_000 && bob.distance_meters <= 10_000);
    }

    #[test]
    fn stale_candidate_is_excluded() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let stale = LocationRecord::new("bob", coord(SHINJUKU), now - Duration::minutes(31));

        let config = NearbyConfig::default();
        let resolver = TierResolver::new(&store, config.default_tier);
        let results = find_nearby(&query(10_000), &[stale], &resolver, &store, &config, now);
        assert!(results.is_empty());
    }

    #[test]
    fn requester_is_never_returned() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let results = run(&query(10_000), &[candidate("alice", SHINJUKU, now)], &store);
        assert!(results.is_empty());
    }

    #[test]
    fn hidden_and_blocked_are_dropped() {
        let store = MemoryStore::new();
        store
            .set_sharing_setting(&RelationshipSharingSetting::new(
                "bob",
                "alice",
                SharingTier::Hidden,
            ))
            .unwrap();
        store
            .set_sharing_setting(&RelationshipSharingSetting::new(
                "carol",
                "alice",
                SharingTier::Blocked,
            ))
            .unwrap();
        let now = Utc::now();

        let results = run(
            &query(10_000),
            &[
                candidate("bob", SHIBUYA, now),
                candidate("carol", SHIBUYA, now),
                candidate("dave", SHIBUYA, now),
            ],
            &store,
        );
        let owners: Vec<_> = results.iter().map(|r| r.owner_id.as_str()).collect();
        assert_eq!(owners, vec!["dave"]);
    }

    #[test]
    fn detailed_tier_keeps_exact_coordinate() {
        let store = MemoryStore::new();
        store
            .set_sharing_setting(&RelationshipSharingSetting::new(
                "bob",
                "alice",
                SharingTier::Detailed,
            ))
            .unwrap();
        let now = Utc::now();

        let results = run(&query(10_000), &[candidate("bob", SHIBUYA, now)], &store);
        assert_eq!(results[0].masked_coordinate, Some(coord(SHIBUYA)));
        assert_eq!(results[0].tier, SharingTier::Detailed);
    }

    #[test]
    fn sorted_by_distance_then_owner() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let near = (35.6800, 139.6503);
        let results = run(
            &query(10_000),
            &[
                candidate("zed", SHIBUYA, now),
                candidate("carol", near, now),
                candidate("bob", near, now),
            ],
            &store,
        );

        let owners: Vec<_> = results.iter().map(|r| r.owner_id.as_str()).collect();
        assert_eq!(owners, vec!["bob", "carol", "zed"]);
    }

    #[test]
    fn tier_failure_degrades_single_candidate() {
        let store = MemoryStore::new();
        store.fail_sharing_lookups_for("bob");
        let now = Utc::now();

        let results = run(
            &query(10_000),
            &[candidate("bob", SHIBUYA, now), candidate("carol", SHIBUYA, now)],
            &store,
        );
        let owners: Vec<_> = results.iter().map(|r| r.owner_id.as_str()).collect();
        assert_eq!(owners, vec!["carol"]);
    }

    #[test]
    fn results_are_truncated() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let candidates: Vec<_> = (0..10)
            .map(|i| candidate(&format!("user{i}"), SHIBUYA, now))
            .collect();

        let config = NearbyConfig {
            max_results: 3,
            ..NearbyConfig::default()
        };
        let resolver = TierResolver::new(&store, config.default_tier);
        let results = find_nearby(&query(10_000), &candidates, &resolver, &store, &config, now);

        let owners: Vec<_> = results.iter().map(|r| r.owner_id.as_str()).collect();
        assert_eq!(owners, vec!["user0", "user1", "user2"]);
    }

    #[test]
    fn display_names_decorate_results() {
        let store = MemoryStore::new();
        store.save_user("bob", "Bob").unwrap();
        let now = Utc::now();

        let results = run(
            &query(10_000),
            &[candidate("bob", SHIBUYA, now), candidate("carol", SHIBUYA, now)],
            &store,
        );
        assert_eq!(results[0].display_name, "Bob");
        assert_eq!(results[1].display_name, ANONYMOUS_DISPLAY_NAME);
    }

    #[test]
    fn directory_failure_does_not_filter() {
        let store = MemoryStore::new();
        store.fail_directory(true);
        let now = Utc::now();

        let results = run(&query(10_000), &[candidate("bob", SHIBUYA, now)], &store);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, ANONYMOUS_DISPLAY_NAME);
    }

    #[test]
    fn non_finite_candidate_coordinate_is_dropped() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let broken = LocationRecord::new(
            "bob",
            Coordinate {
                latitude: f64::NAN,
                longitude: 139.7414,
            },
            now,
        );

        let results = run(&query(10_000), &[broken, candidate("carol", SHIBUYA, now)], &store);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].owner_id, "carol");
    }

    #[test]
    fn far_future_candidate_is_excluded() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let ahead = LocationRecord::new("bob", coord(SHIBUYA), now + Duration::days(1));

        let config = NearbyConfig::default();
        let resolver = TierResolver::new(&store, config.default_tier);
        let results = find_nearby(&query(10_000), &[ahead], &resolver, &store, &config, now);
        assert!(results.is_empty());
    }
}
