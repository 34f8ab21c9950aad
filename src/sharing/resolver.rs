//! Resolution of the sharing tier between a requester and a candidate.

use tracing::warn;

use super::types::SharingTier;
use crate::store::RelationshipStore;

/// Resolves which tier governs what a requester may see of a candidate.
///
/// # Resolution Rules
///
/// 1. If the requester has blocked the candidate, the result is
///    [`SharingTier::Blocked`].
/// 2. Otherwise the candidate's own setting toward the requester applies.
/// 3. With no setting, the configured default applies.
/// 4. Any storage failure yields [`SharingTier::Hidden`]. Sharing intent
///    that cannot be read is never treated as consent to disclose.
pub struct TierResolver<'a> {
    store: &'a dyn RelationshipStore,
    default_tier: SharingTier,
}

impl<'a> TierResolver<'a> {
    /// Creates a resolver over `store`.
    #[must_use]
    pub fn new(store: &'a dyn RelationshipStore, default_tier: SharingTier) -> Self {
        Self {
            store,
            default_tier,
        }
    }

    /// Returns the tier at which `candidate_id` is disclosed to `requester_id`.
    #[must_use]
    pub fn resolve(&self, requester_id: &str, candidate_id: &str) -> SharingTier {
        match self.store.sharing_setting(requester_id, candidate_id) {
            Ok(Some(SharingTier::Blocked)) => return SharingTier::Blocked,
            Ok(_) => {}
            Err(e) => return degraded(requester_id, candidate_id, &e),
        }

        match self.store.sharing_setting(candidate_id, requester_id) {
            Ok(Some(tier)) => tier,
            Ok(None) => self.default_tier,
            Err(e) => degraded(requester_id, candidate_id, &e),
        }
    }
}

fn degraded(requester_id: &str, candidate_id: &str, err: &dyn std::fmt::Display) -> SharingTier {
    warn!(
        requester_id,
        candidate_id, "Tier resolution degraded, hiding candidate: {err}"
    );
    SharingTier::Hidden
}
