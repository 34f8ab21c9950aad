//! Sharing tier and relationship setting types.

use serde::{Deserialize, Serialize};

/// How much of a user's location is disclosed to a particular viewer.
///
/// Variants are ordered by decreasing disclosure, so a "greater" tier
/// reveals less: `Detailed < Approximate < Hidden < Blocked`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SharingTier {
    /// Exact coordinates.
    Detailed,
    /// Coordinates rounded to ~1.1 km. Used when no setting exists.
    #[default]
    Approximate,
    /// Not shown in nearby results.
    Hidden,
    /// Not shown, and never shown in either direction.
    Blocked,
}

impl SharingTier {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Detailed => "detailed",
            Self::Approximate => "approximate",
            Self::Hidden => "hidden",
            Self::Blocked => "blocked",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "detailed" => Some(Self::Detailed),
            "approximate" => Some(Self::Approximate),
            "hidden" => Some(Self::Hidden),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Returns whether a candidate at this tier may appear in results.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self, Self::Detailed | Self::Approximate)
    }
}

impl std::fmt::Display for SharingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's sharing setting toward another.
///
/// Settings are directional: `sharer_id`'s setting toward `viewer_id` is
/// independent of `viewer_id`'s setting toward `sharer_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSharingSetting {
    /// User whose location is being shared.
    pub sharer_id: String,
    /// User who sees the location.
    pub viewer_id: String,
    /// Disclosure tier.
    pub tier: SharingTier,
}

impl RelationshipSharingSetting {
    /// Creates a new setting.
    #[must_use]
    pub fn new(
        sharer_id: impl Into<String>,
        viewer_id: impl Into<String>,
        tier: SharingTier,
    ) -> Self {
        Self {
            sharer_id: sharer_id.into(),
            viewer_id: viewer_id.into(),
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_ordered_by_decreasing_disclosure() {
        assert!(SharingTier::Detailed < SharingTier::Approximate);
        assert!(SharingTier::Approximate < SharingTier::Hidden);
        assert!(SharingTier::Hidden < SharingTier::Blocked);
    }

    #[test]
    fn default_tier_is_approximate() {
        assert_eq!(SharingTier::default(), SharingTier::Approximate);
    }

    #[test]
    fn as_str_and_parse_agree() {
        for tier in [
            SharingTier::Detailed,
            SharingTier::Approximate,
            SharingTier::Hidden,
            SharingTier::Blocked,
        ] {
            assert_eq!(SharingTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(SharingTier::parse("Detailed"), None);
        assert_eq!(SharingTier::parse(""), None);
    }

    #[test]
    fn visibility() {
        assert!(SharingTier::Detailed.is_visible());
        assert!(SharingTier::Approximate.is_visible());
        assert!(!SharingTier::Hidden.is_visible());
        assert!(!SharingTier::Blocked.is_visible());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&SharingTier::Approximate).unwrap();
        assert_eq!(json, "\"approximate\"");

        let tier: SharingTier = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(tier, SharingTier::Blocked);
    }
}
