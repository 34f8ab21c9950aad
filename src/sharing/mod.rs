//! Sharing tiers between users.
//!
//! Every user chooses, per other user, how precisely their location is
//! disclosed. The [`TierResolver`] turns the stored settings into the tier
//! used by a nearby query, failing closed when settings cannot be read.

mod resolver;
pub mod types;

pub use resolver::TierResolver;
pub use types::{RelationshipSharingSetting, SharingTier};
