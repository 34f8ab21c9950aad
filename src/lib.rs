//! Nearby Core Library
//!
//! Finds friends who are close by, disclosing each friend's position only as
//! precisely as that friend allows.
//!
//! - [`location`]: coordinates, distance, freshness, masking and reporting
//! - [`sharing`]: per-relationship sharing tiers and their resolution
//! - [`nearby`]: the nearby query and the service around it
//! - [`store`]: storage traits with SQLite and in-memory implementations
//! - [`auth`]: bearer token authentication
//! - [`server`]: the axum HTTP boundary
//! - [`config`]: environment configuration

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod location;
pub mod nearby;
pub mod server;
pub mod sharing;
pub mod store;

pub use config::{Config, ConfigError};
pub use nearby::{NearbyError, NearbyService};
