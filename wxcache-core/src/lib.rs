//! Core library for the `wxcache` weather lookup.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the weather provider
//! - Abstraction over the observation store (proximity query + insert)
//! - The fetch-or-serve-from-cache pipeline
//! - Shared domain models (coordinates, normalized observations)
//!
//! It is used by `wxcache-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use cache::WeatherCache;
pub use config::{Config, StoreConfig};
pub use error::Error;
pub use model::{Coordinate, Observation};
pub use provider::WeatherProvider;
pub use store::ObservationStore;
