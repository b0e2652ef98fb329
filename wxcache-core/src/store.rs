use crate::{
    error::Error,
    model::{Coordinate, Observation},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Abstraction over the observation store.
///
/// Exactly two operations: a proximity query and an insert. The concrete
/// store technology is swappable without touching the cache pipeline.
#[async_trait]
pub trait ObservationStore: Send + Sync + Debug {
    /// Return the nearest stored observation strictly within `radius_m`
    /// meters of `coord` whose expiry has not passed, or `None`.
    ///
    /// The boundary is exclusive: a record exactly `radius_m` away does not
    /// match. Distance ties are broken arbitrarily. A legitimate miss is
    /// `Ok(None)`, never an error.
    async fn find_within(
        &self,
        coord: Coordinate,
        radius_m: f64,
    ) -> Result<Option<Observation>, Error>;

    /// Persist one observation. No deduplication: repeated fetches for the
    /// same coordinate insert multiple rows, and read-time expiry filtering
    /// controls staleness.
    async fn insert(&self, obs: &Observation) -> Result<(), Error>;
}
