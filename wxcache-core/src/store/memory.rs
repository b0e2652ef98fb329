use crate::{
    error::Error,
    model::{Coordinate, Observation},
    store::ObservationStore,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

/// In-process observation store.
///
/// Rows live in a Vec; the proximity query is a linear haversine scan.
/// Used by tests and as the fallback when no hosted store is configured.
/// Expired rows are kept and filtered out at read time, matching the
/// hosted store's behavior.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Observation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, expired ones included.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn find_within(
        &self,
        coord: Coordinate,
        radius_m: f64,
    ) -> Result<Option<Observation>, Error> {
        let now = Utc::now();
        let rows = self.rows.lock().await;

        let nearest = rows
            .iter()
            .filter(|obs| obs.is_fresh_at(now))
            .map(|obs| (obs.coord.distance_m(&coord), obs))
            .filter(|(d, _)| *d < radius_m)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, obs)| obs.clone());

        Ok(nearest)
    }

    async fn insert(&self, obs: &Observation) -> Result<(), Error> {
        self.rows.lock().await.push(obs.clone());
        Ok(())
    }
}
