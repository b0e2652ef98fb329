use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    model::{Coordinate, Observation},
    provider::{self, WeatherProvider},
    store::ObservationStore,
};

/// The fetch-or-serve-from-cache pipeline.
///
/// Per lookup: ask the store for a nearby unexpired observation; on a miss
/// (or a store failure, which degrades to a miss) fetch from the provider,
/// normalize, persist best-effort and return. Only a provider failure
/// terminates the lookup with an error. No retries anywhere.
pub struct WeatherCache {
    provider: Box<dyn WeatherProvider>,
    store: Box<dyn ObservationStore>,
    ttl: Duration,
    radius_m: f64,
}

impl WeatherCache {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        store: Box<dyn ObservationStore>,
        ttl: Duration,
        radius_m: f64,
    ) -> Self {
        Self { provider, store, ttl, radius_m }
    }

    /// Current weather at `coord`, cached or fresh. Both paths return the
    /// same `Observation` shape.
    pub async fn lookup(&self, coord: Coordinate) -> Result<Observation, Error> {
        match self.store.find_within(coord, self.radius_m).await {
            Ok(Some(obs)) => {
                debug!(lon = coord.lon, lat = coord.lat, "serving cached observation");
                return Ok(obs);
            }
            Ok(None) => {}
            // Availability over cache fidelity: an unreachable store is a miss.
            Err(err) => {
                warn!(error = %err, "store lookup failed, treating as cache miss");
            }
        }

        let raw = self.provider.fetch_current(coord).await?;
        let obs = provider::normalize(&raw, Utc::now(), self.ttl)?;
        info!(lon = coord.lon, lat = coord.lat, "fetched fresh observation from provider");

        // Best-effort persistence: a store failure must not fail the lookup.
        if let Err(err) = self.store.insert(&obs).await {
            warn!(error = %err, "failed to persist observation");
        }

        Ok(obs)
    }
}
