use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    error::Error,
    model::{Coordinate, Observation},
    store::ObservationStore,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hosted observation store backed by Supabase (PostgREST RPC).
///
/// Relies on two database functions: `weather_within_radius(lon, lat,
/// radius_meters)` for the proximity query and `insert_weather_data(...)`
/// for inserts. The coordinate is a geospatially indexed column on the
/// server side; expiry is filtered again client-side so the read-time
/// TTL semantics do not depend on the SQL function's version.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    http: Client,
}

impl SupabaseStore {
    pub fn new(base_url: String, api_key: String) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for Supabase")?;

        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), api_key, http })
    }

    async fn rpc<A: Serialize>(&self, function: &str, args: &A) -> Result<String, Error> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);

        let res = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(args)
            .send()
            .await
            .map_err(|e| Error::store(format!("rpc {function} failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| Error::store(format!("rpc {function} body read failed: {e}")))?;

        if !status.is_success() {
            return Err(Error::store(format!("rpc {function} returned {status}: {body}")));
        }

        Ok(body)
    }
}

/// Flat row shape of the hosted `weather` table. The RPC functions take and
/// return this shape rather than the nested `Observation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeatherRow {
    weather_id: i64,
    weather_main: String,
    weather_description: String,
    temp: f64,
    feels_like: f64,
    visibility: Option<f64>,
    wind_speed: Option<f64>,
    deg: Option<f64>,
    gust: Option<f64>,
    rain_1h: Option<f64>,
    snow_1h: Option<f64>,
    clouds: Option<u8>,
    dt: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    lon: f64,
    lat: f64,
}

impl From<&Observation> for WeatherRow {
    fn from(obs: &Observation) -> Self {
        Self {
            weather_id: obs.weather_id,
            weather_main: obs.weather_main.clone(),
            weather_description: obs.weather_description.clone(),
            temp: obs.temp,
            feels_like: obs.feels_like,
            visibility: obs.visibility,
            wind_speed: obs.wind_speed,
            deg: obs.wind_deg,
            gust: obs.wind_gust,
            rain_1h: obs.rain_1h,
            snow_1h: obs.snow_1h,
            clouds: obs.clouds,
            dt: obs.observed_at,
            expires_at: obs.expires_at,
            lon: obs.coord.lon,
            lat: obs.coord.lat,
        }
    }
}

impl From<WeatherRow> for Observation {
    fn from(row: WeatherRow) -> Self {
        Self {
            weather_id: row.weather_id,
            weather_main: row.weather_main,
            weather_description: row.weather_description,
            temp: row.temp,
            feels_like: row.feels_like,
            visibility: row.visibility,
            wind_speed: row.wind_speed,
            wind_deg: row.deg,
            wind_gust: row.gust,
            rain_1h: row.rain_1h,
            snow_1h: row.snow_1h,
            clouds: row.clouds,
            observed_at: row.dt,
            expires_at: row.expires_at,
            coord: Coordinate::new(row.lon, row.lat),
        }
    }
}

#[derive(Debug, Serialize)]
struct RadiusArgs {
    lon: f64,
    lat: f64,
    radius_meters: f64,
}

#[async_trait]
impl ObservationStore for SupabaseStore {
    async fn find_within(
        &self,
        coord: Coordinate,
        radius_m: f64,
    ) -> Result<Option<Observation>, Error> {
        let args = RadiusArgs { lon: coord.lon, lat: coord.lat, radius_meters: radius_m };
        let body = self.rpc("weather_within_radius", &args).await?;

        let rows: Vec<WeatherRow> = serde_json::from_str(&body)
            .map_err(|e| Error::store(format!("weather_within_radius response: {e}")))?;

        let now = Utc::now();
        let nearest = rows
            .into_iter()
            .map(Observation::from)
            .filter(|obs| obs.is_fresh_at(now))
            .map(|obs| (obs.coord.distance_m(&coord), obs))
            .filter(|(d, _)| *d < radius_m)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, obs)| obs);

        Ok(nearest)
    }

    async fn insert(&self, obs: &Observation) -> Result<(), Error> {
        let row = WeatherRow::from(obs);
        self.rpc("insert_weather_data", &row).await?;
        Ok(())
    }
}
