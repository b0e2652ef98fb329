use crate::{
    error::Error,
    model::{Coordinate, Observation},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Abstraction over the external weather provider.
///
/// Implementations fetch the raw payload only; normalization happens once,
/// in [`normalize`], so every provider goes through the same validation.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, coord: Coordinate) -> Result<RawObservation, Error>;
}

/// Status code marking a successful provider response.
pub const PROVIDER_SUCCESS: i64 = 200;

/// The provider's current-weather payload, as received over the wire.
///
/// Untrusted input: [`normalize`] validates the `cod` field before any
/// `Observation` is built from it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    pub coord: RawCoord,
    pub weather: Vec<RawCondition>,
    pub main: RawMain,
    pub visibility: Option<f64>,
    pub wind: Option<RawWind>,
    pub rain: Option<RawPrecipitation>,
    pub snow: Option<RawPrecipitation>,
    pub clouds: Option<RawClouds>,
    /// Observation time, UNIX seconds.
    pub dt: i64,
    pub cod: StatusCode,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawCoord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub id: i64,
    pub main: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawMain {
    pub temp: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawWind {
    pub speed: Option<f64>,
    pub deg: Option<f64>,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawPrecipitation {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawClouds {
    pub all: u8,
}

/// OpenWeather sends `cod` as a number on success and as a string on most
/// error payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Num(i64),
    Str(String),
}

impl StatusCode {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StatusCode::Num(n) => Some(*n),
            StatusCode::Str(s) => s.parse().ok(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.as_i64() == Some(PROVIDER_SUCCESS)
    }
}

/// Convert a raw payload into the canonical stored record.
///
/// Fails closed: a payload whose `cod` is not 200 never produces an
/// `Observation`. Absent optional source fields map to `None`, not zero.
/// `expires_at` is `now + ttl`; `observed_at` comes from the provider's
/// UNIX-seconds `dt` field.
pub fn normalize(
    raw: &RawObservation,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<Observation, Error> {
    if !raw.cod.is_success() {
        let message = raw.message.clone().unwrap_or_else(|| "location not found".to_string());
        return Err(Error::provider(message));
    }

    let condition = raw
        .weather
        .first()
        .ok_or_else(|| Error::provider("response contained no weather condition"))?;

    let observed_at = DateTime::<Utc>::from_timestamp(raw.dt, 0).unwrap_or(now);

    Ok(Observation {
        weather_id: condition.id,
        weather_main: condition.main.clone(),
        weather_description: condition.description.clone(),
        temp: raw.main.temp,
        feels_like: raw.main.feels_like,
        visibility: raw.visibility,
        wind_speed: raw.wind.and_then(|w| w.speed),
        wind_deg: raw.wind.and_then(|w| w.deg),
        wind_gust: raw.wind.and_then(|w| w.gust),
        rain_1h: raw.rain.and_then(|r| r.one_hour),
        snow_1h: raw.snow.and_then(|s| s.one_hour),
        clouds: raw.clouds.map(|c| c.all),
        observed_at,
        expires_at: now + ttl,
        coord: Coordinate::new(raw.coord.lon, raw.coord.lat),
    })
}
