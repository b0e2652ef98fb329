use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A point on Earth's surface, longitude first to match the stored schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let r = 6_371_000.0_f64;
        let d2r = PI / 180.0_f64;
        let (phi1, phi2) = (self.lat * d2r, other.lat * d2r);
        let dphi = (other.lat - self.lat) * d2r;
        let dlambda = (other.lon - self.lon) * d2r;
        let a =
            (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * r * a.sqrt().asin()
    }
}

/// A normalized weather observation, as stored and as returned to callers.
///
/// Optional fields are `None` when the provider omitted them — "unknown",
/// never zero. Cache hits and fresh fetches return this same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Provider condition code (first entry of the condition list).
    pub weather_id: i64,
    /// Short condition label, e.g. "Clouds".
    pub weather_main: String,
    /// Long condition description, e.g. "overcast clouds".
    pub weather_description: String,

    /// Temperature in Celsius.
    pub temp: f64,
    /// Feels-like temperature in Celsius.
    pub feels_like: f64,

    /// Visibility in meters.
    pub visibility: Option<f64>,
    /// Wind speed in m/s.
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees.
    pub wind_deg: Option<f64>,
    /// Wind gust in m/s.
    pub wind_gust: Option<f64>,
    /// Rain volume over the last hour, mm.
    pub rain_1h: Option<f64>,
    /// Snow volume over the last hour, mm.
    pub snow_1h: Option<f64>,
    /// Cloud cover percentage.
    pub clouds: Option<u8>,

    /// When the provider took the observation.
    pub observed_at: DateTime<Utc>,
    /// When this record stops being servable from the store.
    pub expires_at: DateTime<Utc>,

    pub coord: Coordinate,
}

impl Observation {
    /// Whether this record may still be served at `now`.
    ///
    /// Expiry is enforced at read time only; expired rows are never deleted.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}
