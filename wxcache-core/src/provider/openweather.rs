use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::Error,
    model::Coordinate,
    provider::{RawObservation, StatusCode},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeather current-weather client.
///
/// Requests metric units. The outbound call carries a bounded timeout so a
/// stalled provider cannot hang a lookup indefinitely.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the provider at a different base URL (used by tests).
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self { api_key, base_url, http })
    }
}

/// Minimal view of a provider payload, enough to read the status code
/// before committing to the full shape. Error bodies carry only
/// `cod` and `message`.
#[derive(Debug, Deserialize)]
struct OwStatus {
    cod: StatusCode,
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, coord: Coordinate) -> Result<RawObservation, Error> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coord.lat.to_string().as_str()),
                ("lon", coord.lon.to_string().as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(Error::ProviderUnreachable)?;

        let body = res.text().await.map_err(Error::ProviderUnreachable)?;

        // Error payloads ({"cod":"404","message":"city not found"}) do not
        // match the full RawObservation shape, so check the status first.
        let status: OwStatus = serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse OpenWeather response: {}", truncate_body(&body))
        })?;

        if !status.cod.is_success() {
            let message =
                status.message.unwrap_or_else(|| "location not found".to_string());
            return Err(Error::provider(message));
        }

        let raw: RawObservation = serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse OpenWeather current JSON: {}", truncate_body(&body))
        })?;

        Ok(raw)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("abc"), "abc");
    }

    #[test]
    fn truncate_body_cuts_long_bodies() {
        let long = "x".repeat(500);
        let cut = truncate_body(&long);
        assert_eq!(cut.len(), 203);
        assert!(cut.ends_with("..."));
    }
}
