//! End-to-end tests for the cache lookup pipeline against a mock
//! OpenWeather server.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wxcache_core::provider::OpenWeatherProvider;
use wxcache_core::store::MemoryStore;
use wxcache_core::{Coordinate, Error, Observation, ObservationStore, WeatherCache};

const TTL_SECS: i64 = 1200;
const RADIUS_M: f64 = 5000.0;

fn london_payload() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1, "lat": 51.5 },
        "weather": [
            { "id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d" }
        ],
        "base": "stations",
        "main": {
            "temp": 15.2, "feels_like": 14.8, "temp_min": 13.0, "temp_max": 16.1,
            "pressure": 1012, "humidity": 81
        },
        "wind": { "speed": 3.1 },
        "clouds": { "all": 90 },
        "dt": 1_700_000_000,
        "sys": { "country": "GB", "sunrise": 1_699_970_000, "sunset": 1_700_003_000 },
        "timezone": 0,
        "id": 2_643_743,
        "name": "London",
        "cod": 200
    })
}

/// Store handle the test can keep inspecting after the cache takes ownership.
#[derive(Debug, Clone)]
struct SharedStore(Arc<MemoryStore>);

#[async_trait]
impl ObservationStore for SharedStore {
    async fn find_within(
        &self,
        coord: Coordinate,
        radius_m: f64,
    ) -> Result<Option<Observation>, Error> {
        self.0.find_within(coord, radius_m).await
    }

    async fn insert(&self, obs: &Observation) -> Result<(), Error> {
        self.0.insert(obs).await
    }
}

/// Store whose operations can be made to fail on demand.
#[derive(Debug)]
struct FlakyStore {
    inner: Arc<MemoryStore>,
    fail_find: bool,
    fail_insert: bool,
}

#[async_trait]
impl ObservationStore for FlakyStore {
    async fn find_within(
        &self,
        coord: Coordinate,
        radius_m: f64,
    ) -> Result<Option<Observation>, Error> {
        if self.fail_find {
            return Err(Error::store("connection refused"));
        }
        self.inner.find_within(coord, radius_m).await
    }

    async fn insert(&self, obs: &Observation) -> Result<(), Error> {
        if self.fail_insert {
            return Err(Error::store("connection refused"));
        }
        self.inner.insert(obs).await
    }
}

fn cache_with(server: &MockServer, store: Box<dyn ObservationStore>) -> WeatherCache {
    let provider = OpenWeatherProvider::with_base_url("TESTKEY".to_string(), server.uri())
        .expect("provider must build");
    WeatherCache::new(Box::new(provider), store, Duration::seconds(TTL_SECS), RADIUS_M)
}

#[tokio::test]
async fn fresh_fetch_normalizes_provider_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "TESTKEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_payload()))
        .mount(&server)
        .await;

    let cache = cache_with(&server, Box::new(MemoryStore::new()));
    let before = Utc::now();
    let obs = cache.lookup(Coordinate::new(-0.1, 51.5)).await.unwrap();
    let after = Utc::now();

    assert_eq!(obs.temp, 15.2);
    assert_eq!(obs.weather_main, "Clouds");
    assert_eq!(obs.weather_description, "overcast clouds");
    assert_eq!(obs.wind_speed, Some(3.1));
    assert_eq!(obs.rain_1h, None);
    assert_eq!(obs.snow_1h, None);
    assert_eq!(obs.observed_at.timestamp(), 1_700_000_000);
    // expires_at = fetch time + TTL.
    assert!(obs.expires_at >= before + Duration::seconds(TTL_SECS));
    assert!(obs.expires_at <= after + Duration::seconds(TTL_SECS));
}

#[tokio::test]
async fn second_lookup_is_served_from_the_store() {
    let server = MockServer::start().await;

    // The provider must be called exactly once; the repeat lookup is a hit.
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let cache = cache_with(&server, Box::new(SharedStore(store.clone())));

    let coord = Coordinate::new(-0.1, 51.5);
    let first = cache.lookup(coord).await.unwrap();
    assert_eq!(store.len().await, 1);

    let second = cache.lookup(coord).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.len().await, 1);

    server.verify().await;
}

#[tokio::test]
async fn nearby_lookup_hits_the_same_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache_with(&server, Box::new(MemoryStore::new()));

    cache.lookup(Coordinate::new(-0.1, 51.5)).await.unwrap();
    // ~700 m away, well inside the 5 km radius.
    let nearby = cache.lookup(Coordinate::new(-0.11, 51.5)).await.unwrap();
    assert_eq!(nearby.coord, Coordinate::new(-0.1, 51.5));

    server.verify().await;
}

#[tokio::test]
async fn provider_failure_surfaces_and_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let cache = cache_with(&server, Box::new(SharedStore(store.clone())));

    let err = cache.lookup(Coordinate::new(-0.1, 51.5)).await.unwrap_err();
    match err {
        Error::Provider { message } => assert_eq!(message, "city not found"),
        other => panic!("expected provider error, got {other:?}"),
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn store_lookup_failure_degrades_to_a_miss() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let store = FlakyStore {
        inner: Arc::new(MemoryStore::new()),
        fail_find: true,
        fail_insert: false,
    };
    let cache = cache_with(&server, Box::new(store));

    // Unreachable store must not abort the lookup.
    let obs = cache.lookup(Coordinate::new(-0.1, 51.5)).await.unwrap();
    assert_eq!(obs.temp, 15.2);
}

#[tokio::test]
async fn persistence_failure_never_fails_the_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_payload()))
        .mount(&server)
        .await;

    let store = FlakyStore {
        inner: Arc::new(MemoryStore::new()),
        fail_find: false,
        fail_insert: true,
    };
    let cache = cache_with(&server, Box::new(store));

    let obs = cache.lookup(Coordinate::new(-0.1, 51.5)).await.unwrap();
    assert_eq!(obs.weather_main, "Clouds");
}
