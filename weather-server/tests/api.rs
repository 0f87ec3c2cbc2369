//! End-to-end tests of the HTTP API with a stub weather provider.

use async_trait::async_trait;
use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use weather_core::{
    AuthToken, AverageWeather, CurrentWeather, ProviderError, TemperatureUnit, WeatherProvider,
};
use weather_server::{AppState, TokenIssuer, router};

const KNOWN_ZIP: &str = "10001";
const UNKNOWN_ZIP: &str = "99999";
const BROKEN_ZIP: &str = "50000";

#[derive(Debug)]
struct StubProvider;

impl StubProvider {
    fn check(zip: &str) -> Result<bool, ProviderError> {
        match zip {
            KNOWN_ZIP => Ok(true),
            BROKEN_ZIP => Err(ProviderError::weather(
                zip,
                anyhow::anyhow!("upstream returned 502"),
            )),
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn current_weather(
        &self,
        zip: &str,
        unit: TemperatureUnit,
    ) -> Result<Option<CurrentWeather>, ProviderError> {
        Ok(Self::check(zip)?.then(|| CurrentWeather {
            temperature: unit.convert(293.15),
            unit,
            latitude: 40.75,
            longitude: -73.99,
            rain_possible_today: true,
        }))
    }

    async fn average_weather(
        &self,
        zip: &str,
        period_days: u32,
        unit: TemperatureUnit,
    ) -> Result<Option<AverageWeather>, ProviderError> {
        Ok(Self::check(zip)?.then(|| AverageWeather {
            average_temperature: unit.convert(290.15 + period_days as f64),
            unit,
            latitude: 40.75,
            longitude: -73.99,
            rain_possible_in_period: false,
        }))
    }
}

struct TestServer {
    base: String,
    http: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let tokens = TokenIssuer::new(Duration::hours(1), Duration::days(1));
        let state = AppState::new(Arc::new(StubProvider), tokens);

        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            http: reqwest::Client::new(),
        }
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str, token: Option<&AuthToken>) -> reqwest::Response {
        let mut req = self.http.get(format!("{}{}", self.base, path));
        if let Some(token) = token {
            req = req.bearer_auth(&token.access_token);
        }
        req.send().await.unwrap()
    }

    async fn login(&self) -> AuthToken {
        let creds = json!({ "email": "user@example.com", "password": "hunter22" });
        let res = self.post("/register", creds.clone()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = self.post("/login", creds).await;
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }
}

#[tokio::test]
async fn current_weather_requires_bearer_token() {
    let server = TestServer::start().await;

    let res = server.get("/v1/Weather/Current/10001?units=C", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let bogus = AuthToken::bearer("nope", "nope", 60);
    let res = server.get("/v1/Weather/Current/10001?units=C", Some(&bogus)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_weather_success() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let res = server.get("/v1/Weather/Current/10001?units=C", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["unit"], "C");
    assert_eq!(body["rainPossibleToday"], true);
    assert!((body["temperature"].as_f64().unwrap() - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn average_weather_success() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let res = server
        .get("/v1/Weather/Average/10001?units=F&timePeriod=3", Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: AverageWeather = res.json().await.unwrap();
    assert_eq!(body.unit, TemperatureUnit::Fahrenheit);
    assert!((body.average_temperature - 68.0).abs() < 1e-9);
    assert!(!body.rain_possible_in_period);
}

#[tokio::test]
async fn validation_failures_are_bad_requests() {
    let server = TestServer::start().await;
    let token = server.login().await;

    for path in [
        "/v1/Weather/Current/1234?units=C",
        "/v1/Weather/Current/10001?units=K",
        "/v1/Weather/Current/10001",
        "/v1/Weather/Average/10001?units=C&timePeriod=1",
        "/v1/Weather/Average/10001?units=C&timePeriod=6",
        "/v1/Weather/Average/10001?units=C",
    ] {
        let res = server.get(path, Some(&token)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string());
        assert_eq!(body["kind"], "validation", "{path}");
    }
}

#[tokio::test]
async fn unknown_zip_is_a_bad_request() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let res = server
        .get(&format!("/v1/Weather/Current/{UNKNOWN_ZIP}?units=C"), Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains(UNKNOWN_ZIP));
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn provider_failure_is_a_server_error() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let res = server
        .get(&format!("/v1/Weather/Average/{BROKEN_ZIP}?units=C&timePeriod=2"), Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Error retrieving weather for zip code 50000");
}

#[tokio::test]
async fn refresh_issues_a_working_token() {
    let server = TestServer::start().await;
    let token = server.login().await;

    let res = server
        .post("/refresh", json!({ "refreshToken": token.refresh_token }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let refreshed: AuthToken = res.json().await.unwrap();

    let res = server.get("/v1/Weather/Current/10001?units=F", Some(&refreshed)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .post("/refresh", json!({ "refreshToken": token.refresh_token }))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let server = TestServer::start().await;
    server.login().await;

    let res = server
        .post("/register", json!({ "email": "user@example.com", "password": "another1" }))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server
        .post("/register", json!({ "email": "not-an-email", "password": "another1" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/login", json!({ "email": "user@example.com", "password": "wrong-password" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
