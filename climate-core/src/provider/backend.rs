use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{ClimateError, Result},
    model::{ChatRequest, ChatResponse, CitySuggestion, ClimateDataPayload, ReverseGeocode},
    projection::normalize_longitude,
    provider::truncate_body,
    view::ClimateRequest,
};

use super::{Assistant, ClimateSource, Geocoder};

/// Client for the dashboard backend's JSON API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(
        &self,
        service: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<String> {
        debug!("GET {}{} {:?}", self.base_url, path, query);

        let res = self.http.get(self.url(path)).query(query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        check_status(service, status, body)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Non-success answers that still carry `{"error": ...}` are domain errors.
fn check_status(
    service: &'static str,
    status: reqwest::StatusCode,
    body: String,
) -> Result<String> {
    if status.is_success() {
        return Ok(body);
    }

    if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(&body) {
        return Err(ClimateError::Upstream(error));
    }

    Err(ClimateError::Status {
        service,
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

fn parse<T: DeserializeOwned>(service: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| ClimateError::ResponseParse { service, source })
}

#[async_trait]
impl Geocoder for BackendClient {
    async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>> {
        let body = self
            .get("city search", "/api/search-cities", &[("q", query.to_string())])
            .await?;
        parse("city search", &body)
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocode> {
        let body = self
            .get(
                "reverse geocoding",
                "/api/location-from-coords",
                &[
                    ("lat", lat.to_string()),
                    ("lon", normalize_longitude(lon).to_string()),
                ],
            )
            .await?;
        parse("reverse geocoding", &body)
    }
}

#[async_trait]
impl ClimateSource for BackendClient {
    async fn fetch(&self, request: &ClimateRequest) -> Result<ClimateDataPayload> {
        let body = self
            .get(
                "climate data",
                "/api/climate-data",
                &[
                    ("lat", request.location.latitude().to_string()),
                    ("lon", request.location.longitude().to_string()),
                    ("period", request.period.as_str().to_string()),
                ],
            )
            .await?;
        ClimateDataPayload::from_json(&body)
    }
}

#[async_trait]
impl Assistant for BackendClient {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!("POST {}/api/chat", self.base_url);

        let res = self.http.post(self.url("/api/chat")).json(request).send().await?;

        let status = res.status();
        let body = res.text().await?;

        let body = check_status("assistant", status, body)?;
        parse("assistant", &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = BackendClient::new("http://localhost:5000/".to_string());
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/api/chat"), "http://localhost:5000/api/chat");
    }

    #[test]
    fn error_body_becomes_upstream_error() {
        let err = check_status(
            "climate data",
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error": "Failed to fetch climate data"}"#.to_string(),
        )
        .unwrap_err();
        assert!(
            matches!(err, ClimateError::Upstream(ref m) if m == "Failed to fetch climate data")
        );
    }

    #[test]
    fn plain_failure_keeps_status() {
        let err = check_status("city search", StatusCode::BAD_GATEWAY, "<html>".to_string())
            .unwrap_err();
        assert!(matches!(err, ClimateError::Status { status: 502, .. }));
        assert!(err.to_string().contains("city search"));
    }

    #[test]
    fn search_results_parse() {
        let body = r#"[{"name": "Paris", "country": "FR", "state": "", "lat": 48.85, "lon": 2.35,
                        "display_name": "Paris, FR"}]"#;
        let cities: Vec<CitySuggestion> = parse("city search", body).expect("valid list");
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].display_name(), "Paris, FR");
    }
}
