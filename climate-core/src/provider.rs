use crate::{
    Config,
    error::Result,
    model::{ChatRequest, ChatResponse, CitySuggestion, ClimateDataPayload, ReverseGeocode},
    provider::{backend::BackendClient, openweather::OpenWeatherGeocoder},
    view::ClimateRequest,
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod backend;
pub mod openweather;

/// Queries shorter than this never reach the network.
pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeocoderId {
    Backend,
    OpenWeather,
}

impl GeocoderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocoderId::Backend => "backend",
            GeocoderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [GeocoderId] {
        &[GeocoderId::Backend, GeocoderId::OpenWeather]
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, GeocoderId::OpenWeather)
    }
}

impl std::fmt::Display for GeocoderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for GeocoderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "backend" => Ok(GeocoderId::Backend),
            "openweather" => Ok(GeocoderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown geocoder '{value}'. Supported geocoders: backend, openweather."
            )),
        }
    }
}

/// City search and reverse geocoding.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>>;

    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocode>;
}

/// Period-tagged climate data for a location.
#[async_trait]
pub trait ClimateSource: Send + Sync + Debug {
    async fn fetch(&self, request: &ClimateRequest) -> Result<ClimateDataPayload>;
}

/// Free-text assistant that answers questions about the displayed data.
#[async_trait]
pub trait Assistant: Send + Sync + Debug {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Construct a geocoder from config and explicit GeocoderId.
pub fn geocoder_from_config(id: GeocoderId, config: &Config) -> anyhow::Result<Box<dyn Geocoder>> {
    let boxed: Box<dyn Geocoder> = match id {
        GeocoderId::Backend => Box::new(BackendClient::new(config.backend.base_url.clone())),
        GeocoderId::OpenWeather => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for geocoder '{id}'.\n\
                         Hint: run `climate configure` and enter your API key."
                )
            })?;
            Box::new(OpenWeatherGeocoder::new(api_key.to_owned()))
        }
    };

    Ok(boxed)
}

/// Construct the default geocoder from config, using `default_geocoder` field.
pub fn default_geocoder_from_config(config: &Config) -> anyhow::Result<Box<dyn Geocoder>> {
    let id = config.default_geocoder_id()?;
    geocoder_from_config(id, config)
}

/// The climate-data endpoint lives on the dashboard backend.
pub fn climate_source_from_config(config: &Config) -> Arc<dyn ClimateSource> {
    Arc::new(BackendClient::new(config.backend.base_url.clone()))
}

pub fn assistant_from_config(config: &Config) -> Box<dyn Assistant> {
    Box::new(BackendClient::new(config.backend.base_url.clone()))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn geocoder_id_as_str_roundtrip() {
        for id in GeocoderId::all() {
            let s = id.as_str();
            let parsed = GeocoderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_geocoder_error() {
        let err = GeocoderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown geocoder"));
    }

    #[test]
    fn openweather_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = geocoder_from_config(GeocoderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for geocoder"));
    }

    #[test]
    fn default_geocoder_is_backend_without_config() {
        let cfg = Config::default();
        assert!(default_geocoder_from_config(&cfg).is_ok());
    }

    #[test]
    fn default_geocoder_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(GeocoderId::OpenWeather, "KEY".to_string());

        let geocoder = default_geocoder_from_config(&cfg);
        assert!(geocoder.is_ok());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
