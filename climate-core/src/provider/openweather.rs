use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{ClimateError, Result},
    model::{CitySuggestion, ReverseGeocode},
    projection::normalize_longitude,
    provider::truncate_body,
};

use super::Geocoder;

/// Geocoding straight against OpenWeather, bypassing the backend.
#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    api_key: String,
    http: Client,
}

impl OpenWeatherGeocoder {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
        }
    }

    async fn fetch_places(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<OwPlace>> {
        let mut params: Vec<(&str, String)> = query.to_vec();
        params.push(("appid", self.api_key.clone()));

        let res = self.http.get(url).query(&params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ClimateError::Status {
                service: "OpenWeather geocoding",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ClimateError::ResponseParse {
            service: "OpenWeather geocoding",
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    country: String,
    #[serde(default)]
    state: Option<String>,
    lat: f64,
    lon: f64,
}

impl OwPlace {
    fn into_suggestion(self) -> CitySuggestion {
        let state = self.state.filter(|s| !s.trim().is_empty());
        let display_name = format!("{}, {}", self.name, state.as_deref().unwrap_or(&self.country));
        CitySuggestion {
            name: self.name,
            state,
            country: self.country,
            lat: self.lat,
            lon: self.lon,
            display_name,
        }
    }
}

#[async_trait]
impl Geocoder for OpenWeatherGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>> {
        let places = self
            .fetch_places(
                "https://api.openweathermap.org/geo/1.0/direct",
                &[("q", query.to_string()), ("limit", "10".to_string())],
            )
            .await?;

        Ok(places.into_iter().map(OwPlace::into_suggestion).collect())
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocode> {
        let lon = normalize_longitude(lon);
        let places = self
            .fetch_places(
                "https://api.openweathermap.org/geo/1.0/reverse",
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| ClimateError::NoMatch(format!("{lat:.2}, {lon:.2}")))?;
        let suggestion = place.into_suggestion();

        Ok(ReverseGeocode {
            name: suggestion.name,
            display_name: suggestion.display_name,
        })
    }
}
