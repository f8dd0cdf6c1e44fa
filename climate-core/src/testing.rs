//! Fixtures and in-process fakes for the unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as Days, NaiveDate};

use crate::error::{ClimateError, Result};
use crate::model::{
    BucketSeries, ChatRequest, ChatResponse, CitySuggestion, ClimateDataPayload, CurrentConditions,
    DailySeries, HourlySeries, ReverseGeocode, TimePeriod,
};
use crate::provider::{Assistant, ClimateSource, Geocoder};
use crate::view::ClimateRequest;

pub(crate) fn today_payload(hours: usize) -> ClimateDataPayload {
    let n = hours as u32;
    ClimateDataPayload::Today {
        current: CurrentConditions {
            temperature: 21.4,
            humidity: 60.0,
            precipitation: 0.0,
            windspeed: 12.0,
            pm25: 18.0,
            pm10: 25.0,
        },
        hourly: HourlySeries {
            timestamps: Vec::new(),
            hours: (0..n).collect(),
            temperature: (0..n).map(|h| 15.0 + f64::from(h) * 0.5).collect(),
            precipitation: (0..n).map(|h| if h % 6 == 0 { 1.2 } else { 0.0 }).collect(),
            humidity: vec![60.0; hours],
            windspeed: vec![10.0; hours],
            pm25: (0..n).map(|h| f64::from(h) * 7.0).collect(),
            pm10: (0..n).map(|h| f64::from(h) * 9.0).collect(),
        },
    }
}

pub(crate) fn daily_payload(start: NaiveDate, days: usize) -> ClimateDataPayload {
    ClimateDataPayload::SevenDay(DailySeries {
        dates: (0..days).map(|i| Some(start + Days::days(i as i64))).collect(),
        day_names: vec![String::new(); days],
        temp_max: vec![24.0; days],
        temp_min: vec![14.0; days],
        precipitation: vec![2.5; days],
        windspeed: vec![9.0; days],
        pm25: vec![20.0; days],
        pm10: vec![30.0; days],
        precipitation_prob: (0..days).map(|i| (i * 15) as f64).collect(),
    })
}

/// Weekly buckets get blank labels, monthly ones `2024-MM`.
pub(crate) fn bucket_payload(period: TimePeriod, buckets: usize) -> ClimateDataPayload {
    let labels = match period {
        TimePeriod::Year => (1..=buckets).map(|m| format!("2024-{m:02}")).collect(),
        _ => vec![String::new(); buckets],
    };
    let series = BucketSeries {
        labels,
        temp_max: vec![22.0; buckets],
        temp_min: vec![8.0; buckets],
        precipitation: vec![40.0; buckets],
        pm25: vec![18.0; buckets],
        pm10: vec![28.0; buckets],
    };
    match period {
        TimePeriod::Year => ClimateDataPayload::Year(series),
        _ => ClimateDataPayload::ThirtyDay(series),
    }
}

pub(crate) fn payload_for(period: TimePeriod) -> ClimateDataPayload {
    match period {
        TimePeriod::Today => today_payload(24),
        TimePeriod::SevenDay => {
            daily_payload(NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"), 7)
        }
        TimePeriod::ThirtyDay => bucket_payload(period, 4),
        TimePeriod::Year => bucket_payload(period, 12),
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeGeocoder {
    pub cities: Vec<CitySuggestion>,
    pub reverse_name: Option<String>,
    pub reverse_delay: Option<Duration>,
    /// Shared so tests can count calls after the fake is boxed.
    pub searches: Arc<AtomicUsize>,
}

impl FakeGeocoder {
    pub fn with_city(name: &str, country: &str, lat: f64, lon: f64) -> Self {
        Self {
            cities: vec![CitySuggestion {
                name: name.to_string(),
                state: None,
                country: country.to_string(),
                lat,
                lon,
                display_name: String::new(),
            }],
            reverse_name: Some(format!("{name}, {country}")),
            ..Self::default()
        }
    }

    pub fn with_reverse_delay(mut self, delay: Duration) -> Self {
        self.reverse_delay = Some(delay);
        self
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn search(&self, _query: &str) -> Result<Vec<CitySuggestion>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.cities.clone())
    }

    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<ReverseGeocode> {
        if let Some(delay) = self.reverse_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reverse_name {
            Some(name) => Ok(ReverseGeocode {
                name: name.clone(),
                display_name: name.clone(),
            }),
            None => Err(ClimateError::NoMatch("reverse".to_string())),
        }
    }
}

/// Serves canned payloads, optionally after a per-period delay.
#[derive(Debug, Default)]
pub(crate) struct FakeClimate {
    pub delays: HashMap<TimePeriod, Duration>,
    pub fail_with: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeClimate {
    pub fn with_delay(mut self, period: TimePeriod, delay: Duration) -> Self {
        self.delays.insert(period, delay);
        self
    }
}

#[async_trait]
impl ClimateSource for FakeClimate {
    async fn fetch(&self, request: &ClimateRequest) -> Result<ClimateDataPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&request.period) {
            tokio::time::sleep(*delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(ClimateError::Upstream(message.clone())),
            None => Ok(payload_for(request.period)),
        }
    }
}

/// Replies with the message and the location it was asked about.
#[derive(Debug, Default)]
pub(crate) struct EchoAssistant;

#[async_trait]
impl Assistant for EchoAssistant {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let place = request.location.as_deref().unwrap_or("nowhere");
        let context = if request.weather_data.is_some() { "with data" } else { "no data" };
        Ok(ChatResponse {
            response: format!("echo: {} @ {place} ({context})", request.message),
        })
    }
}
