//! Domain records and the wire shapes of the dashboard services.
//!
//! Climate payloads are not schema-validated upstream, so every numeric field
//! is read leniently here, once: numbers pass through, numeric strings are
//! parsed and everything else becomes `0.0`. Series are then aligned to their
//! label count. Nothing downstream needs to re-check.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ClimateError, Result};
use crate::projection::normalize_longitude;

/// Hourly payloads never carry more than one day.
pub const HOURS_PER_DAY: usize = 24;

/// The active location. Replaced wholesale on every selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    display_name: String,
}

impl Location {
    /// Latitude is clamped to [-90, 90] and longitude unwrapped into [-180, 180].
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Self {
        Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: normalize_longitude(longitude),
            display_name: display_name.into(),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Name used when reverse geocoding has nothing better.
    pub fn coordinates_label(latitude: f64, longitude: f64) -> String {
        format!("Location ({latitude:.2}, {longitude:.2})")
    }

    /// Same coordinates, whatever the name.
    pub fn same_place(&self, other: &Location) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimePeriod {
    #[default]
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7days")]
    SevenDay,
    #[serde(rename = "30days")]
    ThirtyDay,
    #[serde(rename = "year")]
    Year,
}

impl TimePeriod {
    /// Tag used on the wire and in the config file.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Today => "today",
            TimePeriod::SevenDay => "7days",
            TimePeriod::ThirtyDay => "30days",
            TimePeriod::Year => "year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimePeriod::Today => "Today",
            TimePeriod::SevenDay => "7 Days",
            TimePeriod::ThirtyDay => "30 Days",
            TimePeriod::Year => "1 Year",
        }
    }

    pub const fn all() -> &'static [TimePeriod] {
        &[
            TimePeriod::Today,
            TimePeriod::SevenDay,
            TimePeriod::ThirtyDay,
            TimePeriod::Year,
        ]
    }

    /// Parse a wire tag or one of its common spellings.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "today" | "1day" => Some(TimePeriod::Today),
            "7days" | "7day" | "7-day" | "week" => Some(TimePeriod::SevenDay),
            "30days" | "30day" | "30-day" | "month" => Some(TimePeriod::ThirtyDay),
            "year" | "1year" | "1-year" | "365days" => Some(TimePeriod::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TimePeriod {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        TimePeriod::from_wire(value).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown period '{value}'. Supported periods: today, 7days, 30days, year."
            )
        })
    }
}

/// Snapshot shown next to the charts for the Today view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConditions {
    #[serde(deserialize_with = "lenient_number")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub humidity: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub precipitation: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub windspeed: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub pm25: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub pm10: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct HourlySeries {
    #[serde(deserialize_with = "lenient_strings")]
    pub timestamps: Vec<String>,
    #[serde(deserialize_with = "lenient_hours")]
    pub hours: Vec<u32>,
    #[serde(deserialize_with = "lenient_series")]
    pub temperature: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub precipitation: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub humidity: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub windspeed: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub pm25: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub pm10: Vec<f64>,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    fn align(&mut self) {
        if self.hours.is_empty() {
            self.hours = self
                .timestamps
                .iter()
                .enumerate()
                .map(|(i, ts)| hour_of(ts).unwrap_or((i % HOURS_PER_DAY) as u32))
                .collect();
        }
        if self.hours.is_empty() {
            let n = self.temperature.len().min(HOURS_PER_DAY);
            self.hours = (0..n as u32).collect();
        }
        self.hours.truncate(HOURS_PER_DAY);

        let n = self.hours.len();
        self.timestamps.truncate(n);
        for series in [
            &mut self.temperature,
            &mut self.precipitation,
            &mut self.humidity,
            &mut self.windspeed,
            &mut self.pm25,
            &mut self.pm10,
        ] {
            series.resize(n, 0.0);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DailySeries {
    #[serde(deserialize_with = "lenient_dates")]
    pub dates: Vec<Option<NaiveDate>>,
    #[serde(deserialize_with = "lenient_strings")]
    pub day_names: Vec<String>,
    #[serde(deserialize_with = "lenient_series")]
    pub temp_max: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub temp_min: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub precipitation: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub windspeed: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub pm25: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub pm10: Vec<f64>,
    /// Chance of precipitation in percent.
    #[serde(alias = "precipitation_probability", deserialize_with = "lenient_series")]
    pub precipitation_prob: Vec<f64>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn align(&mut self) {
        let n = [self.dates.len(), self.day_names.len(), self.temp_max.len()]
            .into_iter()
            .find(|&n| n > 0)
            .unwrap_or(0);
        self.dates.resize(n, None);
        self.day_names.resize(n, String::new());
        for series in [
            &mut self.temp_max,
            &mut self.temp_min,
            &mut self.precipitation,
            &mut self.windspeed,
            &mut self.pm25,
            &mut self.pm10,
            &mut self.precipitation_prob,
        ] {
            series.resize(n, 0.0);
        }
    }
}

/// Aggregates over a labelled bucket (a week or a month).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BucketSeries {
    #[serde(alias = "weeks", alias = "months", deserialize_with = "lenient_strings")]
    pub labels: Vec<String>,
    #[serde(deserialize_with = "lenient_series")]
    pub temp_max: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub temp_min: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub precipitation: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub pm25: Vec<f64>,
    #[serde(deserialize_with = "lenient_series")]
    pub pm10: Vec<f64>,
}

impl BucketSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn align(&mut self) {
        if self.labels.is_empty() {
            self.labels = vec![String::new(); self.temp_max.len()];
        }
        let n = self.labels.len();
        for series in [
            &mut self.temp_max,
            &mut self.temp_min,
            &mut self.precipitation,
            &mut self.pm25,
            &mut self.pm10,
        ] {
            series.resize(n, 0.0);
        }
    }
}

/// Climate data whose shape depends on the period it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub enum ClimateDataPayload {
    /// Up to 24 hourly samples plus the current snapshot.
    Today {
        current: CurrentConditions,
        hourly: HourlySeries,
    },
    /// Seven daily aggregates.
    SevenDay(DailySeries),
    /// Four or five weekly aggregates.
    ThirtyDay(BucketSeries),
    /// Twelve monthly aggregates.
    Year(BucketSeries),
}

#[derive(Debug, Deserialize)]
struct PayloadWire {
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    current: Option<CurrentConditions>,
    #[serde(default)]
    hourly: Option<HourlySeries>,
    #[serde(default)]
    daily: Option<DailySeries>,
    #[serde(default)]
    weekly: Option<BucketSeries>,
    #[serde(default)]
    monthly: Option<BucketSeries>,
}

impl ClimateDataPayload {
    pub fn period(&self) -> TimePeriod {
        match self {
            ClimateDataPayload::Today { .. } => TimePeriod::Today,
            ClimateDataPayload::SevenDay(_) => TimePeriod::SevenDay,
            ClimateDataPayload::ThirtyDay(_) => TimePeriod::ThirtyDay,
            ClimateDataPayload::Year(_) => TimePeriod::Year,
        }
    }

    /// Number of samples (and therefore chart labels).
    pub fn len(&self) -> usize {
        match self {
            ClimateDataPayload::Today { hourly, .. } => hourly.len(),
            ClimateDataPayload::SevenDay(daily) => daily.len(),
            ClimateDataPayload::ThirtyDay(buckets) | ClimateDataPayload::Year(buckets) => {
                buckets.len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current(&self) -> Option<&CurrentConditions> {
        match self {
            ClimateDataPayload::Today { current, .. } => Some(current),
            _ => None,
        }
    }

    /// Decode and sanitize a climate-data response body.
    pub fn from_json(body: &str) -> Result<Self> {
        let wire: PayloadWire =
            serde_json::from_str(body).map_err(|source| ClimateError::ResponseParse {
                service: "climate data",
                source,
            })?;
        Self::from_wire(wire)
    }

    fn from_wire(wire: PayloadWire) -> Result<Self> {
        if let Some(message) = wire.error {
            return Err(ClimateError::Upstream(message));
        }

        let tag = wire
            .period
            .ok_or_else(|| ClimateError::InvalidPayload("missing period tag".to_string()))?;
        let period = TimePeriod::from_wire(&tag)
            .ok_or_else(|| ClimateError::InvalidPayload(format!("unknown period tag '{tag}'")))?;

        let missing = |section: &str| {
            ClimateError::InvalidPayload(format!("'{tag}' payload has no '{section}' section"))
        };

        let payload = match period {
            TimePeriod::Today => {
                let mut hourly = wire.hourly.ok_or_else(|| missing("hourly"))?;
                hourly.align();
                ClimateDataPayload::Today {
                    current: wire.current.unwrap_or_default(),
                    hourly,
                }
            }
            TimePeriod::SevenDay => {
                let mut daily = wire.daily.ok_or_else(|| missing("daily"))?;
                daily.align();
                ClimateDataPayload::SevenDay(daily)
            }
            TimePeriod::ThirtyDay => {
                let mut weekly = wire.weekly.ok_or_else(|| missing("weekly"))?;
                weekly.align();
                ClimateDataPayload::ThirtyDay(weekly)
            }
            TimePeriod::Year => {
                let mut monthly = wire.monthly.ok_or_else(|| missing("monthly"))?;
                monthly.align();
                ClimateDataPayload::Year(monthly)
            }
        };

        Ok(payload)
    }
}

/// One city search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(deserialize_with = "lenient_number")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub lon: f64,
    #[serde(default)]
    pub display_name: String,
}

impl CitySuggestion {
    /// "Name, State" when a state is known, else "Name, Country".
    pub fn display_name(&self) -> String {
        if !self.display_name.trim().is_empty() {
            return self.display_name.clone();
        }
        let region = self.state.as_deref().unwrap_or(&self.country);
        format!("{}, {}", self.name, region)
    }

    /// Full "Name, State, Country" line for result lists.
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }

    pub fn to_location(&self) -> Location {
        Location::new(self.lat, self.lon, self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReverseGeocode {
    #[serde(default)]
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Coerce any JSON value to a finite number, defaulting to `0.0`.
pub fn sanitize_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn hour_of(timestamp: &str) -> Option<u32> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.hour());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(timestamp, fmt).ok())
        .map(|dt| dt.hour())
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(sanitize_number(&Value::deserialize(deserializer)?))
}

fn lenient_series<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().map(sanitize_number).collect(),
        _ => Vec::new(),
    })
}

fn lenient_hours<'de, D>(deserializer: D) -> std::result::Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .map(|v| (sanitize_number(v).max(0.0) as u32) % HOURS_PER_DAY as u32)
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => String::new(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_dates<'de, D>(deserializer: D) -> std::result::Result<Vec<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str().and_then(|s| {
                    let day = s.get(..10).unwrap_or(s);
                    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
                })
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
