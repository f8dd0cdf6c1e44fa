//! Renderer-agnostic chart descriptors built from climate payloads.

use chrono::{Datelike, Duration, Month, NaiveDate};
use serde::Serialize;

use crate::aqi::AqiBand;
use crate::model::{BucketSeries, ClimateDataPayload, CurrentConditions, DailySeries, HourlySeries};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

const BLUE: Rgba = Rgba::opaque(63, 135, 234);
const GREEN: Rgba = Rgba::opaque(34, 197, 94);
const AMBER: Rgba = Rgba::opaque(245, 158, 11);
const RED: Rgba = Rgba::opaque(239, 68, 68);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ColorPolicy {
    /// One colour for the whole series.
    Fixed { color: Rgba },
    /// One colour per value, same length as the values.
    PerValue { colors: Vec<Rgba> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    pub color: ColorPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Temperature,
    Precipitation,
    AirQuality,
    AqiHeatmap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescriptor {
    pub kind: ChartKind,
    pub title: String,
    pub series_type: SeriesType,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

/// The narrow drawing surface a chart library or terminal implements.
pub trait ChartRenderer {
    fn draw(&mut self, charts: &[ChartDescriptor]);

    fn draw_current(&mut self, _current: &CurrentConditions) {}
}

/// Build every chart for a payload. `today` anchors the "Today"/"Tomorrow"
/// daily labels.
pub fn build(payload: &ClimateDataPayload, today: NaiveDate) -> Vec<ChartDescriptor> {
    match payload {
        ClimateDataPayload::Today { hourly, .. } => build_hourly(hourly),
        ClimateDataPayload::SevenDay(daily) => build_daily(daily, today),
        ClimateDataPayload::ThirtyDay(weekly) => {
            let labels = (0..weekly.len()).map(|i| week_label(i, &weekly.labels[i])).collect();
            build_buckets(weekly, labels)
        }
        ClimateDataPayload::Year(monthly) => {
            let labels = monthly
                .labels
                .iter()
                .enumerate()
                .map(|(i, raw)| month_label(i, raw))
                .collect();
            build_buckets(monthly, labels)
        }
    }
}

fn build_hourly(hourly: &HourlySeries) -> Vec<ChartDescriptor> {
    let labels: Vec<String> = hourly.hours.iter().map(|h| hour_label(*h)).collect();

    vec![
        ChartDescriptor {
            kind: ChartKind::Temperature,
            title: "Temperature".to_string(),
            series_type: SeriesType::Line,
            series: vec![fixed("Temperature (°C)", &hourly.temperature, labels.len(), BLUE)],
            labels: labels.clone(),
        },
        precipitation_chart(&hourly.precipitation, labels.clone()),
        air_quality_chart(&hourly.pm25, &hourly.pm10, labels.clone(), SeriesType::Line),
        heatmap_chart(&hourly.pm25, labels),
    ]
}

fn build_daily(daily: &DailySeries, today: NaiveDate) -> Vec<ChartDescriptor> {
    let labels: Vec<String> = daily
        .dates
        .iter()
        .enumerate()
        .map(|(i, date)| day_label(*date, daily.day_names.get(i).map(String::as_str), i, today))
        .collect();

    vec![
        temperature_range_chart(&daily.temp_max, &daily.temp_min, labels.clone()),
        precipitation_chart(&daily.precipitation, labels.clone()),
        air_quality_chart(&daily.pm25, &daily.pm10, labels.clone(), SeriesType::Bar),
        heatmap_chart(&daily.pm25, labels),
    ]
}

fn build_buckets(buckets: &BucketSeries, labels: Vec<String>) -> Vec<ChartDescriptor> {
    vec![
        temperature_range_chart(&buckets.temp_max, &buckets.temp_min, labels.clone()),
        precipitation_chart(&buckets.precipitation, labels.clone()),
        air_quality_chart(&buckets.pm25, &buckets.pm10, labels.clone(), SeriesType::Bar),
        heatmap_chart(&buckets.pm25, labels),
    ]
}

fn temperature_range_chart(max: &[f64], min: &[f64], labels: Vec<String>) -> ChartDescriptor {
    let n = labels.len();
    ChartDescriptor {
        kind: ChartKind::Temperature,
        title: "Temperature".to_string(),
        series_type: SeriesType::Line,
        labels,
        series: vec![
            fixed("Max Temp (°C)", max, n, RED),
            fixed("Min Temp (°C)", min, n, BLUE),
        ],
    }
}

fn precipitation_chart(values: &[f64], labels: Vec<String>) -> ChartDescriptor {
    let n = labels.len();
    ChartDescriptor {
        kind: ChartKind::Precipitation,
        title: "Precipitation".to_string(),
        series_type: SeriesType::Bar,
        labels,
        series: vec![fixed("Precipitation (mm)", values, n, GREEN)],
    }
}

fn air_quality_chart(
    pm25: &[f64],
    pm10: &[f64],
    labels: Vec<String>,
    series_type: SeriesType,
) -> ChartDescriptor {
    let n = labels.len();
    ChartDescriptor {
        kind: ChartKind::AirQuality,
        title: "Air Quality".to_string(),
        series_type,
        labels,
        series: vec![
            fixed("PM2.5 (μg/m³)", pm25, n, AMBER),
            fixed("PM10 (μg/m³)", pm10, n, RED),
        ],
    }
}

fn heatmap_chart(pm25: &[f64], labels: Vec<String>) -> ChartDescriptor {
    let values = clean(pm25, labels.len());
    let colors = values.iter().map(|v| AqiBand::from_pm25(*v).color()).collect();
    ChartDescriptor {
        kind: ChartKind::AqiHeatmap,
        title: "PM2.5 Air Quality Index".to_string(),
        series_type: SeriesType::Bar,
        labels,
        series: vec![Series {
            name: "PM2.5 Air Quality Index".to_string(),
            values,
            color: ColorPolicy::PerValue { colors },
        }],
    }
}

fn fixed(name: &str, values: &[f64], len: usize, color: Rgba) -> Series {
    Series {
        name: name.to_string(),
        values: clean(values, len),
        color: ColorPolicy::Fixed { color },
    }
}

/// Finite values only, exactly `len` of them.
fn clean(values: &[f64], len: usize) -> Vec<f64> {
    let mut out: Vec<f64> = values
        .iter()
        .take(len)
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    out.resize(len, 0.0);
    out
}

/// 24-hour clock, `HH:00`.
pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour % 24)
}

pub fn day_label(
    date: Option<NaiveDate>,
    day_name: Option<&str>,
    index: usize,
    today: NaiveDate,
) -> String {
    match date {
        Some(d) if d == today => "Today".to_string(),
        Some(d) if d == today + Duration::days(1) => "Tomorrow".to_string(),
        Some(d) => d.format("%a").to_string(),
        None => match day_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.chars().take(3).collect(),
            _ => format!("Day {}", index + 1),
        },
    }
}

/// `Week N`, keeping the start date the service may put in parentheses.
pub fn week_label(index: usize, raw: &str) -> String {
    let start = raw
        .find('(')
        .and_then(|open| raw[open..].find(')').map(|close| &raw[open..=open + close]));
    match start {
        Some(start) => format!("Week {} {}", index + 1, start),
        None => format!("Week {}", index + 1),
    }
}

fn month_of(date: &str) -> Option<u32> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(|d| d.month())
}

/// Three-letter month abbreviation from "3", "2024-03", "2024-03-01" or "March".
pub fn month_label(index: usize, raw: &str) -> String {
    let raw = raw.trim();
    let month_number = raw
        .parse::<u32>()
        .ok()
        .or_else(|| month_of(&format!("{raw}-01")))
        .or_else(|| month_of(raw));

    if let Some(month) = month_number
        .and_then(|m| u8::try_from(m).ok())
        .and_then(|m| Month::try_from(m).ok())
    {
        return month.name()[..3].to_string();
    }

    if raw.is_empty() {
        format!("M{}", index + 1)
    } else {
        raw.chars().take(3).collect()
    }
}
