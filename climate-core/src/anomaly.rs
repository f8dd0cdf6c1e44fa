//! Threshold checks that flag unusual conditions in a payload.

use serde::Serialize;

use crate::aqi::AqiBand;
use crate::model::ClimateDataPayload;

const EXTREME_HEAT_C: f64 = 35.0;
const DANGEROUS_HEAT_C: f64 = 40.0;
const EXTREME_COLD_C: f64 = -10.0;
const DANGEROUS_COLD_C: f64 = -20.0;
/// Upper bound of the UnhealthySensitive band.
const POOR_AIR_PM25: f64 = 55.0;
const HEAVY_RAIN_HOURLY_MM: f64 = 10.0;
const HEAVY_RAIN_DAILY_MM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    ExtremeHeat,
    ExtremeCold,
    AirQuality,
    HeavyRain,
}

impl AnomalyKind {
    pub fn icon(&self) -> &'static str {
        match self {
            AnomalyKind::ExtremeHeat => "🔥",
            AnomalyKind::ExtremeCold => "❄️",
            AnomalyKind::AirQuality => "😷",
            AnomalyKind::HeavyRain => "🌧️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub message: String,
}

/// Flags for hourly (Today) and daily (SevenDay) payloads. Weekly and monthly
/// aggregates are too coarse and never produce anomalies.
pub fn detect(payload: &ClimateDataPayload) -> Vec<Anomaly> {
    let (highs, lows, pm25, rain_peak, rain_total) = match payload {
        ClimateDataPayload::Today { hourly, .. } => (
            &hourly.temperature,
            &hourly.temperature,
            &hourly.pm25,
            max(&hourly.precipitation),
            hourly.precipitation.iter().filter(|v| v.is_finite()).sum(),
        ),
        ClimateDataPayload::SevenDay(daily) => (
            &daily.temp_max,
            &daily.temp_min,
            &daily.pm25,
            None,
            max(&daily.precipitation).unwrap_or(0.0),
        ),
        ClimateDataPayload::ThirtyDay(_) | ClimateDataPayload::Year(_) => return Vec::new(),
    };

    let mut found = Vec::new();

    if let Some(high) = max(highs).filter(|t| *t >= EXTREME_HEAT_C) {
        found.push(Anomaly {
            kind: AnomalyKind::ExtremeHeat,
            severity: if high >= DANGEROUS_HEAT_C {
                Severity::Danger
            } else {
                Severity::Warning
            },
            message: format!("Extreme heat expected: up to {high:.1}°C"),
        });
    }

    if let Some(low) = min(lows).filter(|t| *t <= EXTREME_COLD_C) {
        found.push(Anomaly {
            kind: AnomalyKind::ExtremeCold,
            severity: if low <= DANGEROUS_COLD_C {
                Severity::Danger
            } else {
                Severity::Warning
            },
            message: format!("Extreme cold expected: down to {low:.1}°C"),
        });
    }

    if let Some(peak) = max(pm25).filter(|v| *v > POOR_AIR_PM25) {
        let band = AqiBand::from_pm25(peak);
        found.push(Anomaly {
            kind: AnomalyKind::AirQuality,
            severity: if band >= AqiBand::Hazardous {
                Severity::Danger
            } else {
                Severity::Warning
            },
            message: format!("Poor air quality: PM2.5 peaks at {peak:.1} µg/m³ ({band})"),
        });
    }

    let hourly_burst = rain_peak.filter(|mm| *mm >= HEAVY_RAIN_HOURLY_MM);
    if hourly_burst.is_some() || rain_total >= HEAVY_RAIN_DAILY_MM {
        let message = match hourly_burst {
            Some(mm) => format!("Heavy rain: up to {mm:.1} mm in one hour"),
            None => format!("Heavy rain: {rain_total:.1} mm in one day"),
        };
        found.push(Anomaly {
            kind: AnomalyKind::HeavyRain,
            severity: Severity::Warning,
            message,
        });
    }

    found
}

fn max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::max)
}

fn min(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::min)
}
