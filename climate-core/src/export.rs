//! JSON snapshot of whatever the dashboard is showing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;

use crate::anomaly::{self, Anomaly};
use crate::chart::ChartDescriptor;
use crate::model::{CurrentConditions, Location, TimePeriod};
use crate::view::ClimateView;

#[derive(Debug, Clone, Serialize)]
pub struct ExportSnapshot {
    pub location: Location,
    pub exported_at: DateTime<Local>,
    pub period: TimePeriod,
    pub current: Option<CurrentConditions>,
    pub charts: Vec<ChartDescriptor>,
    pub anomalies: Vec<Anomaly>,
}

/// Snapshot the view; fails until a location has been selected.
pub fn snapshot(view: &ClimateView, now: DateTime<Local>) -> Result<ExportSnapshot> {
    let location = view
        .location()
        .cloned()
        .ok_or_else(|| anyhow!("Nothing to export: no location selected"))?;

    Ok(ExportSnapshot {
        location,
        exported_at: now,
        period: view.period(),
        current: view.current().copied(),
        charts: view.charts().to_vec(),
        anomalies: view.payload().map(anomaly::detect).unwrap_or_default(),
    })
}

/// `climate-data-<name>-<YYYY-MM-DD>.json` with the name reduced to `[A-Za-z0-9-]`.
pub fn default_file_name(location: &Location, date: NaiveDate) -> String {
    let name: String = location
        .display_name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("climate-data-{name}-{}.json", date.format("%Y-%m-%d"))
}

pub fn write_json(snapshot: &ExportSnapshot, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(snapshot).context("Failed to serialize export snapshot")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::today_payload;
    use crate::view::ClimateResponse;

    #[test]
    fn file_name_replaces_punctuation() {
        let location = Location::new(45.76, 4.83, "Lyon, FR");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("date");
        assert_eq!(
            default_file_name(&location, date),
            "climate-data-Lyon--FR-2024-03-09.json"
        );
    }

    #[test]
    fn empty_view_cannot_be_exported() {
        let view = ClimateView::default();
        assert!(snapshot(&view, Local::now()).is_err());
    }

    #[test]
    fn snapshot_is_written_as_pretty_json() {
        let mut view = ClimateView::default();
        let request = view.set_location(Location::new(35.0, 139.0, "Tokyo, JP"));
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).expect("date");
        view.apply_on(ClimateResponse::new(&request, Ok(today_payload(24))), day);

        let snap = snapshot(&view, Local::now()).expect("snapshot");
        assert_eq!(snap.charts.len(), 4);
        assert!(!snap.anomalies.is_empty());

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(default_file_name(&snap.location, day));
        write_json(&snap, &path).expect("write");

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(written["period"], "today");
        assert_eq!(written["location"]["display_name"], "Tokyo, JP");
        assert_eq!(written["charts"].as_array().map(Vec::len), Some(4));
        assert_eq!(written["anomalies"][0]["kind"], "air_quality");
    }
}
