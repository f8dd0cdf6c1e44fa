//! Day-by-day forecast cards for the seven-day period.

use chrono::NaiveDate;
use serde::Serialize;

use crate::chart::day_label;
use crate::model::{ClimateDataPayload, DailySeries};

const MAX_CARDS: usize = 7;

/// One upcoming day: label, icon, rounded temperatures and rain chance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastCard {
    pub label: String,
    pub icon: &'static str,
    pub temp_high: i32,
    pub temp_low: i32,
    pub precipitation_prob: f64,
}

/// Rain chance wins over temperature.
pub fn weather_icon(temp_high: f64, precipitation_prob: f64) -> &'static str {
    if precipitation_prob > 60.0 {
        "🌧️"
    } else if precipitation_prob > 30.0 {
        "⛅"
    } else if temp_high > 30.0 {
        "☀️"
    } else if temp_high < 10.0 {
        "❄️"
    } else {
        "🌤️"
    }
}

/// Cards for the days after the first one, at most a week of them.
pub fn cards(daily: &DailySeries, today: NaiveDate) -> Vec<ForecastCard> {
    (1..daily.len())
        .take(MAX_CARDS)
        .map(|i| {
            let temp_high = round(daily.temp_max.get(i));
            let temp_low = round(daily.temp_min.get(i));
            let precipitation_prob = daily
                .precipitation_prob
                .get(i)
                .copied()
                .filter(|p| p.is_finite())
                .unwrap_or(0.0);
            ForecastCard {
                label: day_label(
                    daily.dates.get(i).copied().flatten(),
                    daily.day_names.get(i).map(String::as_str),
                    i,
                    today,
                ),
                icon: weather_icon(f64::from(temp_high), precipitation_prob),
                temp_high,
                temp_low,
                precipitation_prob,
            }
        })
        .collect()
}

/// Forecast cards when `payload` is the seven-day shape; empty otherwise.
pub fn for_payload(payload: &ClimateDataPayload, today: NaiveDate) -> Vec<ForecastCard> {
    match payload {
        ClimateDataPayload::SevenDay(daily) => cards(daily, today),
        _ => Vec::new(),
    }
}

fn round(value: Option<&f64>) -> i32 {
    match value {
        Some(v) if v.is_finite() => v.round() as i32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimePeriod;
    use crate::testing::{daily_payload, payload_for};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date")
    }

    #[test]
    fn icon_prefers_rain_chance_over_temperature() {
        assert_eq!(weather_icon(35.0, 70.0), "🌧️");
        assert_eq!(weather_icon(35.0, 45.0), "⛅");
        assert_eq!(weather_icon(35.0, 30.0), "☀️");
        assert_eq!(weather_icon(5.0, 0.0), "❄️");
        assert_eq!(weather_icon(20.0, 10.0), "🌤️");
        // thresholds are exclusive
        assert_eq!(weather_icon(30.0, 60.0), "⛅");
        assert_eq!(weather_icon(10.0, 0.0), "🌤️");
    }

    #[test]
    fn cards_skip_the_first_day() {
        let ClimateDataPayload::SevenDay(daily) = daily_payload(day(), 7) else {
            panic!("daily payload");
        };
        let cards = cards(&daily, day());
        assert_eq!(cards.len(), 6);
        assert_eq!(cards[0].label, "Tomorrow");
        assert_eq!(cards[1].label, "Fri");
        assert_eq!(cards[0].temp_high, 24);
        assert_eq!(cards[0].temp_low, 14);

        let icons: Vec<&str> = cards.iter().map(|c| c.icon).collect();
        assert_eq!(icons, ["🌤️", "🌤️", "⛅", "⛅", "🌧️", "🌧️"]);
    }

    #[test]
    fn cards_cap_at_a_week() {
        let ClimateDataPayload::SevenDay(daily) = daily_payload(day(), 10) else {
            panic!("daily payload");
        };
        assert_eq!(cards(&daily, day()).len(), MAX_CARDS);
    }

    #[test]
    fn missing_rain_chance_reads_as_zero() {
        let daily = DailySeries {
            dates: vec![Some(day()), Some(day().succ_opt().expect("next day"))],
            temp_max: vec![31.6, 31.6],
            temp_min: vec![f64::NAN, 20.2],
            ..DailySeries::default()
        };

        let cards = cards(&daily, day());
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].temp_high, 32);
        assert_eq!(cards[0].temp_low, 20);
        assert_eq!(cards[0].precipitation_prob, 0.0);
        assert_eq!(cards[0].icon, "☀️");
    }

    #[test]
    fn only_seven_day_payloads_have_cards() {
        assert!(for_payload(&payload_for(TimePeriod::Today), day()).is_empty());
        assert!(for_payload(&payload_for(TimePeriod::Year), day()).is_empty());
        assert_eq!(for_payload(&payload_for(TimePeriod::SevenDay), day()).len(), 6);
    }
}
