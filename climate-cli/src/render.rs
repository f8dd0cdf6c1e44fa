//! Plain-text chart output.

use climate_core::{
    AqiBand, ChartDescriptor,
    anomaly::Anomaly,
    chart::{ChartKind, ChartRenderer},
    forecast::ForecastCard,
    model::CurrentConditions,
};

/// Prints each chart as a small table on stdout.
#[derive(Debug, Default)]
pub struct TextRenderer;

impl ChartRenderer for TextRenderer {
    fn draw(&mut self, charts: &[ChartDescriptor]) {
        for chart in charts {
            println!();
            println!("== {} ==", chart.title);

            let header: Vec<String> =
                chart.series.iter().map(|s| format!("{:>10}", s.name)).collect();
            println!("{:<16}{}", "", header.join(""));

            for (i, label) in chart.labels.iter().enumerate() {
                let cells: String = chart
                    .series
                    .iter()
                    .map(|s| format!("{:>10.1}", s.values.get(i).copied().unwrap_or_default()))
                    .collect();

                if chart.kind == ChartKind::AqiHeatmap {
                    let value = chart
                        .series
                        .first()
                        .and_then(|s| s.values.get(i).copied())
                        .unwrap_or_default();
                    println!("{label:<16}{cells}  {}", AqiBand::from_pm25(value).label());
                } else {
                    println!("{label:<16}{cells}");
                }
            }
        }
    }

    fn draw_current(&mut self, current: &CurrentConditions) {
        let band = AqiBand::from_pm25(current.pm25);
        println!();
        println!("Current conditions");
        println!("  Temperature:   {:.1}°C", current.temperature);
        println!("  Humidity:      {:.0}%", current.humidity);
        println!("  Precipitation: {:.1} mm", current.precipitation);
        println!("  Wind:          {:.1} km/h", current.windspeed);
        println!("  PM2.5 / PM10:  {:.1} / {:.1} µg/m³", current.pm25, current.pm10);
        println!("  Air quality:   {band}");
        println!("  Advice:        {}", band.health_advice());
    }
}

pub fn print_anomalies(anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        return;
    }
    println!();
    println!("Alerts");
    for anomaly in anomalies {
        println!("  {} {}", anomaly.kind.icon(), anomaly.message);
    }
}

pub fn print_forecast(cards: &[ForecastCard]) {
    if cards.is_empty() {
        return;
    }
    println!();
    println!("Forecast");
    for card in cards {
        println!(
            "  {:<10} {}  {:>3}° / {:>3}°  {:>3.0}% rain",
            card.label, card.icon, card.temp_high, card.temp_low, card.precipitation_prob
        );
    }
}
