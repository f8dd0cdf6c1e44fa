//! PM2.5 severity bands used for chart colouring and health advice.

use serde::{Deserialize, Serialize};

use crate::chart::Rgba;

/// Five ordered severity bands. Upper bounds are inclusive, so a value on a
/// boundary belongs to the lower band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiBand {
    /// PM2.5 <= 12
    Good,
    /// PM2.5 <= 35
    Moderate,
    /// PM2.5 <= 55
    UnhealthySensitive,
    /// PM2.5 <= 150
    Unhealthy,
    /// PM2.5 > 150
    Hazardous,
}

impl AqiBand {
    pub const ALL: [AqiBand; 5] = [
        AqiBand::Good,
        AqiBand::Moderate,
        AqiBand::UnhealthySensitive,
        AqiBand::Unhealthy,
        AqiBand::Hazardous,
    ];

    /// Classify a PM2.5 concentration in µg/m³. NaN and negatives count as clean air.
    pub fn from_pm25(pm25: f64) -> Self {
        let pm25 = if pm25.is_nan() { 0.0 } else { pm25 };
        if pm25 <= 12.0 {
            AqiBand::Good
        } else if pm25 <= 35.0 {
            AqiBand::Moderate
        } else if pm25 <= 55.0 {
            AqiBand::UnhealthySensitive
        } else if pm25 <= 150.0 {
            AqiBand::Unhealthy
        } else {
            AqiBand::Hazardous
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AqiBand::Good => "Good",
            AqiBand::Moderate => "Moderate",
            AqiBand::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            AqiBand::Unhealthy => "Unhealthy",
            AqiBand::Hazardous => "Hazardous",
        }
    }

    /// Legend entry including the concentration range.
    pub fn legend(self) -> &'static str {
        match self {
            AqiBand::Good => "Good (0-12)",
            AqiBand::Moderate => "Moderate (13-35)",
            AqiBand::UnhealthySensitive => "Unhealthy for Sensitive Groups (36-55)",
            AqiBand::Unhealthy => "Unhealthy (56-150)",
            AqiBand::Hazardous => "Hazardous (150+)",
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            AqiBand::Good => Rgba::new(34, 197, 94, 0.8),
            AqiBand::Moderate => Rgba::new(245, 158, 11, 0.8),
            AqiBand::UnhealthySensitive => Rgba::new(249, 115, 22, 0.8),
            AqiBand::Unhealthy => Rgba::new(239, 68, 68, 0.8),
            AqiBand::Hazardous => Rgba::new(147, 51, 234, 0.8),
        }
    }

    pub fn health_advice(self) -> &'static str {
        match self {
            AqiBand::Good => "Air quality is satisfactory. Enjoy outdoor activities.",
            AqiBand::Moderate => {
                "Air quality is acceptable. Unusually sensitive \
                 people should consider limiting prolonged outdoor exertion."
            }
            AqiBand::UnhealthySensitive => {
                "Children, older adults and people with heart or lung disease should \
                 reduce prolonged outdoor exertion."
            }
            AqiBand::Unhealthy => {
                "Everyone may begin to experience health effects. Limit time \
                 outdoors and consider wearing a mask."
            }
            AqiBand::Hazardous => {
                "Health warning of emergency conditions. Avoid all \
                 outdoor activity and keep windows closed."
            }
        }
    }
}

impl std::fmt::Display for AqiBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_the_lower_band() {
        assert_eq!(AqiBand::from_pm25(0.0), AqiBand::Good);
        assert_eq!(AqiBand::from_pm25(12.0), AqiBand::Good);
        assert_eq!(AqiBand::from_pm25(12.1), AqiBand::Moderate);
        assert_eq!(AqiBand::from_pm25(35.0), AqiBand::Moderate);
        assert_eq!(AqiBand::from_pm25(35.1), AqiBand::UnhealthySensitive);
        assert_eq!(AqiBand::from_pm25(55.0), AqiBand::UnhealthySensitive);
        assert_eq!(AqiBand::from_pm25(55.1), AqiBand::Unhealthy);
        assert_eq!(AqiBand::from_pm25(150.0), AqiBand::Unhealthy);
        assert_eq!(AqiBand::from_pm25(150.1), AqiBand::Hazardous);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(AqiBand::from_pm25(f64::NAN), AqiBand::Good);
        assert_eq!(AqiBand::from_pm25(-3.0), AqiBand::Good);
        assert_eq!(AqiBand::from_pm25(f64::INFINITY), AqiBand::Hazardous);
    }

    #[test]
    fn bands_are_ordered_and_distinctly_coloured() {
        assert!(AqiBand::ALL.windows(2).all(|w| w[0] < w[1]));
        let mut colors: Vec<_> = AqiBand::ALL.iter().map(|b| b.color().to_css()).collect();
        colors.dedup();
        assert_eq!(colors.len(), 5);
    }
}
