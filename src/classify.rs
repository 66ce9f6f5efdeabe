use std::fmt;

/// Upper bounds (inclusive) of the display bands. Styling only.
pub const NORMAL_MAX: f64 = 0.25;
pub const MODERATE_MAX: f64 = 0.50;
pub const HIGH_MAX: f64 = 0.75;

/// Crisis alerting triggers strictly above this score.
pub const EMERGENCY_THRESHOLD: f64 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Normal,
    Moderate,
    High,
    Severe,
}

impl Band {
    pub fn css_class(self) -> &'static str {
        match self {
            Band::Normal => "normal",
            Band::Moderate => "moderate",
            Band::High => "high",
            Band::Severe => "severe",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

pub fn band(score: f64) -> Band {
    if score <= NORMAL_MAX {
        Band::Normal
    } else if score <= MODERATE_MAX {
        Band::Moderate
    } else if score <= HIGH_MAX {
        Band::High
    } else {
        Band::Severe
    }
}

pub fn is_emergency(stress_score: f64, depression_score: f64) -> bool {
    stress_score > EMERGENCY_THRESHOLD || depression_score > EMERGENCY_THRESHOLD
}

/// Gauge fill as a CSS width, clamped to the bar.
pub fn gauge_width(score: f64) -> String {
    format!("{:.2}%", (score * 100.0).clamp(0.0, 100.0))
}
