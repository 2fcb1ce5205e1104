use serde::{Deserialize, Serialize};

/// Colour for values at or above zero.
pub const POSITIVE_COLOR: &str = "#77d5ad";

/// Colour for values below zero.
pub const NEGATIVE_COLOR: &str = "#ee6c61";

/// Pick the sign colour for a value.
pub fn trend_color(value: f64) -> &'static str {
    if value >= 0.0 {
        POSITIVE_COLOR
    } else {
        NEGATIVE_COLOR
    }
}

/// A single horizontal bar for chart rendering.
///
/// The core computes all the numbers, the frontend only renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarDatum {
    /// Category shown on the y axis
    pub label: String,

    /// Bar length, in percent
    pub value_pct: f64,
}

impl BarDatum {
    pub fn new(label: impl Into<String>, value_pct: f64) -> Self {
        Self {
            label: label.into(),
            value_pct,
        }
    }

    pub fn color(&self) -> &'static str {
        trend_color(self.value_pct)
    }
}

/// Both contribution charts of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionChart {
    /// Equity effect and FX effect
    pub by_type: Vec<BarDatum>,

    /// MXN contribution of every instrument, ascending
    pub by_instrument: Vec<BarDatum>,

    /// Pixel height shared by both charts
    pub height: u32,
}
