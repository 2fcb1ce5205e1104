use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Attribution of one holding over the window.
///
/// Price and return fields are empty when the holding had no daily prices;
/// the row is still reported so every position of the fund shows up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRow {
    /// Exchange ticker
    pub ticker: String,

    /// Display name of the instrument
    pub name: String,

    /// Portfolio weight as a fraction
    pub weight: f64,

    /// Close on the first date of the window (USD)
    pub start_price: Option<f64>,

    /// Close on the last date of the window (USD)
    pub end_price: Option<f64>,

    /// Price return in USD: end / start - 1
    pub return_usd: Option<f64>,

    /// Return in MXN: USD return compounded with the USD/MXN move
    pub return_mxn: Option<f64>,

    /// Contribution to the fund's USD return: return_usd × weight
    pub ctr_usd: Option<f64>,

    /// Contribution to the fund's MXN return: return_mxn × weight
    pub ctr_mxn: Option<f64>,
}

/// Fund-level totals and their equity/FX decomposition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionTotals {
    /// Sum of MXN contributions
    pub total_return_mxn: f64,

    /// Sum of USD contributions
    pub total_return_usd: f64,

    /// Part of the MXN return explained by asset prices (equals the USD return)
    pub total_equity_effect: f64,

    /// Part of the MXN return explained by the USD/MXN move
    pub total_fx_effect: f64,
}

/// Cumulative fund return at one intraday timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayReturnPoint {
    /// RFC 3339 timestamp in the market timezone
    pub timestamp: String,

    /// Cumulative return since the window start, in percent
    pub return_pct: f64,
}

/// Everything the dashboard renders for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionReport {
    pub fund_id: u32,

    /// Previous trading session (window start)
    pub start_date: NaiveDate,

    /// Today (window end)
    pub end_date: NaiveDate,

    /// USD/MXN at the window start
    pub fx_start: f64,

    /// USD/MXN at the window end
    pub fx_end: f64,

    /// One row per holding, in portfolio order
    pub rows: Vec<AttributionRow>,

    pub totals: AttributionTotals,

    /// Intraday cumulative return series
    pub intraday: Vec<IntradayReturnPoint>,

    pub generated_at: DateTime<Utc>,
}

impl AttributionReport {
    /// Return of the base currency against the quote currency over the window.
    pub fn fx_return(&self) -> f64 {
        self.fx_end / self.fx_start - 1.0
    }

    /// Last point of the intraday series, if any.
    pub fn latest_intraday_pct(&self) -> Option<f64> {
        self.intraday.last().map(|p| p.return_pct)
    }
}
