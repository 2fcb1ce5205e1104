use crate::models::series::IntradayTable;

/// Converts returns and prices between the holdings' currency and the
/// fund's reporting currency.
///
/// Holdings are priced in USD; the fund reports in MXN. A USD price times
/// the USD/MXN rate is an MXN price, and an MXN return compounds the asset
/// return with the currency return.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyService;

impl CurrencyService {
    pub fn new() -> Self {
        Self
    }

    /// Simple return between two prices: end / start - 1.
    /// Empty when the start price is zero or either price is not finite.
    pub fn simple_return(&self, start: f64, end: f64) -> Option<f64> {
        if start == 0.0 || !start.is_finite() || !end.is_finite() {
            return None;
        }
        Some(end / start - 1.0)
    }

    /// Return in the reporting currency: (1 + asset) × (1 + fx) - 1.
    pub fn compound(&self, asset_return: f64, fx_return: f64) -> f64 {
        (1.0 + asset_return) * (1.0 + fx_return) - 1.0
    }

    /// Price in the reporting currency.
    pub fn convert_price(&self, price: f64, rate: f64) -> f64 {
        price * rate
    }

    /// Multiply each row of `prices` by the rate aligned to that row.
    ///
    /// `rates` must share the index of `prices`; its first column is used.
    pub fn convert_table(&self, prices: &IntradayTable, rates: &IntradayTable) -> IntradayTable {
        let factors: Vec<Option<f64>> = rates
            .tickers()
            .next()
            .and_then(|name| rates.column(name))
            .map(<[Option<f64>]>::to_vec)
            .unwrap_or_else(|| vec![None; prices.len()]);
        prices.scale_rows(&factors)
    }
}
