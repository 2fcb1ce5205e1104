use chrono::Duration;
use chrono_tz::Tz;

use crate::errors::CoreError;
use crate::models::attribution::IntradayReturnPoint;
use crate::models::series::IntradayTable;
use crate::services::currency_service::CurrencyService;
use crate::services::price_service::MarketSnapshot;

const FX_COLUMN: &str = "FX";

/// Builds the intraday cumulative return series of the fund, in MXN.
///
/// Steps:
/// 1. Put asset bars and FX bars on the market timezone.
/// 2. Resample both onto a regular grid with forward fill.
/// 3. Align FX onto the asset grid and convert prices to MXN.
/// 4. Pin the first row to the window start prices and the last row to
///    the window end prices, so the series ends where the attribution
///    table ends.
/// 5. Weight per-ticker returns by the portfolio weights and compound.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntradayService {
    currency_service: CurrencyService,
}

impl IntradayService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    pub fn calculate(
        &self,
        snapshot: &MarketSnapshot,
        tz: Tz,
        step: Duration,
    ) -> Result<Vec<IntradayReturnPoint>, CoreError> {
        let assets = IntradayTable::from_series(snapshot.intraday_prices.iter().cloned(), tz)
            .resample_ffill(step);
        if assets.is_empty() {
            return Err(CoreError::InsufficientData(
                "no intraday asset prices to build the return series".into(),
            ));
        }

        let fx = IntradayTable::from_series([(FX_COLUMN.to_string(), snapshot.fx_intraday.clone())], tz)
            .resample_ffill(step)
            .reindex_ffill(assets.index());

        let mut prices_mxn = self.currency_service.convert_table(&assets, &fx);

        let daily = &snapshot.daily_prices;
        let (fx_start, fx_end) = (snapshot.fx_start, snapshot.fx_end);
        let last_row = prices_mxn.len() - 1;
        prices_mxn.set_row(0, |ticker| {
            daily
                .start_price(ticker)
                .map(|p| self.currency_service.convert_price(p, fx_start))
        });
        prices_mxn.set_row(last_row, |ticker| {
            daily
                .end_price(ticker)
                .map(|p| self.currency_service.convert_price(p, fx_end))
        });

        let returns = prices_mxn.pct_change();
        let holdings = &snapshot.portfolio.holdings;

        let mut growth = 1.0;
        let series = returns
            .index()
            .iter()
            .enumerate()
            .map(|(row, timestamp)| {
                let period_return: f64 = holdings
                    .iter()
                    .filter_map(|h| {
                        let r = returns.column(&h.ticker)?[row]?;
                        Some(r * h.weight)
                    })
                    .sum();
                growth *= 1.0 + period_return;
                IntradayReturnPoint {
                    timestamp: timestamp.to_rfc3339(),
                    return_pct: growth * 100.0 - 100.0,
                }
            })
            .collect();

        Ok(series)
    }
}
