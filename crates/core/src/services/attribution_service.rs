use crate::models::attribution::{AttributionRow, AttributionTotals};
use crate::models::portfolio::Portfolio;
use crate::models::price::DailyPriceTable;
use crate::services::currency_service::CurrencyService;

/// Computes the per-holding attribution table and the fund totals.
///
/// For every holding:
/// - start / end price = first / last row of the daily table
/// - USD return = end / start - 1
/// - MXN return = USD return compounded with the USD/MXN return
/// - contribution = return × weight
///
/// The fund's MXN return splits into an equity effect (the USD return)
/// and an FX effect (the remainder).
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributionService {
    currency_service: CurrencyService,
}

impl AttributionService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    /// One row per holding, in portfolio order.
    pub fn calculate(
        &self,
        portfolio: &Portfolio,
        daily: &DailyPriceTable,
        fx_start: f64,
        fx_end: f64,
    ) -> Vec<AttributionRow> {
        let fx_return = self.currency_service.simple_return(fx_start, fx_end);

        portfolio
            .holdings
            .iter()
            .map(|holding| {
                let start_price = daily.start_price(&holding.ticker);
                let end_price = daily.end_price(&holding.ticker);

                let return_usd = match (start_price, end_price) {
                    (Some(start), Some(end)) => self.currency_service.simple_return(start, end),
                    _ => None,
                };
                let return_mxn = match (return_usd, fx_return) {
                    (Some(r), Some(fx)) => Some(self.currency_service.compound(r, fx)),
                    _ => None,
                };

                AttributionRow {
                    ticker: holding.ticker.clone(),
                    name: holding.name.clone(),
                    weight: holding.weight,
                    start_price,
                    end_price,
                    return_usd,
                    return_mxn,
                    ctr_usd: return_usd.map(|r| r * holding.weight),
                    ctr_mxn: return_mxn.map(|r| r * holding.weight),
                }
            })
            .collect()
    }

    /// Sum the contributions. Rows without a contribution are skipped.
    pub fn totals(&self, rows: &[AttributionRow]) -> AttributionTotals {
        let total_return_mxn: f64 = rows.iter().filter_map(|r| r.ctr_mxn).sum();
        let total_return_usd: f64 = rows.iter().filter_map(|r| r.ctr_usd).sum();

        AttributionTotals {
            total_return_mxn,
            total_return_usd,
            total_equity_effect: total_return_usd,
            total_fx_effect: total_return_mxn - total_return_usd,
        }
    }
}
