use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::price::{FxFixing, PricePoint};
use crate::models::series::IntradaySeries;

// One trait per data concern. Each external API implements the ones it can
// serve; tests plug in mocks at the same seams.

/// Source of the fund composition.
#[async_trait]
pub trait PortfolioProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the holdings and weights of a fund.
    async fn get_portfolio(&self, fund_id: u32) -> Result<Portfolio, CoreError>;
}

/// Source of daily closing prices.
#[async_trait]
pub trait DailyPriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily adjusted closes for `ticker` with `from <= date <= to`, sorted by date.
    async fn get_daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}

/// Source of intraday bars.
#[async_trait]
pub trait IntradayPriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Intraday closes for `ticker` sampled at `interval` (e.g. "5m")
    /// over the trailing `range` (e.g. "1d").
    async fn get_intraday_closes(
        &self,
        ticker: &str,
        interval: &str,
        range: &str,
    ) -> Result<IntradaySeries, CoreError>;
}

/// Source of exchange rates.
#[async_trait]
pub trait FxRateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Intraday closes of `from`/`to` at `interval` (e.g. "15min").
    async fn get_fx_intraday(
        &self,
        from: &str,
        to: &str,
        interval: &str,
    ) -> Result<IntradaySeries, CoreError>;

    /// Daily closes of `from`/`to` with `start <= date <= end`, sorted by date.
    async fn get_fx_daily(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}

/// Source of the official exchange-rate fixing.
#[async_trait]
pub trait FxFixingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_fixing(&self) -> Result<FxFixing, CoreError>;
}
