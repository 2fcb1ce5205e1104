use async_trait::async_trait;
use chrono::DateTime;

use super::traits::IntradayPriceProvider;
use crate::errors::CoreError;
use crate::models::series::IntradaySeries;

const PROVIDER: &str = "Yahoo Finance";

/// Yahoo Finance API provider for intraday equity bars.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Data**: intraday OHLCV for the trailing range, in the listing currency.
///
/// Uses the `yahoo_finance_api` crate which wraps Yahoo Finance's
/// public endpoints. Bar timestamps are Unix seconds, i.e. UTC.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl IntradayPriceProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_intraday_closes(
        &self,
        ticker: &str,
        interval: &str,
        range: &str,
    ) -> Result<IntradaySeries, CoreError> {
        let resp = self
            .connector
            .get_quote_range(ticker, interval, range)
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch intraday bars for {ticker}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse intraday bars for {ticker}: {e}"),
        })?;

        let points = quotes
            .iter()
            .filter_map(|q| DateTime::from_timestamp(q.timestamp, 0).map(|t| (t, q.close)))
            .collect();

        Ok(IntradaySeries::new(points))
    }
}
