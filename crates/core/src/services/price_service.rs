use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::price::{DailyPriceTable, PricePoint};
use crate::models::series::IntradaySeries;
use crate::models::settings::Settings;
use crate::providers::registry::ProviderSet;

/// Trailing range requested for intraday bars.
const INTRADAY_RANGE: &str = "1d";

/// Everything fetched from the outside world for one attribution run.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub portfolio: Portfolio,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Daily closes of every holding that answered, over `[start_date, end_date]`
    pub daily_prices: DailyPriceTable,

    /// Intraday closes per ticker
    pub intraday_prices: Vec<(String, IntradaySeries)>,

    /// Intraday base/quote rate
    pub fx_intraday: IntradaySeries,

    /// Base/quote rate at the window start
    pub fx_start: f64,

    /// Base/quote rate at the window end
    pub fx_end: f64,
}

/// Fetches market data from the providers.
///
/// Per-ticker failures are logged and the ticker is left out, so one
/// delisted or throttled symbol does not take the whole dashboard down.
/// A source that yields nothing at all is an error.
pub struct MarketDataService {
    providers: ProviderSet,
}

impl MarketDataService {
    pub fn new(providers: ProviderSet) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Fetch the fund composition. An empty fund is an error.
    pub async fn fetch_portfolio(&self, fund_id: u32) -> Result<Portfolio, CoreError> {
        let portfolio = self.providers.portfolio.get_portfolio(fund_id).await?;
        if portfolio.is_empty() {
            return Err(CoreError::EmptyPortfolio(fund_id));
        }
        debug!(fund_id, holdings = portfolio.holdings.len(), "fetched portfolio");
        Ok(portfolio)
    }

    /// Daily closes of `tickers` over `[from, to]`.
    pub async fn fetch_daily_prices(
        &self,
        tickers: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<DailyPriceTable, CoreError> {
        let provider = &self.providers.daily_prices;
        let mut series = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            match provider.get_daily_closes(ticker, from, to).await {
                Ok(points) if points.is_empty() => {
                    warn!(%ticker, provider = provider.name(), %from, %to, "no daily closes in window");
                }
                Ok(points) => series.push((ticker.clone(), points)),
                Err(e) => {
                    warn!(%ticker, provider = provider.name(), error = %e, "daily closes unavailable");
                }
            }
        }

        let table = DailyPriceTable::from_series(series);
        if table.is_empty() {
            return Err(CoreError::InsufficientData(format!(
                "no daily prices for any holding between {from} and {to}"
            )));
        }
        Ok(table)
    }

    /// Intraday closes of `tickers` at `interval` over the trailing day.
    pub async fn fetch_intraday_prices(
        &self,
        tickers: &[String],
        interval: &str,
    ) -> Result<Vec<(String, IntradaySeries)>, CoreError> {
        let provider = &self.providers.intraday_prices;
        let mut series = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            match provider.get_intraday_closes(ticker, interval, INTRADAY_RANGE).await {
                Ok(s) if s.is_empty() => {
                    warn!(%ticker, provider = provider.name(), "no intraday bars");
                }
                Ok(s) => series.push((ticker.clone(), s)),
                Err(e) => {
                    warn!(%ticker, provider = provider.name(), error = %e, "intraday bars unavailable");
                }
            }
        }

        if series.is_empty() {
            return Err(CoreError::InsufficientData(
                "no intraday prices for any holding".into(),
            ));
        }
        Ok(series)
    }

    /// Intraday FX rate of `base`/`quote`.
    pub async fn fetch_fx_intraday(
        &self,
        base: &str,
        quote: &str,
        interval: &str,
    ) -> Result<IntradaySeries, CoreError> {
        let series = self.providers.fx_rates.get_fx_intraday(base, quote, interval).await?;
        if series.is_empty() {
            return Err(CoreError::FxRateNotAvailable {
                pair: format!("{base}/{quote}"),
                detail: "intraday series is empty".into(),
            });
        }
        Ok(series)
    }

    /// FX rates at the window boundaries, as `(start, end)`.
    ///
    /// The official fixing is preferred. When today's fixing is not out yet
    /// the end rate is the latest daily close; when the fixing page cannot
    /// be read at all both rates come from daily closes.
    pub async fn resolve_fx_boundaries(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(f64, f64), CoreError> {
        let pair = format!("{base}/{quote}");

        let (fx_start, fx_end) = match self.providers.fx_fixing.get_fixing().await {
            Ok(fixing) => {
                let (today_rate, start_rate) = fixing.resolve(end);
                let end_rate = match today_rate {
                    Some(rate) => rate,
                    None => {
                        debug!(published = %fixing.published, "today's fixing not published, using daily close");
                        let closes = self.fx_daily(base, quote, start, end).await?;
                        last_close(&closes, &pair)?
                    }
                };
                (start_rate, end_rate)
            }
            Err(e) => {
                warn!(provider = self.providers.fx_fixing.name(), error = %e, "fixing unavailable, using daily closes");
                let closes = self.fx_daily(base, quote, start, end).await?;
                let first = closes.first().map(|p| p.price).ok_or_else(|| CoreError::FxRateNotAvailable {
                    pair: pair.clone(),
                    detail: format!("no daily close between {start} and {end}"),
                })?;
                (first, last_close(&closes, &pair)?)
            }
        };

        for (label, rate) in [("start", fx_start), ("end", fx_end)] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(CoreError::FxRateNotAvailable {
                    pair,
                    detail: format!("invalid {label} rate {rate}"),
                });
            }
        }

        debug!(%pair, fx_start, fx_end, "resolved FX boundaries");
        Ok((fx_start, fx_end))
    }

    /// Fetch everything one attribution run needs: portfolio, intraday
    /// bars, intraday FX, daily closes, then the FX boundaries.
    pub async fn snapshot(
        &self,
        settings: &Settings,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<MarketSnapshot, CoreError> {
        let portfolio = self.fetch_portfolio(settings.fund_id).await?;
        let tickers = portfolio.tickers();

        let interval = format!("{}m", settings.intraday_interval_minutes);
        let intraday_prices = self.fetch_intraday_prices(&tickers, &interval).await?;
        let fx_intraday = self
            .fetch_fx_intraday(&settings.base_currency, &settings.quote_currency, &settings.fx_intraday_interval)
            .await?;
        let daily_prices = self.fetch_daily_prices(&tickers, start_date, end_date).await?;
        let (fx_start, fx_end) = self
            .resolve_fx_boundaries(&settings.base_currency, &settings.quote_currency, start_date, end_date)
            .await?;

        Ok(MarketSnapshot {
            portfolio,
            start_date,
            end_date,
            daily_prices,
            intraday_prices,
            fx_intraday,
            fx_start,
            fx_end,
        })
    }

    async fn fx_daily(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.providers.fx_rates.get_fx_daily(base, quote, start, end).await
    }
}

fn last_close(closes: &[PricePoint], pair: &str) -> Result<f64, CoreError> {
    closes
        .last()
        .map(|p| p.price)
        .ok_or_else(|| CoreError::FxRateNotAvailable {
            pair: pair.to_string(),
            detail: "no daily close in window".into(),
        })
}
