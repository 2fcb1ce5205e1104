use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::{DailyPriceProvider, FxRateProvider};
use crate::errors::CoreError;
use crate::models::price::PricePoint;
use crate::models::series::IntradaySeries;
use crate::models::settings::Secret;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

/// Alpha Vantage API provider for daily equity closes and USD/MXN rates.
///
/// - **Requires**: API key (`ALPHAVANTAGE_API_KEY`).
/// - **Endpoints**: `TIME_SERIES_DAILY_ADJUSTED`, `FX_INTRADAY`, `FX_DAILY`,
///   all requested with `entitlement=delayed`.
/// - **Limits**: when the quota is exhausted the API answers 200 with a
///   `Note`/`Information` message instead of the series; that surfaces as
///   `CoreError::Api`.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: Secret,
    base_url: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: Secret) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Point the provider at another endpoint (proxies, test servers).
    pub fn with_base_url(api_key: Secret, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            base_url: base_url.into(),
        }
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<String, CoreError> {
        let body = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.expose()), ("entitlement", "delayed")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct DailyAdjustedResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyAdjustedData>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct DailyAdjustedData {
    #[serde(rename = "5. adjusted close")]
    adjusted_close: String,
}

#[derive(Deserialize)]
struct FxDailyResponse {
    #[serde(rename = "Time Series FX (Daily)")]
    time_series: Option<HashMap<String, FxData>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct FxData {
    #[serde(rename = "4. close")]
    close: String,
}

fn no_series(what: &str, note: Option<String>, information: Option<String>) -> CoreError {
    let detail = note
        .or(information)
        .unwrap_or_else(|| "API limit may be exceeded.".to_string());
    CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("No time series data for {what}. {detail}"),
    }
}

fn parse_price(raw: &str, what: &str) -> Result<f64, CoreError> {
    raw.trim().parse().map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Invalid price format for {what}: {raw} ({e})"),
    })
}

/// Keep the closes dated inside `[from, to]`, sorted by date.
fn daily_points<'a, I>(entries: I, what: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<PricePoint>, CoreError>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut points = Vec::new();
    for (date_str, close) in entries {
        let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            continue;
        };
        if date >= from && date <= to {
            points.push(PricePoint::new(date, parse_price(close, what)?));
        }
    }
    points.sort_by_key(|p| p.date);
    Ok(points)
}

/// Parse a `TIME_SERIES_DAILY_ADJUSTED` body into adjusted closes within `[from, to]`.
pub fn parse_daily_adjusted(
    body: &str,
    ticker: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PricePoint>, CoreError> {
    let resp: DailyAdjustedResponse = serde_json::from_str(body)?;
    let series = resp
        .time_series
        .ok_or_else(|| no_series(ticker, resp.note, resp.information))?;
    daily_points(
        series.iter().map(|(d, v)| (d, &v.adjusted_close)),
        ticker,
        from,
        to,
    )
}

/// Parse an `FX_DAILY` body into closes within `[start, end]`.
pub fn parse_fx_daily(body: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PricePoint>, CoreError> {
    let resp: FxDailyResponse = serde_json::from_str(body)?;
    let series = resp
        .time_series
        .ok_or_else(|| no_series("the FX pair", resp.note, resp.information))?;
    daily_points(series.iter().map(|(d, v)| (d, &v.close)), "the FX pair", start, end)
}

/// Parse an `FX_INTRADAY` body. The series key embeds the interval
/// (`Time Series FX (15min)`), and timestamps are naive UTC.
pub fn parse_fx_intraday(body: &str, interval: &str) -> Result<IntradaySeries, CoreError> {
    let mut value: serde_json::Value = serde_json::from_str(body)?;
    let key = format!("Time Series FX ({interval})");

    let Some(series) = value.get_mut(&key).map(serde_json::Value::take) else {
        let text = |k: &str| value.get(k).and_then(|v| v.as_str()).map(str::to_string);
        return Err(no_series("the FX pair", text("Note"), text("Information")));
    };
    let series: HashMap<String, FxData> = serde_json::from_value(series)?;

    let mut points = Vec::with_capacity(series.len());
    for (ts, data) in &series {
        let Ok(naive) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") else {
            continue;
        };
        points.push((naive.and_utc(), parse_price(&data.close, "the FX pair")?));
    }
    Ok(IntradaySeries::new(points))
}

#[async_trait]
impl DailyPriceProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let symbol = ticker.to_uppercase();
        let body = self
            .query(&[("function", "TIME_SERIES_DAILY_ADJUSTED"), ("symbol", &symbol)])
            .await?;
        parse_daily_adjusted(&body, &symbol, from, to)
    }
}

#[async_trait]
impl FxRateProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_fx_intraday(
        &self,
        from: &str,
        to: &str,
        interval: &str,
    ) -> Result<IntradaySeries, CoreError> {
        let body = self
            .query(&[
                ("function", "FX_INTRADAY"),
                ("outputsize", "full"),
                ("from_symbol", from),
                ("to_symbol", to),
                ("interval", interval),
            ])
            .await?;
        parse_fx_intraday(&body, interval)
    }

    async fn get_fx_daily(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let body = self
            .query(&[
                ("function", "FX_DAILY"),
                ("from_symbol", from),
                ("to_symbol", to),
            ])
            .await?;
        parse_fx_daily(&body, start, end)
    }
}
