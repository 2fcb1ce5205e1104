use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::traits::FxFixingProvider;
use crate::errors::CoreError;
use crate::models::price::FxFixing;

const PAGE_URL: &str = "https://www.piplatam.com/Home/filiales?country=MX";
const PROVIDER: &str = "PiP";

const FX_MARKER: &str = "renderTasaCambio(";
const NEXT_MARKER: &str = "renderTasaInteres";

/// Scraper for the USD/MXN fixing published on the PiP Latam site.
///
/// The page embeds the rate as a JSON array passed to an inline
/// `renderTasaCambio(...)` call; there is no JSON endpoint.
pub struct PipProvider {
    client: Client,
    url: String,
}

impl PipProvider {
    pub fn new() -> Self {
        Self::with_url(PAGE_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Default for PipProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct FixingEntry {
    #[serde(rename = "txtBenchmark")]
    benchmark: String,
    #[serde(rename = "dblValue")]
    value: f64,
    #[serde(rename = "dblChange")]
    change: f64,
}

fn malformed(message: impl Into<String>) -> CoreError {
    CoreError::Api {
        provider: PROVIDER.into(),
        message: message.into(),
    }
}

/// Extract the fixing from the page HTML.
///
/// The first entry of the `renderTasaCambio` payload carries the publish
/// date in `txtBenchmark` (`YYYY/MM/DD ...`), the latest rate in `dblValue`
/// and the previous session's rate in `dblChange`.
pub fn parse_fixing_page(html: &str) -> Result<FxFixing, CoreError> {
    // The page also defines `function renderTasaCambio(data)`; only the
    // call site is followed by the array payload.
    let start = html
        .match_indices(FX_MARKER)
        .map(|(idx, _)| idx + FX_MARKER.len())
        .find(|&after| html[after..].trim_start().starts_with('['))
        .ok_or_else(|| malformed("exchange-rate block not found in page"))?;
    let end = html[start..]
        .find(NEXT_MARKER)
        .map(|idx| start + idx)
        .ok_or_else(|| malformed("end of exchange-rate block not found in page"))?;

    let payload = html[start..end].trim_end();
    let payload = payload.strip_suffix(';').unwrap_or(payload).trim_end();
    let payload = payload
        .strip_suffix(')')
        .ok_or_else(|| malformed("exchange-rate call is not closed"))?;

    let entries: Vec<FixingEntry> = serde_json::from_str(payload)?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| malformed("exchange-rate block is empty"))?;

    let date_token = entry.benchmark.split_whitespace().next().unwrap_or_default();
    let published = NaiveDate::parse_from_str(date_token, "%Y/%m/%d")
        .map_err(|e| malformed(format!("invalid fixing date {:?}: {e}", entry.benchmark)))?;

    Ok(FxFixing {
        published,
        value: entry.value,
        previous: entry.change,
    })
}

#[async_trait]
impl FxFixingProvider for PipProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_fixing(&self) -> Result<FxFixing, CoreError> {
        let html = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_fixing_page(&html)
    }
}
