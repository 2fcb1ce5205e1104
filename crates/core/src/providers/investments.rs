use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::traits::PortfolioProvider;
use crate::errors::CoreError;
use crate::models::portfolio::{Holding, Portfolio};
use crate::models::settings::Secret;

const PROVIDER: &str = "Investments API";

/// Client for the fund composition endpoint.
///
/// The endpoint URL is treated as a secret (`INVESTMENTS_API_URL`); the
/// fund id is appended to it verbatim.
pub struct InvestmentsProvider {
    client: Client,
    base_url: Secret,
}

impl InvestmentsProvider {
    pub fn new(base_url: Secret) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, base_url }
    }
}

// ── Investments API response types ──────────────────────────────────

#[derive(Deserialize)]
struct FundResponse {
    etf_positions: Vec<EtfPosition>,
}

#[derive(Deserialize)]
struct EtfPosition {
    etf: Etf,
    weight: f64,
}

#[derive(Deserialize)]
struct Etf {
    asset: EtfAsset,
}

#[derive(Deserialize)]
struct EtfAsset {
    ticker: String,
    name: String,
}

/// Parse a fund body into a `Portfolio`.
///
/// A ticker listed twice keeps its last weight and name.
pub fn parse_portfolio(body: &str, fund_id: u32) -> Result<Portfolio, CoreError> {
    let resp: FundResponse = serde_json::from_str(body)?;

    let mut holdings: Vec<Holding> = Vec::with_capacity(resp.etf_positions.len());
    for position in resp.etf_positions {
        let holding = Holding::new(position.etf.asset.ticker, position.etf.asset.name, position.weight);
        match holdings.iter_mut().find(|h| h.ticker == holding.ticker) {
            Some(existing) => *existing = holding,
            None => holdings.push(holding),
        }
    }

    if holdings.is_empty() {
        return Err(CoreError::EmptyPortfolio(fund_id));
    }
    Ok(Portfolio::new(fund_id, holdings))
}

#[async_trait]
impl PortfolioProvider for InvestmentsProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_portfolio(&self, fund_id: u32) -> Result<Portfolio, CoreError> {
        let url = format!("{}{fund_id}", self.base_url.expose());
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch data for fund ID {fund_id}. Status code: {}", status.as_u16()),
            });
        }

        let body = resp.text().await?;
        parse_portfolio(&body, fund_id)
    }
}
