// ═══════════════════════════════════════════════════════════════════
// Shared test helpers — in-memory providers for every data seam
// ═══════════════════════════════════════════════════════════════════
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fund_attribution_core::errors::CoreError;
use fund_attribution_core::models::portfolio::{Holding, Portfolio};
use fund_attribution_core::models::price::{FxFixing, PricePoint};
use fund_attribution_core::models::series::IntradaySeries;
use fund_attribution_core::models::settings::Settings;
use fund_attribution_core::providers::registry::ProviderSet;
use fund_attribution_core::providers::traits::{
    DailyPriceProvider, FxFixingProvider, FxRateProvider, IntradayPriceProvider, PortfolioProvider,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn api_error(message: &str) -> CoreError {
    CoreError::Api {
        provider: "Mock".into(),
        message: message.into(),
    }
}

pub fn settings() -> Settings {
    Settings::new("test-key", "https://funds.example.com/api/")
}

// ── Portfolio ───────────────────────────────────────────────────────

pub struct MockPortfolio {
    pub holdings: Vec<Holding>,
}

#[async_trait]
impl PortfolioProvider for MockPortfolio {
    fn name(&self) -> &str {
        "MockPortfolio"
    }

    async fn get_portfolio(&self, fund_id: u32) -> Result<Portfolio, CoreError> {
        Ok(Portfolio::new(fund_id, self.holdings.clone()))
    }
}

// ── Daily closes ────────────────────────────────────────────────────

/// Serves preset closes per ticker; unknown tickers fail.
#[derive(Default)]
pub struct MockDaily {
    pub closes: HashMap<String, Vec<PricePoint>>,
}

impl MockDaily {
    pub fn with(mut self, ticker: &str, points: &[(NaiveDate, f64)]) -> Self {
        self.closes.insert(
            ticker.to_string(),
            points.iter().map(|&(d, p)| PricePoint::new(d, p)).collect(),
        );
        self
    }
}

#[async_trait]
impl DailyPriceProvider for MockDaily {
    fn name(&self) -> &str {
        "MockDaily"
    }

    async fn get_daily_closes(
        &self,
        ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.closes
            .get(ticker)
            .cloned()
            .ok_or_else(|| api_error(&format!("unknown ticker {ticker}")))
    }
}

// ── Intraday bars ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockIntraday {
    pub bars: HashMap<String, IntradaySeries>,
}

impl MockIntraday {
    pub fn with(mut self, ticker: &str, points: &[(DateTime<Utc>, f64)]) -> Self {
        self.bars
            .insert(ticker.to_string(), IntradaySeries::new(points.to_vec()));
        self
    }
}

#[async_trait]
impl IntradayPriceProvider for MockIntraday {
    fn name(&self) -> &str {
        "MockIntraday"
    }

    async fn get_intraday_closes(
        &self,
        ticker: &str,
        _interval: &str,
        _range: &str,
    ) -> Result<IntradaySeries, CoreError> {
        self.bars
            .get(ticker)
            .cloned()
            .ok_or_else(|| api_error(&format!("no bars for {ticker}")))
    }
}

// ── FX rates ────────────────────────────────────────────────────────

/// Serves a fixed intraday series and daily closes, counting daily calls.
#[derive(Default)]
pub struct MockFx {
    pub intraday: Vec<(DateTime<Utc>, f64)>,
    pub daily: Vec<PricePoint>,
    pub daily_calls: AtomicUsize,
}

impl MockFx {
    pub fn new(intraday: &[(DateTime<Utc>, f64)], daily: &[(NaiveDate, f64)]) -> Self {
        Self {
            intraday: intraday.to_vec(),
            daily: daily.iter().map(|&(d, p)| PricePoint::new(d, p)).collect(),
            daily_calls: AtomicUsize::new(0),
        }
    }

    pub fn daily_calls(&self) -> usize {
        self.daily_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FxRateProvider for MockFx {
    fn name(&self) -> &str {
        "MockFx"
    }

    async fn get_fx_intraday(
        &self,
        _from: &str,
        _to: &str,
        _interval: &str,
    ) -> Result<IntradaySeries, CoreError> {
        Ok(IntradaySeries::new(self.intraday.clone()))
    }

    async fn get_fx_daily(
        &self,
        _from: &str,
        _to: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.daily_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.daily.clone())
    }
}

// ── Fixing ──────────────────────────────────────────────────────────

/// Serves a fixing, or fails when none is set.
pub struct MockFixing {
    pub fixing: Option<FxFixing>,
}

#[async_trait]
impl FxFixingProvider for MockFixing {
    fn name(&self) -> &str {
        "MockFixing"
    }

    async fn get_fixing(&self) -> Result<FxFixing, CoreError> {
        self.fixing
            .clone()
            .ok_or_else(|| api_error("fixing page unavailable"))
    }
}

pub fn fixing(published: NaiveDate, value: f64, previous: f64) -> MockFixing {
    MockFixing {
        fixing: Some(FxFixing {
            published,
            value,
            previous,
        }),
    }
}

pub fn provider_set(
    holdings: Vec<Holding>,
    daily: MockDaily,
    intraday: MockIntraday,
    fx: Arc<MockFx>,
    fixing: MockFixing,
) -> ProviderSet {
    ProviderSet {
        portfolio: Arc::new(MockPortfolio { holdings }),
        daily_prices: Arc::new(daily),
        intraday_prices: Arc::new(intraday),
        fx_rates: fx,
        fx_fixing: Arc::new(fixing),
    }
}

// ── A small two-ETF fund ────────────────────────────────────────────
//
// Window 2025-01-14 → 2025-01-15, fixing 20.00 → 20.40.
// VTI 100 → 102 (weight 0.6), QQQ 500 → 495 (weight 0.4).

pub fn two_etf_holdings() -> Vec<Holding> {
    vec![
        Holding::new("VTI", "Vanguard Total Stock Market ETF", 0.6),
        Holding::new("QQQ", "Invesco QQQ Trust", 0.4),
    ]
}

pub fn two_etf_daily() -> MockDaily {
    MockDaily::default()
        .with("VTI", &[(date(2025, 1, 14), 100.0), (date(2025, 1, 15), 102.0)])
        .with("QQQ", &[(date(2025, 1, 14), 500.0), (date(2025, 1, 15), 495.0)])
}

pub fn two_etf_intraday() -> MockIntraday {
    MockIntraday::default()
        .with(
            "VTI",
            &[
                (utc(2025, 1, 15, 14, 30), 100.5),
                (utc(2025, 1, 15, 14, 35), 101.0),
                (utc(2025, 1, 15, 14, 40), 101.5),
            ],
        )
        .with(
            "QQQ",
            &[
                (utc(2025, 1, 15, 14, 30), 499.0),
                (utc(2025, 1, 15, 14, 35), 497.0),
                (utc(2025, 1, 15, 14, 40), 496.0),
            ],
        )
}

pub fn two_etf_fx() -> Arc<MockFx> {
    Arc::new(MockFx::new(
        &[(utc(2025, 1, 15, 14, 30), 20.1), (utc(2025, 1, 15, 14, 45), 20.3)],
        &[(date(2025, 1, 14), 19.9), (date(2025, 1, 15), 20.35)],
    ))
}

pub fn two_etf_providers() -> ProviderSet {
    provider_set(
        two_etf_holdings(),
        two_etf_daily(),
        two_etf_intraday(),
        two_etf_fx(),
        fixing(date(2025, 1, 15), 20.40, 20.00),
    )
}
