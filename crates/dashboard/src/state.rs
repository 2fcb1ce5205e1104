use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use fund_attribution_core::errors::CoreError;
use fund_attribution_core::models::attribution::AttributionReport;
use fund_attribution_core::FundAttribution;

use crate::config::DashboardConfig;

/// Anything that can produce an attribution report.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn report(&self, now: DateTime<Utc>) -> Result<AttributionReport, CoreError>;
}

#[async_trait]
impl ReportSource for FundAttribution {
    async fn report(&self, now: DateTime<Utc>) -> Result<AttributionReport, CoreError> {
        self.run(now).await
    }
}

/// Last computed report, reused while younger than the TTL.
///
/// Only one refresh runs at a time; requests arriving during a refresh
/// wait for it and reuse its result. Failures are not cached.
pub struct ReportCache {
    ttl: Duration,
    slot: RwLock<Option<(DateTime<Utc>, Arc<AttributionReport>)>>,
    refresh: Mutex<()>,
}

impl ReportCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX).min(i64::MAX / 1000)),
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// The cached report if it is still fresh at `now`.
    pub async fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<AttributionReport>> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some((computed_at, report)) if now - *computed_at < self.ttl => Some(report.clone()),
            _ => None,
        }
    }

    pub async fn store(&self, report: AttributionReport, now: DateTime<Utc>) -> Arc<AttributionReport> {
        let report = Arc::new(report);
        *self.slot.write().await = Some((now, report.clone()));
        report
    }

    /// Serve the cached report or compute a new one from `source`.
    pub async fn get_or_refresh(
        &self,
        source: &dyn ReportSource,
        now: DateTime<Utc>,
    ) -> Result<Arc<AttributionReport>, CoreError> {
        if let Some(report) = self.fresh(now).await {
            return Ok(report);
        }

        let _guard = self.refresh.lock().await;
        if let Some(report) = self.fresh(now).await {
            return Ok(report);
        }

        debug!("report cache miss, recomputing");
        let report = source.report(now).await?;
        Ok(self.store(report, now).await)
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ReportSource>,
    pub cache: Arc<ReportCache>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(source: Arc<dyn ReportSource>, config: DashboardConfig) -> Self {
        Self {
            source,
            cache: Arc::new(ReportCache::new(config.report_ttl_seconds)),
            config: Arc::new(config),
        }
    }

    pub async fn report(&self) -> Result<Arc<AttributionReport>, CoreError> {
        self.cache.get_or_refresh(self.source.as_ref(), Utc::now()).await
    }
}
