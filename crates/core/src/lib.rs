pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{DateTime, Duration, Utc};
use models::{attribution::AttributionReport, settings::Settings};
use providers::registry::ProviderSet;
use services::{
    attribution_service::AttributionService, calendar_service::ExchangeCalendar,
    intraday_service::IntradayService, price_service::MarketDataService,
};
use tracing::info;

use errors::CoreError;

/// Main entry point for the fund-attribution core library.
/// Holds the settings and all services needed to produce a report.
#[must_use]
pub struct FundAttribution {
    settings: Settings,
    calendar: ExchangeCalendar,
    market_data: MarketDataService,
    attribution_service: AttributionService,
    intraday_service: IntradayService,
}

impl std::fmt::Debug for FundAttribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundAttribution")
            .field("fund_id", &self.settings.fund_id)
            .field("market_timezone", &self.settings.market_timezone)
            .field("providers", &self.market_data.providers().describe())
            .finish()
    }
}

impl FundAttribution {
    /// Build with the live HTTP providers.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let providers = ProviderSet::live(&settings)?;
        Ok(Self::with_providers(settings, providers))
    }

    /// Build with caller-supplied providers (tests, alternative sources).
    pub fn with_providers(settings: Settings, providers: ProviderSet) -> Self {
        Self {
            settings,
            calendar: ExchangeCalendar::new(),
            market_data: MarketDataService::new(providers),
            attribution_service: AttributionService::new(),
            intraday_service: IntradayService::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderSet {
        self.market_data.providers()
    }

    /// Produce the attribution report as of `now`.
    ///
    /// "Today" is the calendar date of `now` in the market timezone. The
    /// window starts at the previous trading session.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<AttributionReport, CoreError> {
        let tz = self.settings.market_timezone;
        let today = now.with_timezone(&tz).date_naive();
        let (start_date, end_date) = self
            .calendar
            .attribution_window(today, self.settings.calendar_lookback_days)?;
        info!(fund_id = self.settings.fund_id, %start_date, %end_date, "computing attribution");

        let snapshot = self.market_data.snapshot(&self.settings, start_date, end_date).await?;
        info!(
            pair = %self.settings.fx_pair(),
            fx_start = snapshot.fx_start,
            fx_end = snapshot.fx_end,
            "FX boundaries"
        );

        let step = Duration::minutes(self.settings.intraday_interval_minutes);
        let intraday = self.intraday_service.calculate(&snapshot, tz, step)?;

        let rows = self.attribution_service.calculate(
            &snapshot.portfolio,
            &snapshot.daily_prices,
            snapshot.fx_start,
            snapshot.fx_end,
        );
        let totals = self.attribution_service.totals(&rows);
        info!(
            total_return_mxn = totals.total_return_mxn,
            total_fx_effect = totals.total_fx_effect,
            "attribution ready"
        );

        Ok(AttributionReport {
            fund_id: snapshot.portfolio.fund_id,
            start_date,
            end_date,
            fx_start: snapshot.fx_start,
            fx_end: snapshot.fx_end,
            rows,
            totals,
            intraday,
            generated_at: now,
        })
    }
}
