use std::sync::Arc;

use super::alphavantage::AlphaVantageProvider;
use super::investments::InvestmentsProvider;
use super::pip::PipProvider;
use super::traits::{
    DailyPriceProvider, FxFixingProvider, FxRateProvider, IntradayPriceProvider, PortfolioProvider,
};
use super::yahoo_finance::YahooFinanceProvider;
use crate::errors::CoreError;
use crate::models::settings::Settings;

/// One provider per data concern.
///
/// Alpha Vantage serves both daily equity closes and FX, so the live set
/// shares one client between the two seams.
#[derive(Clone)]
pub struct ProviderSet {
    pub portfolio: Arc<dyn PortfolioProvider>,
    pub daily_prices: Arc<dyn DailyPriceProvider>,
    pub intraday_prices: Arc<dyn IntradayPriceProvider>,
    pub fx_rates: Arc<dyn FxRateProvider>,
    pub fx_fixing: Arc<dyn FxFixingProvider>,
}

impl ProviderSet {
    /// Wire the real HTTP adapters from settings.
    pub fn live(settings: &Settings) -> Result<Self, CoreError> {
        let alphavantage = Arc::new(AlphaVantageProvider::new(settings.alphavantage_api_key.clone()));
        Ok(Self {
            portfolio: Arc::new(InvestmentsProvider::new(settings.investments_api_url.clone())),
            daily_prices: alphavantage.clone(),
            intraday_prices: Arc::new(YahooFinanceProvider::new()?),
            fx_rates: alphavantage,
            fx_fixing: Arc::new(PipProvider::new()),
        })
    }

    /// Names of the wired providers, for startup logs.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("portfolio", self.portfolio.name().to_string()),
            ("daily_prices", self.daily_prices.name().to_string()),
            ("intraday_prices", self.intraday_prices.name().to_string()),
            ("fx_rates", self.fx_rates.name().to_string()),
            ("fx_fixing", self.fx_fixing.name().to_string()),
        ]
    }
}
