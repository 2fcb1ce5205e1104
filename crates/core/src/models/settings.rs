use chrono_tz::Tz;
use std::fmt;

use crate::errors::CoreError;

/// A configuration value that must never be printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Runtime settings of the attribution pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Alpha Vantage API key (`ALPHAVANTAGE_API_KEY`)
    pub alphavantage_api_key: Secret,

    /// Fund endpoint prefix; the fund id is appended (`INVESTMENTS_API_URL`)
    pub investments_api_url: Secret,

    /// Fund to attribute (`FUND_ID`)
    pub fund_id: u32,

    /// Calendar days scanned back for the previous session (`CALENDAR_LOOKBACK_DAYS`)
    pub calendar_lookback_days: i64,

    /// Timezone the intraday grid is built in (`MARKET_TIMEZONE`)
    pub market_timezone: Tz,

    /// Intraday grid step (`INTRADAY_INTERVAL_MINUTES`)
    pub intraday_interval_minutes: i64,

    /// Alpha Vantage FX_INTRADAY interval (`FX_INTRADAY_INTERVAL`)
    pub fx_intraday_interval: String,

    /// Currency the holdings are priced in
    pub base_currency: String,

    /// Currency the fund reports in
    pub quote_currency: String,
}

impl Settings {
    pub const DEFAULT_FUND_ID: u32 = 6;
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 10;
    pub const MAX_LOOKBACK_DAYS: i64 = 366;
    pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Mexico_City;
    pub const DEFAULT_INTERVAL_MINUTES: i64 = 5;
    pub const DEFAULT_FX_INTERVAL: &'static str = "15min";

    /// Settings with defaults for everything but the two secrets.
    pub fn new(alphavantage_api_key: impl Into<String>, investments_api_url: impl Into<String>) -> Self {
        Self {
            alphavantage_api_key: Secret::new(alphavantage_api_key),
            investments_api_url: Secret::new(investments_api_url),
            fund_id: Self::DEFAULT_FUND_ID,
            calendar_lookback_days: Self::DEFAULT_LOOKBACK_DAYS,
            market_timezone: Self::DEFAULT_TIMEZONE,
            intraday_interval_minutes: Self::DEFAULT_INTERVAL_MINUTES,
            fx_intraday_interval: Self::DEFAULT_FX_INTERVAL.to_string(),
            base_currency: "USD".to_string(),
            quote_currency: "MXN".to_string(),
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CoreError::Config(format!("{key} is not set")))
        };

        let mut settings = Self::new(
            required("ALPHAVANTAGE_API_KEY")?,
            required("INVESTMENTS_API_URL")?,
        );

        if let Some(v) = lookup("FUND_ID") {
            settings.fund_id = parse_var("FUND_ID", &v)?;
        }
        if let Some(v) = lookup("CALENDAR_LOOKBACK_DAYS") {
            settings.calendar_lookback_days = parse_var("CALENDAR_LOOKBACK_DAYS", &v)?;
        }
        if let Some(v) = lookup("MARKET_TIMEZONE") {
            settings.market_timezone = v.trim().parse::<Tz>().map_err(|e| {
                CoreError::Config(format!("MARKET_TIMEZONE={v} is not a valid timezone: {e}"))
            })?;
        }
        if let Some(v) = lookup("INTRADAY_INTERVAL_MINUTES") {
            settings.intraday_interval_minutes = parse_var("INTRADAY_INTERVAL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("FX_INTRADAY_INTERVAL") {
            settings.fx_intraday_interval = v.trim().to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=Self::MAX_LOOKBACK_DAYS).contains(&self.calendar_lookback_days) {
            return Err(CoreError::Config(format!(
                "CALENDAR_LOOKBACK_DAYS must be between 1 and {}, got {}",
                Self::MAX_LOOKBACK_DAYS,
                self.calendar_lookback_days
            )));
        }
        // Bar sizes the intraday chart endpoint accepts.
        const INTRADAY_INTERVALS: [i64; 7] = [1, 2, 5, 15, 30, 60, 90];
        if !INTRADAY_INTERVALS.contains(&self.intraday_interval_minutes) {
            return Err(CoreError::Config(format!(
                "INTRADAY_INTERVAL_MINUTES must be one of {INTRADAY_INTERVALS:?}, got {}",
                self.intraday_interval_minutes
            )));
        }
        const FX_INTERVALS: [&str; 5] = ["1min", "5min", "15min", "30min", "60min"];
        if !FX_INTERVALS.contains(&self.fx_intraday_interval.as_str()) {
            return Err(CoreError::Config(format!(
                "FX_INTRADAY_INTERVAL must be one of {FX_INTERVALS:?}, got {}",
                self.fx_intraday_interval
            )));
        }
        Ok(())
    }

    /// Currency pair label, e.g. "USD/MXN".
    pub fn fx_pair(&self) -> String {
        format!("{}/{}", self.base_currency, self.quote_currency)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, CoreError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CoreError::Config(format!("{key}={value} is invalid: {e}")))
}
