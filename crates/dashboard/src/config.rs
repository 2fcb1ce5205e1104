use anyhow::{Context, Result};
use std::path::PathBuf;

/// Web server settings, read from the environment.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,

    /// How long a computed report is served before recomputing (0 = always recompute)
    pub report_ttl_seconds: u64,

    /// Directory served under `/assets` (logos)
    pub assets_dir: PathBuf,

    /// Fund name shown in the page copy
    pub fund_display_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            report_ttl_seconds: 300,
            assets_dir: PathBuf::from("assets"),
            fund_display_name: "Risky Hayek".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("DASHBOARD_HOST").unwrap_or(defaults.host),
            port: match lookup("DASHBOARD_PORT") {
                Some(v) => v.trim().parse().context("DASHBOARD_PORT must be a port number")?,
                None => defaults.port,
            },
            report_ttl_seconds: match lookup("REPORT_TTL_SECONDS") {
                Some(v) => v
                    .trim()
                    .parse()
                    .context("REPORT_TTL_SECONDS must be a non-negative integer")?,
                None => defaults.report_ttl_seconds,
            },
            assets_dir: lookup("ASSETS_DIR").map(PathBuf::from).unwrap_or(defaults.assets_dir),
            fund_display_name: lookup("FUND_DISPLAY_NAME").unwrap_or(defaults.fund_display_name),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
