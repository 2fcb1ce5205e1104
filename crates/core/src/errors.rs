use thiserror::Error;

/// Unified error type for the entire fund-attribution-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Fund {0} has no positions")]
    EmptyPortfolio(u32),

    #[error("Price not available for {symbol} on {date}")]
    PriceNotAvailable {
        symbol: String,
        date: String,
    },

    #[error("FX rate not available for {pair}: {detail}")]
    FxRateNotAvailable {
        pair: String,
        detail: String,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL, and Alpha Vantage takes the key as a query param.
        CoreError::Network(redact_query(&e.to_string()))
    }
}

/// Strip everything after the first `?` so query-string secrets never reach logs.
pub fn redact_query(msg: &str) -> String {
    match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg.to_string(),
    }
}
