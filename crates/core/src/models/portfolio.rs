use serde::{Deserialize, Serialize};

/// One position of the fund as reported by the investments API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Exchange ticker, upper-cased (e.g., "VTI")
    pub ticker: String,

    /// Display name of the instrument
    pub name: String,

    /// Portfolio weight as a fraction (0.25 = 25%)
    pub weight: f64,
}

impl Holding {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            name: name.into(),
            weight,
        }
    }
}

/// The fund composition: which instruments it holds and with what weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Fund identifier in the investments API
    pub fund_id: u32,

    /// Positions in the order the API returned them
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(fund_id: u32, holdings: Vec<Holding>) -> Self {
        Self { fund_id, holdings }
    }

    /// Tickers of all holdings, in API order.
    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    /// Weight of a ticker (case-insensitive), if held.
    pub fn weight_of(&self, ticker: &str) -> Option<f64> {
        let upper = ticker.to_uppercase();
        self.holdings
            .iter()
            .find(|h| h.ticker == upper)
            .map(|h| h.weight)
    }

    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}
