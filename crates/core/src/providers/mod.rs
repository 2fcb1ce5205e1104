pub mod registry;
pub mod traits;

// API provider implementations
pub mod alphavantage;
pub mod investments;
pub mod pip;
pub mod yahoo_finance;
