pub mod attribution_service;
pub mod calendar_service;
pub mod chart_service;
pub mod currency_service;
pub mod intraday_service;
pub mod price_service;
