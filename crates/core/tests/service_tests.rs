// ═══════════════════════════════════════════════════════════════════
// Service Tests — calendar, currency, attribution, intraday, charts,
// market data fetching
// ═══════════════════════════════════════════════════════════════════

mod common;

use chrono::Duration;
use std::sync::Arc;

use common::*;
use fund_attribution_core::errors::CoreError;
use fund_attribution_core::models::attribution::{AttributionReport, AttributionRow};
use fund_attribution_core::models::portfolio::{Holding, Portfolio};
use fund_attribution_core::models::price::{DailyPriceTable, PricePoint};
use fund_attribution_core::models::series::{IntradaySeries, IntradayTable};
use fund_attribution_core::services::attribution_service::AttributionService;
use fund_attribution_core::services::calendar_service::ExchangeCalendar;
use fund_attribution_core::services::chart_service::{ChartService, EQUITY_LABEL, FX_LABEL};
use fund_attribution_core::services::currency_service::CurrencyService;
use fund_attribution_core::services::intraday_service::IntradayService;
use fund_attribution_core::services::price_service::{MarketDataService, MarketSnapshot};

const EPS: f64 = 1e-9;
const MX: chrono_tz::Tz = chrono_tz::America::Mexico_City;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

fn daily_table(series: &[(&str, &[(chrono::NaiveDate, f64)])]) -> DailyPriceTable {
    DailyPriceTable::from_series(series.iter().map(|(ticker, points)| {
        (
            ticker.to_string(),
            points.iter().map(|&(d, p)| PricePoint::new(d, p)).collect(),
        )
    }))
}

fn two_etf_table() -> DailyPriceTable {
    daily_table(&[
        ("VTI", &[(date(2025, 1, 14), 100.0), (date(2025, 1, 15), 102.0)]),
        ("QQQ", &[(date(2025, 1, 14), 500.0), (date(2025, 1, 15), 495.0)]),
    ])
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeCalendar
// ═══════════════════════════════════════════════════════════════════

mod calendar {
    use super::*;

    #[test]
    fn weekends_are_closed() {
        let cal = ExchangeCalendar::new();
        assert!(cal.is_session(date(2025, 1, 17)));
        assert!(!cal.is_session(date(2025, 1, 18)));
        assert!(!cal.is_session(date(2025, 1, 19)));
    }

    #[test]
    fn mexican_holidays_2025() {
        let cal = ExchangeCalendar::new();
        for holiday in [
            date(2025, 1, 1),
            date(2025, 2, 3),
            date(2025, 3, 17),
            date(2025, 4, 17),
            date(2025, 4, 18),
            date(2025, 5, 1),
            date(2025, 9, 16),
            date(2025, 11, 17),
            date(2025, 12, 12),
            date(2025, 12, 25),
        ] {
            assert!(cal.is_holiday(holiday), "{holiday} should be a holiday");
            assert!(!cal.is_session(holiday));
        }
    }

    #[test]
    fn ordinary_days_are_not_holidays() {
        let cal = ExchangeCalendar::new();
        assert!(!cal.is_holiday(date(2025, 2, 10)));
        assert!(!cal.is_holiday(date(2025, 4, 21)));
        assert!(!cal.is_holiday(date(2025, 11, 20)));
    }

    #[test]
    fn sessions_in_a_week() {
        let cal = ExchangeCalendar::new();
        let sessions = cal.sessions(date(2025, 1, 13), date(2025, 1, 19));
        assert_eq!(sessions.len(), 5);
        assert_eq!(sessions.first(), Some(&date(2025, 1, 13)));
        assert_eq!(sessions.last(), Some(&date(2025, 1, 17)));
    }

    #[test]
    fn window_on_a_trading_day() {
        let cal = ExchangeCalendar::new();
        assert_eq!(
            cal.attribution_window(date(2025, 1, 15), 10).unwrap(),
            (date(2025, 1, 14), date(2025, 1, 15))
        );
    }

    #[test]
    fn window_on_monday_starts_friday() {
        let cal = ExchangeCalendar::new();
        assert_eq!(
            cal.attribution_window(date(2025, 1, 20), 10).unwrap().0,
            date(2025, 1, 17)
        );
    }

    #[test]
    fn window_on_saturday_starts_one_session_back() {
        let cal = ExchangeCalendar::new();
        assert_eq!(
            cal.attribution_window(date(2025, 1, 18), 10).unwrap(),
            (date(2025, 1, 16), date(2025, 1, 18))
        );
    }

    #[test]
    fn window_skips_holidays() {
        let cal = ExchangeCalendar::new();
        assert_eq!(
            cal.attribution_window(date(2025, 2, 4), 10).unwrap().0,
            date(2025, 1, 31)
        );
        assert_eq!(
            cal.attribution_window(date(2025, 4, 21), 10).unwrap().0,
            date(2025, 4, 16)
        );
    }

    #[test]
    fn oversized_lookback_is_a_config_error() {
        let cal = ExchangeCalendar::new();
        for lookback in [100_000_000_000, i64::MAX] {
            let err = cal.attribution_window(date(2025, 1, 15), lookback).unwrap_err();
            assert!(matches!(err, CoreError::Config(_)), "{lookback}: {err}");
        }
    }

    #[test]
    fn short_lookback_is_insufficient() {
        let cal = ExchangeCalendar::new();
        let err = cal.attribution_window(date(2025, 1, 19), 1).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// CurrencyService
// ═══════════════════════════════════════════════════════════════════

mod currency {
    use super::*;

    #[test]
    fn simple_return() {
        let svc = CurrencyService::new();
        assert!(close(svc.simple_return(100.0, 110.0).unwrap(), 0.1));
        assert!(close(svc.simple_return(20.0, 19.0).unwrap(), -0.05));
        assert_eq!(svc.simple_return(0.0, 5.0), None);
        assert_eq!(svc.simple_return(f64::NAN, 5.0), None);
    }

    #[test]
    fn compound_mixes_asset_and_fx() {
        let svc = CurrencyService::new();
        assert!(close(svc.compound(0.02, 0.02), 0.0404));
        assert!(close(svc.compound(-0.01, 0.02), 0.0098));
        assert!(close(svc.compound(0.0, 0.0), 0.0));
    }

    #[test]
    fn convert_price() {
        assert!(close(CurrencyService::new().convert_price(102.0, 20.4), 2080.8));
    }

    #[test]
    fn convert_table_without_rates_empties_cells() {
        let prices = IntradayTable::from_series(
            vec![(
                "VTI".to_string(),
                IntradaySeries::new(vec![(utc(2025, 1, 15, 14, 30), 100.0)]),
            )],
            MX,
        );
        let rates = IntradayTable::from_series(Vec::<(String, IntradaySeries)>::new(), MX)
            .reindex_ffill(prices.index());
        let converted = CurrencyService::new().convert_table(&prices, &rates);
        assert_eq!(converted.column("VTI").unwrap(), &[None]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// AttributionService
// ═══════════════════════════════════════════════════════════════════

mod attribution {
    use super::*;

    fn rows() -> Vec<AttributionRow> {
        let portfolio = Portfolio::new(6, two_etf_holdings());
        AttributionService::new().calculate(&portfolio, &two_etf_table(), 20.0, 20.4)
    }

    #[test]
    fn rows_follow_portfolio_order() {
        let tickers: Vec<String> = rows().into_iter().map(|r| r.ticker).collect();
        assert_eq!(tickers, vec!["VTI", "QQQ"]);
    }

    #[test]
    fn per_holding_returns() {
        let rows = rows();
        let vti = &rows[0];
        assert_eq!(vti.start_price, Some(100.0));
        assert_eq!(vti.end_price, Some(102.0));
        assert!(close(vti.return_usd.unwrap(), 0.02));
        assert!(close(vti.return_mxn.unwrap(), 0.0404));
        assert!(close(vti.ctr_usd.unwrap(), 0.012));
        assert!(close(vti.ctr_mxn.unwrap(), 0.02424));

        let qqq = &rows[1];
        assert!(close(qqq.return_usd.unwrap(), -0.01));
        assert!(close(qqq.return_mxn.unwrap(), 0.0098));
        assert!(close(qqq.ctr_usd.unwrap(), -0.004));
        assert!(close(qqq.ctr_mxn.unwrap(), 0.00392));
    }

    #[test]
    fn totals_split_equity_and_fx() {
        let svc = AttributionService::new();
        let totals = svc.totals(&rows());
        assert!(close(totals.total_return_usd, 0.008));
        assert!(close(totals.total_return_mxn, 0.02816));
        assert!(close(totals.total_equity_effect, totals.total_return_usd));
        assert!(close(totals.total_fx_effect, 0.02016));
        assert!(close(
            totals.total_equity_effect + totals.total_fx_effect,
            totals.total_return_mxn
        ));
    }

    #[test]
    fn holding_without_prices_is_kept_empty() {
        let mut holdings = two_etf_holdings();
        holdings.push(Holding::new("EWZ", "iShares MSCI Brazil", 0.1));
        let portfolio = Portfolio::new(6, holdings);
        let svc = AttributionService::new();
        let rows = svc.calculate(&portfolio, &two_etf_table(), 20.0, 20.4);

        let ewz = &rows[2];
        assert_eq!(ewz.ticker, "EWZ");
        assert_eq!(ewz.start_price, None);
        assert_eq!(ewz.return_usd, None);
        assert_eq!(ewz.ctr_mxn, None);

        assert!(close(svc.totals(&rows).total_return_mxn, 0.02816));
    }

    #[test]
    fn holding_missing_start_price() {
        let table = daily_table(&[
            ("VTI", &[(date(2025, 1, 14), 100.0), (date(2025, 1, 15), 102.0)]),
            ("QQQ", &[(date(2025, 1, 15), 495.0)]),
        ]);
        let portfolio = Portfolio::new(6, two_etf_holdings());
        let rows = AttributionService::new().calculate(&portfolio, &table, 20.0, 20.4);
        assert_eq!(rows[1].start_price, None);
        assert_eq!(rows[1].end_price, Some(495.0));
        assert_eq!(rows[1].return_mxn, None);
    }

    #[test]
    fn flat_fx_means_no_fx_effect() {
        let portfolio = Portfolio::new(6, two_etf_holdings());
        let svc = AttributionService::new();
        let totals = svc.totals(&svc.calculate(&portfolio, &two_etf_table(), 20.0, 20.0));
        assert!(close(totals.total_fx_effect, 0.0));
        assert!(close(totals.total_return_mxn, totals.total_return_usd));
    }

    #[test]
    fn no_rows_no_totals() {
        let totals = AttributionService::new().totals(&[]);
        assert_eq!(totals.total_return_mxn, 0.0);
        assert_eq!(totals.total_fx_effect, 0.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// IntradayService
// ═══════════════════════════════════════════════════════════════════

mod intraday {
    use super::*;

    fn vti_bars() -> IntradaySeries {
        IntradaySeries::new(vec![
            (utc(2025, 1, 15, 14, 30), 100.5),
            (utc(2025, 1, 15, 14, 35), 101.0),
            (utc(2025, 1, 15, 14, 40), 101.5),
        ])
    }

    fn fx_bars() -> IntradaySeries {
        IntradaySeries::new(vec![
            (utc(2025, 1, 15, 14, 30), 20.1),
            (utc(2025, 1, 15, 14, 45), 20.3),
        ])
    }

    fn snapshot(holdings: Vec<Holding>, intraday: Vec<(String, IntradaySeries)>) -> MarketSnapshot {
        MarketSnapshot {
            portfolio: Portfolio::new(6, holdings),
            start_date: date(2025, 1, 14),
            end_date: date(2025, 1, 15),
            daily_prices: two_etf_table(),
            intraday_prices: intraday,
            fx_intraday: fx_bars(),
            fx_start: 20.0,
            fx_end: 20.4,
        }
    }

    #[test]
    fn single_holding_ends_at_its_mxn_return() {
        let snap = snapshot(
            vec![Holding::new("VTI", "Vanguard", 1.0)],
            vec![("VTI".to_string(), vti_bars())],
        );
        let series = IntradayService::new()
            .calculate(&snap, MX, Duration::minutes(5))
            .unwrap();

        let stamps: Vec<&str> = series.iter().map(|p| p.timestamp.as_str()).collect();
        assert_eq!(
            stamps,
            vec![
                "2025-01-15T08:30:00-06:00",
                "2025-01-15T08:35:00-06:00",
                "2025-01-15T08:40:00-06:00",
            ]
        );
        assert!(close(series[0].return_pct, 0.0));
        assert!(close(series[1].return_pct, (101.0 * 20.1 / 2000.0 - 1.0) * 100.0));
        assert!((series[2].return_pct - 4.04).abs() < 1e-9);
    }

    #[test]
    fn weighted_across_holdings() {
        let snap = snapshot(
            two_etf_holdings(),
            vec![
                ("VTI".to_string(), vti_bars()),
                (
                    "QQQ".to_string(),
                    IntradaySeries::new(vec![
                        (utc(2025, 1, 15, 14, 30), 499.0),
                        (utc(2025, 1, 15, 14, 35), 497.0),
                        (utc(2025, 1, 15, 14, 40), 496.0),
                    ]),
                ),
            ],
        );
        let series = IntradayService::new()
            .calculate(&snap, MX, Duration::minutes(5))
            .unwrap();
        assert_eq!(series.len(), 3);

        // row 0 pinned to start, row 2 pinned to end, row 1 at 20.1
        let vti = [2000.0, 101.0 * 20.1, 102.0 * 20.4];
        let qqq = [10000.0, 497.0 * 20.1, 495.0 * 20.4];
        let mut growth = 1.0;
        for row in 1..3 {
            let r = 0.6 * (vti[row] / vti[row - 1] - 1.0) + 0.4 * (qqq[row] / qqq[row - 1] - 1.0);
            growth *= 1.0 + r;
            assert!(close(series[row].return_pct, growth * 100.0 - 100.0));
        }
    }

    #[test]
    fn holding_without_bars_does_not_contribute() {
        let snap = snapshot(two_etf_holdings(), vec![("VTI".to_string(), vti_bars())]);
        let series = IntradayService::new()
            .calculate(&snap, MX, Duration::minutes(5))
            .unwrap();
        let expected = 0.6 * (101.0 * 20.1 / 2000.0 - 1.0) * 100.0;
        assert!(close(series[1].return_pct, expected));
    }

    #[test]
    fn no_bars_is_insufficient() {
        let snap = snapshot(two_etf_holdings(), vec![]);
        let err = IntradayService::new()
            .calculate(&snap, MX, Duration::minutes(5))
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// ChartService
// ═══════════════════════════════════════════════════════════════════

mod charts {
    use super::*;

    fn report() -> AttributionReport {
        let portfolio = Portfolio::new(6, two_etf_holdings());
        let svc = AttributionService::new();
        let rows = svc.calculate(&portfolio, &two_etf_table(), 20.0, 20.4);
        let totals = svc.totals(&rows);
        AttributionReport {
            fund_id: 6,
            start_date: date(2025, 1, 14),
            end_date: date(2025, 1, 15),
            fx_start: 20.0,
            fx_end: 20.4,
            rows,
            totals,
            intraday: vec![],
            generated_at: utc(2025, 1, 15, 21, 0),
        }
    }

    #[test]
    fn by_type_in_percent() {
        let chart = ChartService::new().contribution_chart(&report());
        assert_eq!(chart.by_type[0].label, EQUITY_LABEL);
        assert_eq!(chart.by_type[1].label, FX_LABEL);
        assert!(close(chart.by_type[0].value_pct, 0.8));
        assert!(close(chart.by_type[1].value_pct, 2.016));
    }

    #[test]
    fn by_instrument_sorted_ascending() {
        let chart = ChartService::new().contribution_chart(&report());
        let labels: Vec<&str> = chart.by_instrument.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Invesco QQQ Trust", "Vanguard Total Stock Market ETF"]);
        assert!(close(chart.by_instrument[1].value_pct, 2.424));
        assert_eq!(chart.height, 200);
    }

    #[test]
    fn by_instrument_skips_rows_without_contribution() {
        let mut report = report();
        report.rows[0].ctr_mxn = None;
        let chart = ChartService::new().contribution_chart(&report);
        assert_eq!(chart.by_instrument.len(), 1);
    }

    #[test]
    fn heights() {
        let svc = ChartService::new();
        assert_eq!(svc.chart_height(0), 200);
        assert_eq!(svc.chart_height(6), 200);
        assert_eq!(svc.chart_height(10), 300);
        assert_eq!(svc.table_height(2), 105);
    }

    #[test]
    fn breakdown_heaviest_first() {
        let mut report = report();
        report.rows.reverse();
        let rows = ChartService::new().breakdown_rows(&report);
        assert_eq!(rows[0].ticker, "VTI");
        assert_eq!(rows[1].ticker, "QQQ");
    }
}

// ═══════════════════════════════════════════════════════════════════
// MarketDataService
// ═══════════════════════════════════════════════════════════════════

mod market_data {
    use super::*;

    fn service_with(fx: Arc<MockFx>, fixing: MockFixing) -> MarketDataService {
        MarketDataService::new(provider_set(
            two_etf_holdings(),
            two_etf_daily(),
            two_etf_intraday(),
            fx,
            fixing,
        ))
    }

    #[tokio::test]
    async fn fixing_published_today() {
        let fx = two_etf_fx();
        let svc = service_with(fx.clone(), fixing(date(2025, 1, 15), 20.40, 20.00));
        let (start, end) = svc
            .resolve_fx_boundaries("USD", "MXN", date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap();
        assert_eq!((start, end), (20.00, 20.40));
        assert_eq!(fx.daily_calls(), 0);
    }

    #[tokio::test]
    async fn stale_fixing_ends_at_daily_close() {
        let fx = two_etf_fx();
        let svc = service_with(fx.clone(), fixing(date(2025, 1, 14), 20.20, 20.10));
        let (start, end) = svc
            .resolve_fx_boundaries("USD", "MXN", date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap();
        assert_eq!((start, end), (20.20, 20.35));
        assert_eq!(fx.daily_calls(), 1);
    }

    #[tokio::test]
    async fn fixing_failure_uses_daily_closes() {
        let svc = service_with(two_etf_fx(), MockFixing { fixing: None });
        let (start, end) = svc
            .resolve_fx_boundaries("USD", "MXN", date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap();
        assert_eq!((start, end), (19.9, 20.35));
    }

    #[tokio::test]
    async fn no_rate_anywhere() {
        let fx = Arc::new(MockFx::new(&[], &[]));
        let svc = service_with(fx, MockFixing { fixing: None });
        let err = svc
            .resolve_fx_boundaries("USD", "MXN", date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap_err();
        match err {
            CoreError::FxRateNotAvailable { pair, .. } => assert_eq!(pair, "USD/MXN"),
            other => panic!("expected FxRateNotAvailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_rate_is_rejected() {
        let svc = service_with(two_etf_fx(), fixing(date(2025, 1, 15), 20.40, 0.0));
        let err = svc
            .resolve_fx_boundaries("USD", "MXN", date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid start rate"));
    }

    #[tokio::test]
    async fn failing_ticker_is_skipped() {
        let svc = service_with(two_etf_fx(), MockFixing { fixing: None });
        let tickers = vec!["VTI".to_string(), "SPY".to_string()];
        let table = svc
            .fetch_daily_prices(&tickers, date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap();
        let got: Vec<&str> = table.tickers().collect();
        assert_eq!(got, vec!["VTI"]);
    }

    #[tokio::test]
    async fn no_daily_prices_at_all() {
        let svc = service_with(two_etf_fx(), MockFixing { fixing: None });
        let err = svc
            .fetch_daily_prices(&["SPY".to_string()], date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }

    #[tokio::test]
    async fn intraday_skips_missing_tickers() {
        let svc = service_with(two_etf_fx(), MockFixing { fixing: None });
        let series = svc
            .fetch_intraday_prices(&["QQQ".to_string(), "SPY".to_string()], "5m")
            .await
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].0, "QQQ");
    }

    #[tokio::test]
    async fn empty_fx_intraday() {
        let fx = Arc::new(MockFx::new(&[], &[(date(2025, 1, 14), 20.0)]));
        let svc = service_with(fx, MockFixing { fixing: None });
        let err = svc.fetch_fx_intraday("USD", "MXN", "15min").await.unwrap_err();
        assert!(matches!(err, CoreError::FxRateNotAvailable { .. }));
    }

    #[tokio::test]
    async fn empty_portfolio() {
        let svc = MarketDataService::new(provider_set(
            vec![],
            two_etf_daily(),
            two_etf_intraday(),
            two_etf_fx(),
            MockFixing { fixing: None },
        ));
        let err = svc.fetch_portfolio(6).await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyPortfolio(6)));
    }

    #[tokio::test]
    async fn snapshot_gathers_everything() {
        let svc = MarketDataService::new(two_etf_providers());
        let snap = svc
            .snapshot(&settings(), date(2025, 1, 14), date(2025, 1, 15))
            .await
            .unwrap();
        assert_eq!(snap.portfolio.fund_id, 6);
        assert_eq!(snap.intraday_prices.len(), 2);
        assert_eq!(snap.fx_intraday.len(), 2);
        assert_eq!(snap.daily_prices.len(), 2);
        assert_eq!((snap.fx_start, snap.fx_end), (20.00, 20.40));
    }
}
