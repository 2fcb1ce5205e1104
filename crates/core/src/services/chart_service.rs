use std::cmp::Ordering;

use crate::models::attribution::{AttributionReport, AttributionRow};
use crate::models::chart::{BarDatum, ContributionChart};

/// Label of the equity-effect bar.
pub const EQUITY_LABEL: &str = "Acciones";

/// Label of the FX-effect bar.
pub const FX_LABEL: &str = "Tipo de Cambio";

const MIN_CHART_HEIGHT: u32 = 200;
const CHART_ROW_HEIGHT: u32 = 30;
const TABLE_ROW_HEIGHT: u32 = 35;
const TABLE_HEADER_HEIGHT: u32 = 35;

/// Generates chart-ready data sets from an attribution report.
///
/// The core computes all the numbers, the frontend only renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Equity/FX split and per-instrument MXN contributions, in percent.
    /// Instruments are sorted ascending so the largest bar ends on top.
    pub fn contribution_chart(&self, report: &AttributionReport) -> ContributionChart {
        let by_type = vec![
            BarDatum::new(EQUITY_LABEL, report.totals.total_equity_effect * 100.0),
            BarDatum::new(FX_LABEL, report.totals.total_fx_effect * 100.0),
        ];

        let mut by_instrument: Vec<BarDatum> = report
            .rows
            .iter()
            .filter_map(|row| row.ctr_mxn.map(|c| BarDatum::new(row.name.clone(), c * 100.0)))
            .collect();
        by_instrument.sort_by(|a, b| a.value_pct.partial_cmp(&b.value_pct).unwrap_or(Ordering::Equal));

        ContributionChart {
            by_type,
            by_instrument,
            height: self.chart_height(report.rows.len()),
        }
    }

    /// Bar chart height: 30px per instrument, never below 200px.
    pub fn chart_height(&self, rows: usize) -> u32 {
        (rows as u32 * CHART_ROW_HEIGHT).max(MIN_CHART_HEIGHT)
    }

    /// Table height: 35px per row plus the header.
    pub fn table_height(&self, rows: usize) -> u32 {
        rows as u32 * TABLE_ROW_HEIGHT + TABLE_HEADER_HEIGHT
    }

    /// Breakdown rows sorted by weight, heaviest first.
    pub fn breakdown_rows<'a>(&self, report: &'a AttributionReport) -> Vec<&'a AttributionRow> {
        let mut rows: Vec<&AttributionRow> = report.rows.iter().collect();
        rows.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
        rows
    }
}
