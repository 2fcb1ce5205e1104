use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single price data point (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Daily closes for several tickers over a shared date axis.
///
/// Built as the outer union of every ticker's dates, so a ticker that did
/// not trade on some date has an empty cell there. The first row holds the
/// attribution start prices and the last row the end prices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyPriceTable {
    /// Sorted, de-duplicated dates
    dates: Vec<NaiveDate>,

    /// ticker → one cell per date
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl DailyPriceTable {
    /// Build the table from per-ticker series. Series may be unsorted; a
    /// duplicated date keeps the last price seen.
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<PricePoint>)>,
    {
        let by_ticker: BTreeMap<String, BTreeMap<NaiveDate, f64>> = series
            .into_iter()
            .map(|(ticker, points)| {
                let prices = points
                    .into_iter()
                    .filter(|p| p.price.is_finite())
                    .map(|p| (p.date, p.price))
                    .collect();
                (ticker.to_uppercase(), prices)
            })
            .collect();

        let dates: Vec<NaiveDate> = by_ticker
            .values()
            .flat_map(|prices| prices.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = by_ticker
            .into_iter()
            .map(|(ticker, prices)| {
                let cells = dates.iter().map(|d| prices.get(d).copied()).collect();
                (ticker, cells)
            })
            .collect();

        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Price of `ticker` on `date`, if that cell is filled.
    pub fn get(&self, ticker: &str, date: NaiveDate) -> Option<f64> {
        let idx = self.dates.binary_search(&date).ok()?;
        self.columns.get(&ticker.to_uppercase())?[idx]
    }

    /// Value in the first row for `ticker`.
    pub fn start_price(&self, ticker: &str) -> Option<f64> {
        self.columns.get(&ticker.to_uppercase())?.first().copied().flatten()
    }

    /// Value in the last row for `ticker`.
    pub fn end_price(&self, ticker: &str) -> Option<f64> {
        self.columns.get(&ticker.to_uppercase())?.last().copied().flatten()
    }
}

/// Snapshot of the official USD/MXN fixing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxFixing {
    /// Date the fixing was published
    pub published: NaiveDate,

    /// Latest published rate
    pub value: f64,

    /// Rate published for the previous session
    pub previous: f64,
}

impl FxFixing {
    /// Resolve the window boundaries for a window ending `today`.
    ///
    /// Returns `(end, start)`. When the page already shows today's fixing,
    /// the window runs from the previous fixing to today's. Otherwise the
    /// latest fixing is the start and the end is unknown yet.
    pub fn resolve(&self, today: NaiveDate) -> (Option<f64>, f64) {
        if self.published == today {
            (Some(self.value), self.previous)
        } else {
            (None, self.value)
        }
    }
}
