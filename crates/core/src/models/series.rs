use chrono::{DateTime, Duration, Offset, Utc};
use chrono_tz::Tz;
use std::collections::{BTreeMap, BTreeSet};

/// Intraday observations of a single instrument, in UTC.
///
/// Kept sorted by timestamp. Non-finite prices are dropped and a repeated
/// timestamp keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntradaySeries {
    points: Vec<(DateTime<Utc>, f64)>,
}

impl IntradaySeries {
    pub fn new(points: Vec<(DateTime<Utc>, f64)>) -> Self {
        let map: BTreeMap<DateTime<Utc>, f64> = points
            .into_iter()
            .filter(|(_, price)| price.is_finite())
            .collect();
        Self {
            points: map.into_iter().collect(),
        }
    }

    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<(DateTime<Utc>, f64)> {
        self.points.last().copied()
    }
}

/// Timestamps × tickers table of intraday prices in a market timezone.
///
/// Every column has exactly one cell per index entry.
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayTable {
    tz: Tz,
    index: Vec<DateTime<Tz>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl IntradayTable {
    /// Outer-join several series on their timestamps and express the index in `tz`.
    pub fn from_series<I>(series: I, tz: Tz) -> Self
    where
        I: IntoIterator<Item = (String, IntradaySeries)>,
    {
        let series: Vec<(String, IntradaySeries)> = series.into_iter().collect();

        let index: Vec<DateTime<Tz>> = series
            .iter()
            .flat_map(|(_, s)| s.points.iter().map(|(t, _)| *t))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|t| t.with_timezone(&tz))
            .collect();

        let columns = series
            .into_iter()
            .map(|(name, s)| {
                let values: BTreeMap<DateTime<Utc>, f64> = s.points.into_iter().collect();
                let cells = index
                    .iter()
                    .map(|t| values.get(&t.with_timezone(&Utc)).copied())
                    .collect();
                (name, cells)
            })
            .collect();

        Self { tz, index, columns }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn index(&self) -> &[DateTime<Tz>] {
        &self.index
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Regular grid of `step` from the floor of the first timestamp to the
    /// floor of the last. Each label takes the last filled value at or before it.
    pub fn resample_ffill(&self, step: Duration) -> Self {
        let (Some(first), Some(last)) = (self.index.first(), self.index.last()) else {
            return self.clone();
        };
        if step <= Duration::zero() {
            return self.clone();
        }

        let start = floor_to_step(first, step);
        let end = floor_to_step(last, step);
        let mut labels = Vec::new();
        let mut cursor = start;
        while cursor <= end {
            labels.push(cursor);
            cursor += step;
        }

        self.reindex_ffill(&labels)
    }

    /// Reindex onto `target`: each target timestamp takes the last filled
    /// value at or before it, or stays empty when nothing precedes it.
    pub fn reindex_ffill(&self, target: &[DateTime<Tz>]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, cells)| {
                let observed: Vec<(DateTime<Tz>, f64)> = self
                    .index
                    .iter()
                    .zip(cells)
                    .filter_map(|(t, v)| v.map(|v| (*t, v)))
                    .collect();
                let reindexed = target
                    .iter()
                    .map(|t| {
                        let pos = observed.partition_point(|(obs, _)| obs <= t);
                        pos.checked_sub(1).map(|i| observed[i].1)
                    })
                    .collect();
                (name.clone(), reindexed)
            })
            .collect();

        Self {
            tz: self.tz,
            index: target.to_vec(),
            columns,
        }
    }

    /// Multiply every cell of row `i` by `factors[i]`; an empty factor empties the row.
    pub fn scale_rows(&self, factors: &[Option<f64>]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, cells)| {
                let scaled = cells
                    .iter()
                    .zip(factors.iter().chain(std::iter::repeat(&None)))
                    .map(|(v, f)| match (v, f) {
                        (Some(v), Some(f)) => Some(v * f),
                        _ => None,
                    })
                    .collect();
                (name.clone(), scaled)
            })
            .collect();

        Self {
            tz: self.tz,
            index: self.index.clone(),
            columns,
        }
    }

    /// Overwrite row `row` using `value_for(ticker)` for every column.
    pub fn set_row<F>(&mut self, row: usize, value_for: F)
    where
        F: Fn(&str) -> Option<f64>,
    {
        if row >= self.index.len() {
            return;
        }
        for (name, cells) in self.columns.iter_mut() {
            cells[row] = value_for(name.as_str());
        }
    }

    /// Period-over-period change per column, with gaps forward-filled
    /// before differencing. Cells without a previous value become 0.
    pub fn pct_change(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, cells)| {
                let mut last_seen: Option<f64> = None;
                let changes = cells
                    .iter()
                    .map(|cell| {
                        let current = cell.or(last_seen);
                        let change = match (last_seen, current) {
                            (Some(prev), Some(cur)) if prev != 0.0 => cur / prev - 1.0,
                            _ => 0.0,
                        };
                        last_seen = current;
                        Some(change)
                    })
                    .collect();
                (name.clone(), changes)
            })
            .collect();

        Self {
            tz: self.tz,
            index: self.index.clone(),
            columns,
        }
    }
}

/// Floor `t` to a multiple of `step`, counted from local midnight.
fn floor_to_step(t: &DateTime<Tz>, step: Duration) -> DateTime<Tz> {
    let step_secs = step.num_seconds().max(1);
    let offset = i64::from(t.offset().fix().local_minus_utc());
    let local_secs = t.timestamp() + offset;
    let excess = Duration::seconds(local_secs.rem_euclid(step_secs))
        + Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos()));
    *t - excess
}

