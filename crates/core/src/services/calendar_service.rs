use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::errors::CoreError;

/// Trading calendar of the Bolsa Mexicana de Valores (XMEX).
///
/// Closed on weekends and on:
/// - New Year's Day (Jan 1)
/// - Constitution Day (first Monday of February)
/// - Benito Juárez's Birthday (third Monday of March)
/// - Holy Thursday and Good Friday
/// - Labour Day (May 1)
/// - Independence Day (Sep 16)
/// - Day of the Dead (Nov 2)
/// - Revolution Day (third Monday of November)
/// - Our Lady of Guadalupe (Dec 12)
/// - Christmas (Dec 25)
#[derive(Debug, Clone, Copy, Default)]
pub struct ExchangeCalendar;

impl ExchangeCalendar {
    pub fn new() -> Self {
        Self
    }

    pub fn is_session(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        let year = date.year();
        let fixed = [(1, 1), (5, 1), (9, 16), (11, 2), (12, 12), (12, 25)];
        if fixed.contains(&(date.month(), date.day())) {
            return true;
        }

        let movable = [
            nth_weekday(year, 2, Weekday::Mon, 1),
            nth_weekday(year, 3, Weekday::Mon, 3),
            nth_weekday(year, 11, Weekday::Mon, 3),
        ];
        if movable.contains(&Some(date)) {
            return true;
        }

        match easter_sunday(year) {
            Some(easter) => date == easter - Duration::days(3) || date == easter - Duration::days(2),
            None => false,
        }
    }

    /// Sessions in `[from, to]`, ascending.
    pub fn sessions(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| self.is_session(*d))
            .collect()
    }

    /// Attribution window ending `today`.
    ///
    /// The start is the second-to-last session in `[today - lookback_days, today]`:
    /// the previous session when today trades, otherwise the one before the
    /// last session.
    pub fn attribution_window(
        &self,
        today: NaiveDate,
        lookback_days: i64,
    ) -> Result<(NaiveDate, NaiveDate), CoreError> {
        let from = Duration::try_days(lookback_days)
            .and_then(|span| today.checked_sub_signed(span))
            .ok_or_else(|| {
                CoreError::Config(format!("lookback of {lookback_days} days is out of range"))
            })?;
        let sessions = self.sessions(from, today);
        match sessions.len().checked_sub(2).map(|i| sessions[i]) {
            Some(start) => Ok((start, today)),
            None => Err(CoreError::InsufficientData(format!(
                "fewer than two trading sessions in the {lookback_days} days before {today}"
            ))),
        }
    }
}

/// `n`-th `weekday` of `month` (1-based `n`).
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// Gregorian Easter Sunday (anonymous computus).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
