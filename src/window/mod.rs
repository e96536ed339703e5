//! Month arithmetic, period keys, and program-year windows.
//!
//! Every helper here anchors on the first day of a month so that stepping
//! across months of different lengths can never skip or repeat a month.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{FarmError, Result};

/// Months covered by one program year.
pub const MONTHS_PER_PROGRAM_YEAR: i32 = 12;
/// Month columns shown per program year; the last one repeats the next year's first month.
pub const MONTH_COLUMNS_PER_YEAR: usize = 13;

const PERIOD_KEY_FORMAT: &str = "%Y-%m-%d";

/// First-of-month date used to group yearly-granularity applications.
///
/// Serializes as `YYYY-MM-01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey(NaiveDate);

impl PeriodKey {
    /// Normalizes any date to the first of its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(first_of_month(date))
    }

    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn shift(&self, months: i32) -> Self {
        Self(shift_month(self.0, months))
    }

    /// True when `date` falls anywhere inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        first_of_month(date) == self.0
    }

    pub fn short_label(&self) -> String {
        self.0.format("%b").to_string()
    }

    /// Human-readable `Month YYYY` form accepted by [`compare_month_strings`].
    pub fn long_label(&self) -> String {
        self.0.format("%B %Y").to_string()
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PERIOD_KEY_FORMAT))
    }
}

impl FromStr for PeriodKey {
    type Err = FarmError;

    fn from_str(raw: &str) -> Result<Self> {
        NaiveDate::parse_from_str(raw.trim(), PERIOD_KEY_FORMAT)
            .map(Self::from_date)
            .map_err(|err| FarmError::validation(format!("invalid period key `{raw}`: {err}")))
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = FarmError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.to_string()
    }
}

/// One entry of a generated month sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSlot {
    pub period: PeriodKey,
    pub label: String,
}

impl MonthSlot {
    pub fn date(&self) -> NaiveDate {
        self.period.date()
    }
}

/// Produces `count` consecutive months beginning at `start`'s month, inclusive.
pub fn month_sequence(start: NaiveDate, count: usize) -> Vec<MonthSlot> {
    let first = PeriodKey::from_date(start);
    (0..count)
        .map(|offset| {
            let period = first.shift(offset as i32);
            MonthSlot {
                label: period.short_label(),
                period,
            }
        })
        .collect()
}

/// Normalizes `date` to its `YYYY-MM-01` aggregation key.
pub fn period_key(date: NaiveDate) -> String {
    PeriodKey::from_date(date).to_string()
}

/// Parses a `Month YYYY` label (full or abbreviated month name) as the first of that month.
pub fn parse_month_label(raw: &str) -> Result<PeriodKey> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(&format!("1 {trimmed}"), "%d %B %Y")
        .map(PeriodKey)
        .map_err(|err| FarmError::validation(format!("invalid month label `{raw}`: {err}")))
}

/// Compares two `Month YYYY` labels by calendar order.
pub fn compare_month_strings(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse_month_label(a)?.cmp(&parse_month_label(b)?))
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// Moves `date` by `months`, always landing on the first of the target month.
/// Saturates at the edges of the supported calendar range.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let index = month_index(date) + months as i64;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, month, 1))
        .unwrap_or(if months < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

/// Signed number of whole months from `from`'s month to `to`'s month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    month_index(to) - month_index(from)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(first_next) => (first_next - Duration::days(1)).day(),
        None => 31,
    }
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Inclusive month range summarized by one program-year column.
///
/// Window `k` spans `[start + 12k, start + 12k + 12]`, so its last month is the
/// first month of window `k + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    /// 1-based program year.
    pub year_index: usize,
    pub start: PeriodKey,
    pub end: PeriodKey,
}

impl YearWindow {
    pub fn for_year(program_start: NaiveDate, year_index: usize) -> Self {
        let offset = (year_index.saturating_sub(1) as i32) * MONTHS_PER_PROGRAM_YEAR;
        let start = PeriodKey::from_date(program_start).shift(offset);
        Self {
            year_index,
            start,
            end: start.shift(MONTHS_PER_PROGRAM_YEAR),
        }
    }

    pub fn contains(&self, period: PeriodKey) -> bool {
        period >= self.start && period <= self.end
    }

    pub fn months(&self) -> Vec<MonthSlot> {
        month_sequence(self.start.date(), MONTH_COLUMNS_PER_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_sequence_rolls_over_year_boundary() {
        let months = month_sequence(date(2024, 2, 1), 13);
        assert_eq!(months.len(), 13);
        assert_eq!(months[0].period.to_string(), "2024-02-01");
        assert_eq!(months[10].period.to_string(), "2024-12-01");
        assert_eq!(months[11].period.to_string(), "2025-01-01");
        assert_eq!(months[12].period.to_string(), "2025-02-01");
        assert_eq!(months[0].label, "Feb");
        assert_eq!(months[12].label, "Feb");
        assert_ne!(months[0].period, months[12].period);
    }

    #[test]
    fn month_sequence_ignores_day_of_month() {
        let months = month_sequence(date(2024, 1, 31), 3);
        let keys: Vec<String> = months.iter().map(|m| m.period.to_string()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
    }

    #[test]
    fn period_key_normalizes_to_first_of_month() {
        assert_eq!(period_key(date(2024, 3, 17)), "2024-03-01");
        let parsed: PeriodKey = "2024-03-17".parse().unwrap();
        assert_eq!(parsed.to_string(), "2024-03-01");
        assert!("March".parse::<PeriodKey>().is_err());
    }

    #[test]
    fn compare_month_strings_uses_calendar_order() {
        assert_eq!(
            compare_month_strings("December 2023", "January 2024").unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare_month_strings("Mar 2024", "March 2024").unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            compare_month_strings("May 2025", "April 2025").unwrap(),
            Ordering::Greater
        );
        assert!(matches!(
            compare_month_strings("Smarch 2024", "May 2024"),
            Err(FarmError::Validation(_))
        ));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn shift_month_moves_both_directions() {
        assert_eq!(shift_month(date(2024, 11, 30), 3), date(2025, 2, 1));
        assert_eq!(shift_month(date(2024, 1, 15), -1), date(2023, 12, 1));
        assert_eq!(shift_month(date(2024, 1, 1), -25), date(2021, 12, 1));
        assert_eq!(months_between(date(2023, 12, 9), date(2025, 2, 1)), 14);
    }

    #[test]
    fn consecutive_year_windows_share_exactly_one_month() {
        let start = date(2024, 1, 1);
        for k in 1..12 {
            let current = YearWindow::for_year(start, k);
            let next = YearWindow::for_year(start, k + 1);
            assert_eq!(current.end, next.start);
            let shared = current
                .months()
                .iter()
                .filter(|slot| next.contains(slot.period))
                .count();
            assert_eq!(shared, 1, "windows {k} and {} overlap", k + 1);
        }
    }

    #[test]
    fn period_key_serializes_as_iso_string() {
        let key = PeriodKey::from_ym(2024, 7).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-07-01\"");
        let back: PeriodKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert_eq!(key.long_label(), "July 2024");
    }
}
