//! Month calendar grids annotated with daily applications.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{daily_entries_on, DailyEntry},
    domain::{BlockId, DailyApplication},
    window::{days_in_month, shift_month, PeriodKey},
};

pub const DAYS_PER_WEEK: usize = 7;
/// Rows needed to show any month with a Sunday-first layout.
pub const GRID_WEEKS: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayCell {
    pub day: u32,
    pub date: NaiveDate,
    pub is_today: bool,
    pub entries: Vec<DailyEntry>,
}

impl DayCell {
    pub fn total_kg(&self) -> f64 {
        self.entries.iter().map(|entry| entry.total_kg).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GridCell {
    Blank,
    Day(DayCell),
}

impl GridCell {
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            GridCell::Day(cell) => Some(cell),
            GridCell::Blank => None,
        }
    }
}

/// Leading blanks (one per weekday before the 1st, Sunday first) followed by one cell per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthGrid {
    pub month: PeriodKey,
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    pub fn leading_blanks(&self) -> usize {
        self.cells
            .iter()
            .take_while(|cell| matches!(cell, GridCell::Blank))
            .count()
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter_map(GridCell::as_day)
    }

    /// Week rows of seven cells; the last row may be short.
    pub fn weeks(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthDirection {
    Prev,
    Next,
}

/// Builds the grid for `month_index0` of `year`. Out-of-range month indexes roll into
/// neighbouring years, so `(2024, 12)` is January 2025.
pub fn build_month_grid(
    year: i32,
    month_index0: i32,
    records: &[DailyApplication],
    block_id: Option<BlockId>,
    today: NaiveDate,
) -> MonthGrid {
    let month = normalize_month(year, month_index0);
    let first = month.date();
    let leading = first.weekday().num_days_from_sunday() as usize;
    let day_count = days_in_month(month.year(), month.month());

    let mut cells = Vec::with_capacity(leading + day_count as usize);
    cells.extend(std::iter::repeat(GridCell::Blank).take(leading));
    for (offset, date) in first.iter_days().take(day_count as usize).enumerate() {
        cells.push(GridCell::Day(DayCell {
            day: offset as u32 + 1,
            date,
            is_today: date == today,
            entries: daily_entries_on(records, block_id, date),
        }));
    }
    MonthGrid { month, cells }
}

/// Steps one calendar month, always returning the first of the target month.
pub fn handle_month_navigation(current: NaiveDate, direction: MonthDirection) -> NaiveDate {
    match direction {
        MonthDirection::Prev => shift_month(current, -1),
        MonthDirection::Next => shift_month(current, 1),
    }
}

fn normalize_month(year: i32, month_index0: i32) -> PeriodKey {
    let anchor = PeriodKey::from_ym(year, 1)
        .map(|key| key.date())
        .unwrap_or(NaiveDate::MIN);
    PeriodKey::from_date(shift_month(anchor, month_index0))
}
