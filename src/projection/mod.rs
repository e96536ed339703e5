//! Year-to-year program table: 13 month columns plus one summary column per
//! program year, one row per block, and a trailing block total.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{
        block_totals, cell_totals, year_summary_window, BlockTotals, CellEntry, WindowSummary,
    },
    domain::{sort_blocks, Block, YearlyApplication},
    window::{PeriodKey, YearWindow},
};

pub const DEFAULT_YEAR_COUNT: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnDescriptor {
    Month {
        period: PeriodKey,
        label: String,
        /// 1-based program year, for grouping only.
        year_index: usize,
    },
    Summary {
        year_index: usize,
        window_start: NaiveDate,
        window_end: NaiveDate,
    },
}

impl ColumnDescriptor {
    pub fn year_index(&self) -> usize {
        match self {
            ColumnDescriptor::Month { year_index, .. }
            | ColumnDescriptor::Summary { year_index, .. } => *year_index,
        }
    }

    pub fn period(&self) -> Option<PeriodKey> {
        match self {
            ColumnDescriptor::Month { period, .. } => Some(*period),
            ColumnDescriptor::Summary { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RowCell {
    Month(Vec<CellEntry>),
    Summary(WindowSummary),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramRow {
    pub block: Block,
    /// Aligned one-to-one with the table's columns.
    pub cells: Vec<RowCell>,
    /// Trailing column over every month column of every year.
    pub totals: BlockTotals,
}

impl ProgramRow {
    pub fn has_data(&self) -> bool {
        !self.totals.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramTable {
    pub program_start: NaiveDate,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<ProgramRow>,
}

/// Repeats 13 month columns then one summary column, `year_count` times.
pub fn build_columns(program_start: NaiveDate, year_count: usize) -> Vec<ColumnDescriptor> {
    let mut columns = Vec::with_capacity(year_count * 14);
    for year_index in 1..=year_count {
        let window = YearWindow::for_year(program_start, year_index);
        columns.extend(window.months().into_iter().map(|slot| ColumnDescriptor::Month {
            period: slot.period,
            label: slot.label,
            year_index,
        }));
        columns.push(ColumnDescriptor::Summary {
            year_index,
            window_start: window.start.date(),
            window_end: window.end.date(),
        });
    }
    columns
}

/// Distinct periods across every month column; the overlapping 13th month counts once.
pub fn month_periods(columns: &[ColumnDescriptor]) -> BTreeSet<PeriodKey> {
    columns.iter().filter_map(ColumnDescriptor::period).collect()
}

pub fn build_row(
    block: &Block,
    columns: &[ColumnDescriptor],
    records: &[YearlyApplication],
) -> ProgramRow {
    let cells = columns
        .iter()
        .map(|column| match column {
            ColumnDescriptor::Month { period, .. } => {
                RowCell::Month(cell_totals(records, block.id, *period))
            }
            ColumnDescriptor::Summary {
                window_start,
                window_end,
                ..
            } => RowCell::Summary(year_summary_window(
                records,
                block.id,
                *window_start,
                *window_end,
            )),
        })
        .collect();
    ProgramRow {
        block: block.clone(),
        cells,
        totals: block_totals(records, block.id, &month_periods(columns)),
    }
}

/// Full table for the given blocks. Blocks without records still get a row of empty cells.
pub fn build_program_table(
    program_start: NaiveDate,
    year_count: usize,
    blocks: &[Block],
    records: &[YearlyApplication],
) -> ProgramTable {
    let columns = build_columns(program_start, year_count);
    let mut sorted = blocks.to_vec();
    sort_blocks(&mut sorted);
    let rows = sorted
        .iter()
        .map(|block| build_row(block, &columns, records))
        .collect();
    ProgramTable {
        program_start,
        columns,
        rows,
    }
}
