//! Totals over yearly-granularity applications.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{BlockId, YearlyApplication},
    window::PeriodKey,
};

/// Summed kg per palm keyed by fertilizer name.
pub type FertilizerTotals = BTreeMap<String, f64>;

/// One product recorded in a program-table cell. Cells list products separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellEntry {
    pub id: Uuid,
    pub fertilizer_name: String,
    pub amount_per_palm: f64,
}

impl From<&YearlyApplication> for CellEntry {
    fn from(record: &YearlyApplication) -> Self {
        Self {
            id: record.id,
            fertilizer_name: record.fertilizer_name.clone(),
            amount_per_palm: record.amount_per_palm,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlockTotals {
    pub by_fertilizer: FertilizerTotals,
    pub grand_total: f64,
}

impl BlockTotals {
    pub fn is_empty(&self) -> bool {
        self.by_fertilizer.is_empty()
    }
}

/// Totals for one summary window, bounds inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowSummary {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub totals: FertilizerTotals,
    pub grand_total: f64,
}

/// Everything applied to a block in one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodTotals {
    pub period: PeriodKey,
    pub by_fertilizer: FertilizerTotals,
    pub total: f64,
}

fn for_block(
    records: &[YearlyApplication],
    block_id: BlockId,
) -> impl Iterator<Item = &YearlyApplication> {
    records.iter().filter(move |record| record.block_id == block_id)
}

fn accumulate<'a>(records: impl Iterator<Item = &'a YearlyApplication>) -> BlockTotals {
    let mut totals = BlockTotals::default();
    for record in records {
        *totals
            .by_fertilizer
            .entry(record.fertilizer_name.clone())
            .or_insert(0.0) += record.amount_per_palm;
        totals.grand_total += record.amount_per_palm;
    }
    totals
}

/// Every product recorded for `block_id` in `period`, in record order, unsummed.
pub fn cell_totals(
    records: &[YearlyApplication],
    block_id: BlockId,
    period: PeriodKey,
) -> Vec<CellEntry> {
    for_block(records, block_id)
        .filter(|record| record.period == period)
        .map(CellEntry::from)
        .collect()
}

pub fn block_fertilizer_totals(
    records: &[YearlyApplication],
    block_id: BlockId,
    periods: &BTreeSet<PeriodKey>,
) -> FertilizerTotals {
    block_totals(records, block_id, periods).by_fertilizer
}

/// Sum of every product's amount over `periods`, ignoring product identity.
pub fn block_grand_total(
    records: &[YearlyApplication],
    block_id: BlockId,
    periods: &BTreeSet<PeriodKey>,
) -> f64 {
    for_block(records, block_id)
        .filter(|record| periods.contains(&record.period))
        .map(|record| record.amount_per_palm)
        .sum()
}

/// Per-fertilizer and grand totals in one pass.
pub fn block_totals(
    records: &[YearlyApplication],
    block_id: BlockId,
    periods: &BTreeSet<PeriodKey>,
) -> BlockTotals {
    accumulate(for_block(records, block_id).filter(|record| periods.contains(&record.period)))
}

/// Sums the block's records whose period falls in `[window_start, window_end]`.
pub fn year_summary_window(
    records: &[YearlyApplication],
    block_id: BlockId,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> WindowSummary {
    let totals = accumulate(for_block(records, block_id).filter(|record| {
        let date = record.period.date();
        date >= window_start && date <= window_end
    }));
    WindowSummary {
        window_start,
        window_end,
        totals: totals.by_fertilizer,
        grand_total: totals.grand_total,
    }
}

/// Per-period history for a block, oldest first. Periods with no records are omitted.
pub fn block_history(records: &[YearlyApplication], block_id: BlockId) -> Vec<PeriodTotals> {
    let mut by_period: BTreeMap<PeriodKey, Vec<&YearlyApplication>> = BTreeMap::new();
    for record in for_block(records, block_id) {
        by_period.entry(record.period).or_default().push(record);
    }
    by_period
        .into_iter()
        .map(|(period, rows)| {
            let totals = accumulate(rows.into_iter());
            PeriodTotals {
                period,
                by_fertilizer: totals.by_fertilizer,
                total: totals.grand_total,
            }
        })
        .collect()
}

/// Per-fertilizer usage across every block for periods in `[window_start, window_end]`.
pub fn phase_fertilizer_usage(
    records: &[YearlyApplication],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> BlockTotals {
    accumulate(records.iter().filter(|record| {
        let date = record.period.date();
        date >= window_start && date <= window_end
    }))
}
