//! Totals over daily-granularity applications.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{BagSize, BlockId, DailyApplication},
    window::PeriodKey,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyEntry {
    pub id: Uuid,
    pub block_id: BlockId,
    pub worker_name: String,
    pub bag_size: BagSize,
    pub quantity: u32,
    pub total_kg: f64,
}

impl From<&DailyApplication> for DailyEntry {
    fn from(record: &DailyApplication) -> Self {
        Self {
            id: record.id,
            block_id: record.block_id,
            worker_name: record.worker_name.clone(),
            bag_size: record.bag_size,
            quantity: record.quantity,
            total_kg: record.total_kg(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkerTotals {
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyMonthTotals {
    pub month: PeriodKey,
    pub block_id: Option<BlockId>,
    pub total_kg: f64,
    pub application_count: usize,
    pub by_worker: BTreeMap<String, WorkerTotals>,
}

/// Daily applications for an exact block and date.
pub fn daily_cell_entries(
    records: &[DailyApplication],
    block_id: BlockId,
    date: NaiveDate,
) -> Vec<DailyEntry> {
    daily_entries_on(records, Some(block_id), date)
}

/// Daily applications on `date`, optionally limited to one block.
pub fn daily_entries_on(
    records: &[DailyApplication],
    block_id: Option<BlockId>,
    date: NaiveDate,
) -> Vec<DailyEntry> {
    records
        .iter()
        .filter(|record| record.date == date && in_scope(record, block_id))
        .map(DailyEntry::from)
        .collect()
}

pub fn daily_month_totals(
    records: &[DailyApplication],
    block_id: Option<BlockId>,
    month: PeriodKey,
) -> DailyMonthTotals {
    let mut totals = DailyMonthTotals {
        month,
        block_id,
        total_kg: 0.0,
        application_count: 0,
        by_worker: BTreeMap::new(),
    };
    for record in records
        .iter()
        .filter(|record| month.contains(record.date) && in_scope(record, block_id))
    {
        let kg = record.total_kg();
        totals.total_kg += kg;
        totals.application_count += 1;
        let worker = totals
            .by_worker
            .entry(record.worker_name.clone())
            .or_default();
        worker.amount += kg;
        worker.count += 1;
    }
    totals
}

fn in_scope(record: &DailyApplication, block_id: Option<BlockId>) -> bool {
    block_id.map_or(true, |id| record.block_id == id)
}
