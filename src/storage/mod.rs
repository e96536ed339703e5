pub mod json_backend;
pub mod memory;
pub mod record_set;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{
        ApplicationRecord, Block, BlockId, DailyApplication, PhaseId, ProgramStartDate,
        RecordKind, YearlyApplication,
    },
    errors::{FarmError, Result},
    window::PeriodKey,
};

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(FarmError::validation(format!(
                "date range end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Query filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub phase_id: Option<PhaseId>,
    pub block_id: Option<BlockId>,
    pub period: Option<PeriodKey>,
    pub date_range: Option<DateRange>,
}

impl RecordFilter {
    pub fn phase(phase_id: PhaseId) -> Self {
        Self {
            phase_id: Some(phase_id),
            ..Self::default()
        }
    }

    pub fn with_block(mut self, block_id: Option<BlockId>) -> Self {
        self.block_id = block_id;
        self
    }

    pub fn with_period(mut self, period: PeriodKey) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    fn matches_scope(&self, phase_id: PhaseId, block_id: BlockId) -> bool {
        self.phase_id.map_or(true, |id| id == phase_id)
            && self.block_id.map_or(true, |id| id == block_id)
    }

    pub fn matches_yearly(&self, record: &YearlyApplication) -> bool {
        self.matches_scope(record.phase_id, record.block_id)
            && self.period.map_or(true, |period| period == record.period)
            && self
                .date_range
                .map_or(true, |range| range.contains(record.period.date()))
    }

    pub fn matches_daily(&self, record: &DailyApplication) -> bool {
        self.matches_scope(record.phase_id, record.block_id)
            && self.period.map_or(true, |period| period.contains(record.date))
            && self
                .date_range
                .map_or(true, |range| range.contains(record.date))
    }
}

/// Abstraction over the hosted relational store holding blocks, program start dates,
/// and both application tables. Queries return rows in insertion order.
pub trait RecordStore: Send + Sync {
    fn query_yearly(&self, filter: &RecordFilter) -> Result<Vec<YearlyApplication>>;
    fn query_daily(&self, filter: &RecordFilter) -> Result<Vec<DailyApplication>>;

    /// Fails with `ConstraintViolation` on a duplicate id or an unknown block.
    fn insert(&self, record: ApplicationRecord) -> Result<Uuid>;
    fn delete(&self, kind: RecordKind, id: Uuid) -> Result<()>;

    fn list_blocks(&self, phase_id: PhaseId) -> Result<Vec<Block>>;
    fn insert_block(&self, phase_id: PhaseId, label: &str) -> Result<Block>;
    /// Fails with `ConstraintViolation` while applications still reference the block.
    fn delete_block(&self, block_id: BlockId) -> Result<()>;

    fn program_start(&self, phase_id: PhaseId) -> Result<Option<ProgramStartDate>>;
    fn insert_program_start(&self, start: ProgramStartDate) -> Result<()>;
    fn update_program_start(&self, start: ProgramStartDate) -> Result<()>;
}

pub use json_backend::JsonRecordStore;
pub use memory::InMemoryRecordStore;
pub use record_set::RecordSet;
