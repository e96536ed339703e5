//! Table contents shared by the store backends, with the store's constraint rules.

use uuid::Uuid;

use crate::{
    domain::{
        ApplicationRecord, Block, BlockId, BlockScoped, DailyApplication, Identifiable, PhaseId,
        ProgramStartDate, RecordKind, YearlyApplication,
    },
    errors::{FarmError, Result},
};

use super::RecordFilter;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub blocks: Vec<Block>,
    pub program_starts: Vec<ProgramStartDate>,
    pub yearly: Vec<YearlyApplication>,
    pub daily: Vec<DailyApplication>,
    /// Lowest id the next block may take. Ids of deleted blocks are never handed out again.
    pub next_block_id: BlockId,
}

impl RecordSet {
    pub fn query_yearly(&self, filter: &RecordFilter) -> Vec<YearlyApplication> {
        self.yearly
            .iter()
            .filter(|record| filter.matches_yearly(record))
            .cloned()
            .collect()
    }

    pub fn query_daily(&self, filter: &RecordFilter) -> Vec<DailyApplication> {
        self.daily
            .iter()
            .filter(|record| filter.matches_daily(record))
            .cloned()
            .collect()
    }

    pub fn insert(&mut self, record: ApplicationRecord) -> Result<Uuid> {
        let id = record.id();
        if self.contains_id(id) {
            return Err(FarmError::constraint(format!(
                "{} {id} already exists",
                record.kind()
            )));
        }
        self.ensure_block(record.phase_id(), record.block_id())?;
        match record {
            ApplicationRecord::Yearly(yearly) => self.yearly.push(yearly),
            ApplicationRecord::Daily(daily) => self.daily.push(daily),
        }
        Ok(id)
    }

    pub fn delete(&mut self, kind: RecordKind, id: Uuid) -> Result<()> {
        let removed = match kind {
            RecordKind::Yearly => remove_by_id(&mut self.yearly, id).is_some(),
            RecordKind::Daily => remove_by_id(&mut self.daily, id).is_some(),
        };
        if removed {
            Ok(())
        } else {
            Err(FarmError::not_found(format!("{kind} {id}")))
        }
    }

    pub fn blocks_in_phase(&self, phase_id: PhaseId) -> Vec<Block> {
        self.blocks
            .iter()
            .filter(|block| block.phase_id == phase_id)
            .cloned()
            .collect()
    }

    pub fn insert_block(&mut self, phase_id: PhaseId, label: &str) -> Result<Block> {
        let label = label.trim();
        if label.is_empty() {
            return Err(FarmError::validation("block label must not be empty"));
        }
        if self
            .blocks
            .iter()
            .any(|block| block.phase_id == phase_id && block.label == label)
        {
            return Err(FarmError::constraint(format!(
                "block `{label}` already exists in phase {phase_id}"
            )));
        }
        let highest = self.blocks.iter().map(|block| block.id).max().unwrap_or(0);
        let id = self.next_block_id.max(highest + 1);
        self.next_block_id = id + 1;
        let block = Block::new(id, phase_id, label);
        self.blocks.push(block.clone());
        Ok(block)
    }

    pub fn delete_block(&mut self, block_id: BlockId) -> Result<()> {
        let referenced = self.yearly.iter().any(|r| r.block_id == block_id)
            || self.daily.iter().any(|r| r.block_id == block_id);
        if referenced {
            return Err(FarmError::constraint(format!(
                "block {block_id} is still referenced by applications"
            )));
        }
        let before = self.blocks.len();
        self.blocks.retain(|block| block.id != block_id);
        if self.blocks.len() == before {
            return Err(FarmError::not_found(format!("block {block_id}")));
        }
        Ok(())
    }

    pub fn program_start(&self, phase_id: PhaseId) -> Option<ProgramStartDate> {
        self.program_starts
            .iter()
            .find(|start| start.phase_id == phase_id)
            .cloned()
    }

    pub fn insert_program_start(&mut self, start: ProgramStartDate) -> Result<()> {
        if self.program_start(start.phase_id).is_some() {
            return Err(FarmError::constraint(format!(
                "phase {} already has a program start date",
                start.phase_id
            )));
        }
        self.program_starts.push(start);
        Ok(())
    }

    pub fn update_program_start(&mut self, start: ProgramStartDate) -> Result<()> {
        let existing = self
            .program_starts
            .iter_mut()
            .find(|existing| existing.phase_id == start.phase_id)
            .ok_or_else(|| {
                FarmError::not_found(format!("program start date for phase {}", start.phase_id))
            })?;
        *existing = start;
        Ok(())
    }

    fn contains_id(&self, id: Uuid) -> bool {
        self.yearly.iter().any(|r| r.id() == id) || self.daily.iter().any(|r| r.id() == id)
    }

    fn ensure_block(&self, phase_id: PhaseId, block_id: BlockId) -> Result<()> {
        if self
            .blocks
            .iter()
            .any(|block| block.id == block_id && block.phase_id == phase_id)
        {
            Ok(())
        } else {
            Err(FarmError::constraint(format!(
                "block {block_id} does not exist in phase {phase_id}"
            )))
        }
    }
}

fn remove_by_id<T: Identifiable>(items: &mut Vec<T>, id: Uuid) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(index))
}
