//! Program start dates and blocks, the reference data the program table hangs off.

use chrono::NaiveDate;

use crate::domain::{sort_blocks, Block, BlockId, Displayable, PhaseId, ProgramStartDate};
use crate::errors::{FarmError, Result};
use crate::storage::RecordStore;

pub struct ProgramService;

impl ProgramService {
    pub fn start_date(store: &dyn RecordStore, phase_id: PhaseId) -> Result<ProgramStartDate> {
        store.program_start(phase_id)?.ok_or_else(|| {
            FarmError::not_found(format!("program start date for phase {phase_id}"))
        })
    }

    /// Creates the phase's start date, or moves it when one exists.
    ///
    /// Existing yearly rows stay keyed by calendar month, so moving the start date
    /// changes which program-year column shows them.
    pub fn set_start_date(
        store: &dyn RecordStore,
        phase_id: PhaseId,
        start_date: NaiveDate,
    ) -> Result<ProgramStartDate> {
        let start = ProgramStartDate::new(phase_id, start_date);
        match store.program_start(phase_id)? {
            Some(previous) => {
                store.update_program_start(start.clone())?;
                tracing::info!(
                    phase = phase_id,
                    from = %previous.start_date,
                    to = %start_date,
                    "moved program start date"
                );
            }
            None => {
                store.insert_program_start(start.clone())?;
                tracing::info!(phase = phase_id, start = %start_date, "set program start date");
            }
        }
        Ok(start)
    }
}

pub struct BlockService;

impl BlockService {
    pub fn add(store: &dyn RecordStore, phase_id: PhaseId, label: &str) -> Result<Block> {
        if label.trim().is_empty() {
            return Err(FarmError::validation("block label must not be empty"));
        }
        let block = store.insert_block(phase_id, label)?;
        tracing::info!(
            phase = phase_id,
            block = block.id,
            label = %block.display_label(),
            "added block"
        );
        Ok(block)
    }

    pub fn remove(store: &dyn RecordStore, block_id: BlockId) -> Result<()> {
        store.delete_block(block_id)?;
        tracing::info!(block = block_id, "removed block");
        Ok(())
    }

    /// Blocks in display order.
    pub fn list(store: &dyn RecordStore, phase_id: PhaseId) -> Result<Vec<Block>> {
        let mut blocks = store.list_blocks(phase_id)?;
        sort_blocks(&mut blocks);
        Ok(blocks)
    }
}
