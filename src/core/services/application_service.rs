//! Validated writes for fertilizer applications.

use uuid::Uuid;

use crate::core::time::Clock;
use crate::domain::{
    ApplicationRecord, DailyApplication, NewDailyApplication, NewYearlyApplication, RecordKind,
    YearlyApplication,
};
use crate::errors::{FarmError, Result};
use crate::storage::{RecordFilter, RecordStore};

/// Validates input before any store interaction, then writes through the record store.
pub struct ApplicationService;

impl ApplicationService {
    /// Records a yearly application. The phase must already have a program start date.
    pub fn record_yearly(
        store: &dyn RecordStore,
        clock: &dyn Clock,
        input: NewYearlyApplication,
    ) -> Result<YearlyApplication> {
        let record = input.into_record(clock.now()).map_err(|err| {
            tracing::warn!(error = %err, "rejected yearly application");
            err
        })?;
        if store.program_start(record.phase_id)?.is_none() {
            return Err(FarmError::validation(format!(
                "phase {} has no program start date",
                record.phase_id
            )));
        }
        store.insert(ApplicationRecord::Yearly(record.clone()))?;
        tracing::info!(
            id = %record.id,
            block = record.block_id,
            period = %record.period,
            fertilizer = %record.fertilizer_name,
            "recorded yearly application"
        );
        Ok(record)
    }

    pub fn record_daily(
        store: &dyn RecordStore,
        clock: &dyn Clock,
        input: NewDailyApplication,
    ) -> Result<DailyApplication> {
        let record = input.into_record(clock.now()).map_err(|err| {
            tracing::warn!(error = %err, "rejected daily application");
            err
        })?;
        store.insert(ApplicationRecord::Daily(record.clone()))?;
        tracing::info!(
            id = %record.id,
            block = record.block_id,
            date = %record.date,
            worker = %record.worker_name,
            "recorded daily application"
        );
        Ok(record)
    }

    pub fn delete(store: &dyn RecordStore, kind: RecordKind, id: Uuid) -> Result<()> {
        store.delete(kind, id)?;
        tracing::info!(%id, kind = %kind, "deleted application");
        Ok(())
    }

    /// Edits are a delete of the old row plus an insert of a new one with a fresh id.
    /// The replacement is written first so a failed insert leaves the old row in place.
    /// If the old row then cannot be deleted, the replacement is removed again and the
    /// delete error is returned.
    pub fn replace_yearly(
        store: &dyn RecordStore,
        clock: &dyn Clock,
        id: Uuid,
        input: NewYearlyApplication,
    ) -> Result<YearlyApplication> {
        input.validate()?;
        let exists = store
            .query_yearly(&RecordFilter::phase(input.phase_id))?
            .iter()
            .any(|record| record.id == id);
        if !exists {
            return Err(FarmError::not_found(format!("{} {id}", RecordKind::Yearly)));
        }
        let replacement = Self::record_yearly(store, clock, input)?;
        if let Err(err) = store.delete(RecordKind::Yearly, id) {
            if let Err(rollback) = store.delete(RecordKind::Yearly, replacement.id) {
                tracing::warn!(
                    %id,
                    replacement = %replacement.id,
                    error = %rollback,
                    "could not roll back replacement row"
                );
            }
            return Err(err);
        }
        tracing::info!(from = %id, to = %replacement.id, "replaced yearly application");
        Ok(replacement)
    }
}
