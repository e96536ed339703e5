use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::{
    domain::{
        ApplicationRecord, Block, BlockId, DailyApplication, PhaseId, ProgramStartDate,
        RecordKind, YearlyApplication,
    },
    errors::{FarmError, Result},
    notify::{NotificationChannel, Table},
};

use super::{RecordFilter, RecordSet, RecordStore};

/// Volatile store for tests and embedding. Publishes a change notification after every
/// successful write when a channel is attached.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<RecordSet>,
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            records: RwLock::default(),
            channel: Some(channel),
        }
    }

    /// Seeds the store with an existing record set, for example one loaded elsewhere.
    pub fn from_records(records: RecordSet) -> Self {
        Self {
            records: RwLock::new(records),
            channel: None,
        }
    }

    pub fn snapshot(&self) -> Result<RecordSet> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RecordSet>> {
        self.records
            .read()
            .map_err(|_| FarmError::Storage("record store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RecordSet>> {
        self.records
            .write()
            .map_err(|_| FarmError::Storage("record store lock poisoned".into()))
    }

    /// Applies `change` and notifies after the lock is released.
    fn mutate<T>(
        &self,
        table: Table,
        change: impl FnOnce(&mut RecordSet) -> Result<T>,
    ) -> Result<T> {
        let result = {
            let mut records = self.write()?;
            change(&mut records)?
        };
        if let Some(channel) = &self.channel {
            channel.publish(table);
        }
        Ok(result)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn query_yearly(&self, filter: &RecordFilter) -> Result<Vec<YearlyApplication>> {
        Ok(self.read()?.query_yearly(filter))
    }

    fn query_daily(&self, filter: &RecordFilter) -> Result<Vec<DailyApplication>> {
        Ok(self.read()?.query_daily(filter))
    }

    fn insert(&self, record: ApplicationRecord) -> Result<Uuid> {
        let table = Table::for_kind(record.kind());
        self.mutate(table, |records| records.insert(record))
    }

    fn delete(&self, kind: RecordKind, id: Uuid) -> Result<()> {
        self.mutate(Table::for_kind(kind), |records| records.delete(kind, id))
    }

    fn list_blocks(&self, phase_id: PhaseId) -> Result<Vec<Block>> {
        Ok(self.read()?.blocks_in_phase(phase_id))
    }

    fn insert_block(&self, phase_id: PhaseId, label: &str) -> Result<Block> {
        self.mutate(Table::Blocks, |records| records.insert_block(phase_id, label))
    }

    fn delete_block(&self, block_id: BlockId) -> Result<()> {
        self.mutate(Table::Blocks, |records| records.delete_block(block_id))
    }

    fn program_start(&self, phase_id: PhaseId) -> Result<Option<ProgramStartDate>> {
        Ok(self.read()?.program_start(phase_id))
    }

    fn insert_program_start(&self, start: ProgramStartDate) -> Result<()> {
        self.mutate(Table::ProgramStartDates, |records| {
            records.insert_program_start(start)
        })
    }

    fn update_program_start(&self, start: ProgramStartDate) -> Result<()> {
        self.mutate(Table::ProgramStartDates, |records| {
            records.update_program_start(start)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LocalChannel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn successful_writes_publish_and_failures_do_not() {
        let channel = LocalChannel::shared();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        channel.on_change(
            Table::Blocks,
            Arc::new(move |_: Table| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let store = InMemoryRecordStore::with_channel(channel);

        store.insert_block(1, "A").unwrap();
        assert!(store.insert_block(1, "A").is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.list_blocks(1).unwrap().len(), 1);
    }

    #[test]
    fn seeded_store_keeps_its_block_counter() {
        let mut seed = RecordSet::default();
        seed.insert_block(1, "1").unwrap();
        let dropped = seed.insert_block(1, "2").unwrap();
        seed.delete_block(dropped.id).unwrap();

        let store = InMemoryRecordStore::from_records(seed.clone());
        assert_eq!(store.snapshot().unwrap(), seed);
        assert_eq!(store.insert_block(1, "3").unwrap().id, 3);
        assert_eq!(store.snapshot().unwrap().blocks.len(), 2);
    }
}
