//! Keeps the latest program table for one phase, recomputed on row-change notifications.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, Weak,
};

use crate::config::Config;
use crate::core::services::DashboardService;
use crate::domain::PhaseId;
use crate::errors::Result;
use crate::notify::{ChangeCallback, NotificationChannel, Subscription, Table};
use crate::projection::ProgramTable;
use crate::storage::RecordStore;

/// Tables whose changes invalidate the program table.
pub const WATCHED_TABLES: [Table; 3] = [
    Table::YearlyApplications,
    Table::Blocks,
    Table::ProgramStartDates,
];

/// Issued at the start of a recompute. Only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

pub struct ProgramTableFeed {
    store: Arc<dyn RecordStore>,
    config: Config,
    phase_id: PhaseId,
    issued: AtomicU64,
    latest: Mutex<Option<(Generation, ProgramTable)>>,
}

impl ProgramTableFeed {
    pub fn new(store: Arc<dyn RecordStore>, config: Config, phase_id: PhaseId) -> Self {
        Self {
            store,
            config,
            phase_id,
            issued: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    pub fn phase_id(&self) -> PhaseId {
        self.phase_id
    }

    pub fn begin(&self) -> Generation {
        Generation(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publishes `table` unless a newer ticket has been issued since `ticket`.
    pub fn commit(&self, ticket: Generation, table: ProgramTable) -> bool {
        if ticket.0 != self.issued.load(Ordering::SeqCst) {
            tracing::debug!(
                phase = self.phase_id,
                ticket = ticket.0,
                "discarded superseded recompute"
            );
            return false;
        }
        let mut latest = self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if matches!(latest.as_ref(), Some((current, _)) if *current > ticket) {
            return false;
        }
        *latest = Some((ticket, table));
        true
    }

    /// Refetches and rebuilds the table. Returns whether the result was published.
    pub fn refresh(&self) -> Result<bool> {
        let ticket = self.begin();
        let table =
            DashboardService::program_table(self.store.as_ref(), &self.config, self.phase_id)?;
        Ok(self.commit(ticket, table))
    }

    pub fn latest(&self) -> Option<ProgramTable> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|(_, table)| table.clone())
    }

    /// Subscribes to every watched table. Dropping the returned handles detaches the feed;
    /// the callbacks hold only a weak reference, so dropping the feed also stops refreshes.
    pub fn attach(self: &Arc<Self>, channel: Arc<dyn NotificationChannel>) -> Vec<Subscription> {
        WATCHED_TABLES
            .iter()
            .map(|table| {
                let feed: Weak<Self> = Arc::downgrade(self);
                let callback: ChangeCallback = Arc::new(move |changed: Table| {
                    let Some(feed) = feed.upgrade() else {
                        return;
                    };
                    if let Err(err) = feed.refresh() {
                        tracing::warn!(
                            phase = feed.phase_id,
                            table = %changed,
                            error = %err,
                            "program table refresh failed"
                        );
                    }
                });
                Subscription::new(Arc::clone(&channel), *table, callback)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::{BlockService, ProgramService};
    use crate::notify::LocalChannel;
    use crate::storage::InMemoryRecordStore;
    use chrono::NaiveDate;

    fn seeded_store(channel: Arc<LocalChannel>) -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::with_channel(channel));
        ProgramService::set_start_date(
            store.as_ref(),
            1,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        store
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let store = seeded_store(LocalChannel::shared());
        let feed = ProgramTableFeed::new(store.clone(), Config::default(), 1);
        let stale = feed.begin();
        let fresh = feed.begin();
        let table =
            DashboardService::program_table(store.as_ref(), &Config::default(), 1).unwrap();

        assert!(feed.commit(fresh, table.clone()));
        assert!(!feed.commit(stale, table));
    }

    #[test]
    fn block_insert_triggers_refresh() {
        let channel = LocalChannel::shared();
        let store = seeded_store(channel.clone());
        let feed = Arc::new(ProgramTableFeed::new(store.clone(), Config::default(), 1));
        let subscriptions = feed.attach(channel.clone());
        assert!(feed.latest().is_none());

        BlockService::add(store.as_ref(), 1, "1").unwrap();
        assert_eq!(feed.latest().map(|table| table.rows.len()), Some(1));

        drop(subscriptions);
        assert_eq!(channel.subscriber_count(), 0);
    }
}
