//! Row-change notifications.
//!
//! Notifications carry only the table that changed. Delivery is best-effort and
//! may repeat, so subscribers refetch and recompute rather than patch state.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use serde::{Deserialize, Serialize};

use crate::domain::RecordKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    YearlyApplications,
    DailyApplications,
    Blocks,
    ProgramStartDates,
}

impl Table {
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Yearly => Table::YearlyApplications,
            RecordKind::Daily => Table::DailyApplications,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::YearlyApplications => "yearly_applications",
            Table::DailyApplications => "daily_applications",
            Table::Blocks => "blocks",
            Table::ProgramStartDates => "program_start_dates",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type ChangeCallback = Arc<dyn Fn(Table) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Push channel for row changes. Implementations never block the publisher on subscriber work
/// beyond invoking the callbacks.
pub trait NotificationChannel: Send + Sync {
    fn on_change(&self, table: Table, callback: ChangeCallback) -> SubscriptionId;

    /// Returns `false` when the id was not subscribed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn publish(&self, table: Table);
}

/// Handle owned by the subscriber. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    table: Table,
    channel: Arc<dyn NotificationChannel>,
    active: bool,
}

impl Subscription {
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        table: Table,
        callback: ChangeCallback,
    ) -> Self {
        let id = channel.on_change(table, callback);
        tracing::debug!(table = %table, "subscribed to row changes");
        Self {
            id,
            table,
            channel,
            active: true,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        tracing::debug!(table = %self.table, "unsubscribed from row changes");
        self.channel.unsubscribe(self.id)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("table", &self.table)
            .field("active", &self.active)
            .finish()
    }
}

/// In-process channel that invokes callbacks synchronously on the publishing thread.
#[derive(Default)]
pub struct LocalChannel {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Table, ChangeCallback)>>,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl NotificationChannel for LocalChannel {
    fn on_change(&self, table: Table, callback: ChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, table, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(existing, _, _)| *existing != id);
        subscribers.len() != before
    }

    fn publish(&self, table: Table) {
        // Callbacks run outside the lock so they may subscribe or publish themselves.
        let targets: Vec<ChangeCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|(_, subscribed, _)| *subscribed == table)
            .map(|(_, _, callback)| Arc::clone(callback))
            .collect();
        tracing::debug!(table = %table, subscribers = targets.len(), "publishing row change");
        for callback in targets {
            callback(table);
        }
    }
}
