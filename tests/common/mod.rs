#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use chrono::NaiveDate;
use farm_ledger::{
    config::{Config, ConfigManager},
    core::{
        services::{BlockService, ProgramService},
        time::FixedClock,
    },
    domain::{Block, NewDailyApplication, NewYearlyApplication, PhaseId},
    notify::LocalChannel,
    storage::{json_backend::JsonStoreOptions, JsonRecordStore, RecordStore},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub struct TestEnv {
    pub base: PathBuf,
    pub store: Arc<JsonRecordStore>,
    pub channel: Arc<LocalChannel>,
    pub config_manager: ConfigManager,
}

impl TestEnv {
    pub fn records_path(&self) -> PathBuf {
        self.base.join("records.json")
    }

    /// Opens a second store over the same file, as a fresh process would.
    pub fn reopen(&self, options: JsonStoreOptions) -> farm_ledger::Result<JsonRecordStore> {
        JsonRecordStore::open(self.records_path(), options)
    }
}

/// Creates an isolated JSON store and config manager backed by a unique directory.
pub fn setup_test_env() -> TestEnv {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let channel = LocalChannel::shared();
    let store = JsonRecordStore::open(
        base.join("records.json"),
        JsonStoreOptions {
            backups_dir: Some(base.join("backups")),
            retention: 3,
            strict_rows: true,
        },
    )
    .expect("open json record store")
    .with_channel(channel.clone());
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");

    TestEnv {
        base,
        store: Arc::new(store),
        channel,
        config_manager,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn clock_on(y: i32, m: u32, d: u32) -> FixedClock {
    FixedClock::at_date(date(y, m, d))
}

/// Sets the program start and adds the labelled blocks, returned in insertion order.
pub fn seed_phase(
    store: &dyn RecordStore,
    phase_id: PhaseId,
    start: NaiveDate,
    labels: &[&str],
) -> Vec<Block> {
    ProgramService::set_start_date(store, phase_id, start).expect("set program start");
    labels
        .iter()
        .map(|label| BlockService::add(store, phase_id, label).expect("add block"))
        .collect()
}

pub fn yearly(
    phase_id: PhaseId,
    block: &Block,
    period_start: NaiveDate,
    name: &str,
    amount: f64,
) -> NewYearlyApplication {
    NewYearlyApplication {
        phase_id,
        block_id: Some(block.id),
        period_start,
        fertilizer_name: name.into(),
        amount_per_palm: amount,
    }
}

pub fn daily(
    phase_id: PhaseId,
    block: &Block,
    date: NaiveDate,
    worker: &str,
    bag_size_kg: u32,
    quantity: u32,
) -> NewDailyApplication {
    NewDailyApplication {
        phase_id,
        block_id: Some(block.id),
        date,
        worker_name: worker.into(),
        bag_size_kg,
        quantity,
    }
}

pub fn default_config() -> Config {
    Config::default()
}
