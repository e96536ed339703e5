use std::{
    cmp::Reverse,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::Config,
    core::utils::{ensure_dir, write_atomic, PathResolver},
    domain::{
        ApplicationRecord, Block, BlockId, DailyApplication, DailyRow, PhaseId, ProgramStartDate,
        RecordKind, YearlyApplication, YearlyRow,
    },
    errors::{FarmError, Result},
    notify::{NotificationChannel, Table},
};

use super::{RecordFilter, RecordSet, RecordStore};

pub const STORE_SCHEMA_VERSION: u32 = 1;

const STORE_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "records";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";
const DEFAULT_RETENTION: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default)]
    program_starts: Vec<ProgramStartDate>,
    #[serde(default)]
    yearly_applications: Vec<YearlyRow>,
    #[serde(default)]
    daily_applications: Vec<DailyRow>,
    #[serde(default)]
    next_block_id: BlockId,
}

fn default_schema_version() -> u32 {
    STORE_SCHEMA_VERSION
}

#[derive(Debug, Clone)]
pub struct JsonStoreOptions {
    pub backups_dir: Option<PathBuf>,
    pub retention: usize,
    /// Fail the load on malformed rows instead of skipping them.
    pub strict_rows: bool,
}

impl Default for JsonStoreOptions {
    fn default() -> Self {
        Self {
            backups_dir: None,
            retention: DEFAULT_RETENTION,
            strict_rows: true,
        }
    }
}

impl From<&Config> for JsonStoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            backups_dir: None,
            retention: config.backup_retention,
            strict_rows: config.strict_rows,
        }
    }
}

/// Single-document JSON store. The whole record set is rewritten on every write, with
/// the previous file kept as a timestamped backup.
pub struct JsonRecordStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    records: RwLock<RecordSet>,
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl JsonRecordStore {
    pub fn open(path: PathBuf, options: JsonStoreOptions) -> Result<Self> {
        let backups_dir = match options.backups_dir {
            Some(dir) => dir,
            None => path
                .parent()
                .map(|parent| parent.join("backups"))
                .unwrap_or_else(|| PathBuf::from("backups")),
        };
        ensure_dir(&backups_dir)?;
        let records = if path.exists() {
            load_records(&path, options.strict_rows)?
        } else {
            RecordSet::default()
        };
        tracing::debug!(
            path = %path.display(),
            yearly = records.yearly.len(),
            daily = records.daily.len(),
            "opened json record store"
        );
        Ok(Self {
            path,
            backups_dir,
            retention: options.retention.max(1),
            records: RwLock::new(records),
            channel: None,
        })
    }

    /// Opens `records.json` under the resolved data directory.
    pub fn open_default(config: &Config) -> Result<Self> {
        let base = PathResolver::resolve_base(config.data_dir.clone());
        ensure_dir(&base)?;
        Self::open(
            PathResolver::records_file_in(&base),
            JsonStoreOptions {
                backups_dir: Some(PathResolver::backup_dir_in(&base)),
                ..JsonStoreOptions::from(config)
            },
        )
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backup files, newest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if let Some(key) = parse_backup_name(&path) {
                entries.push((key, path));
            }
        }
        entries.sort_by_key(|(key, _)| Reverse(*key));
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RecordSet>> {
        self.records
            .read()
            .map_err(|_| FarmError::Storage("record store lock poisoned".into()))
    }

    /// Applies `change` to a copy, persists it, then swaps it in. A failed write leaves
    /// both the file and the cached records untouched.
    fn mutate<T>(
        &self,
        table: Table,
        change: impl FnOnce(&mut RecordSet) -> Result<T>,
    ) -> Result<T> {
        let result = {
            let mut records = self
                .records
                .write()
                .map_err(|_| FarmError::Storage("record store lock poisoned".into()))?;
            let mut next = records.clone();
            let result = change(&mut next)?;
            self.persist(&next)?;
            *records = next;
            result
        };
        if let Some(channel) = &self.channel {
            channel.publish(table);
        }
        Ok(result)
    }

    fn persist(&self, records: &RecordSet) -> Result<()> {
        self.backup_existing_file()?;
        write_atomic(&self.path, &serialize_records(records)?)?;
        tracing::debug!(path = %self.path.display(), "persisted record store");
        Ok(())
    }

    fn backup_existing_file(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        ensure_dir(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut sequence = 0u32;
        let target = loop {
            let candidate = self.backups_dir.join(backup_file_name(&timestamp, sequence));
            if !candidate.exists() {
                break candidate;
            }
            sequence += 1;
        };
        fs::copy(&self.path, &target)?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<()> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&stale) {
                tracing::warn!(path = %stale.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl RecordStore for JsonRecordStore {
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

fn load_records(path: &Path, strict_rows: bool) -> Result<RecordSet> {
    let data = fs::read_to_string(path)?;
    let document: StoredDocument = serde_json::from_str(&data)?;
    if document.schema_version > STORE_SCHEMA_VERSION {
        return Err(FarmError::Storage(format!(
            "record store `{}` is from a newer schema version",
            path.display()
        )));
    }
    Ok(RecordSet {
        blocks: document.blocks,
        program_starts: document.program_starts,
        yearly: convert_rows(document.yearly_applications, strict_rows)?,
        daily: convert_rows(document.daily_applications, strict_rows)?,
        next_block_id: document.next_block_id,
    })
}

fn convert_rows<R, T>(rows: Vec<R>, strict_rows: bool) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = FarmError>,
{
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match T::try_from(row) {
            Ok(record) => records.push(record),
            Err(err) if strict_rows => return Err(err),
            Err(err) => tracing::warn!(error = %err, "skipping malformed row"),
        }
    }
    Ok(records)
}

fn serialize_records(records: &RecordSet) -> Result<String> {
    let document = StoredDocument {
        schema_version: STORE_SCHEMA_VERSION,
        blocks: records.blocks.clone(),
        program_starts: records.program_starts.clone(),
        yearly_applications: records.yearly.iter().map(YearlyRow::from).collect(),
        daily_applications: records.daily.iter().map(DailyRow::from).collect(),
        next_block_id: records.next_block_id,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// `records_<timestamp>.json`, or `records_<timestamp>-<n>.json` when that name is taken.
fn backup_file_name(timestamp: &str, sequence: u32) -> String {
    if sequence == 0 {
        format!("{BACKUP_PREFIX}_{timestamp}.{STORE_EXTENSION}")
    } else {
        format!("{BACKUP_PREFIX}_{timestamp}-{sequence}.{STORE_EXTENSION}")
    }
}

/// Ordering key of a backup written by this store. Other files yield `None`.
fn parse_backup_name(path: &Path) -> Option<(DateTime<Utc>, u32)> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(STORE_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let raw = stem.strip_prefix(&format!("{BACKUP_PREFIX}_"))?;
    let (timestamp, sequence) = match raw.split_once('-') {
        Some((timestamp, sequence)) => (timestamp, sequence.parse().ok()?),
        None => (raw, 0),
    };
    let naive = NaiveDateTime::parse_from_str(timestamp, BACKUP_TIMESTAMP_FORMAT).ok()?;
    Some((DateTime::from_naive_utc_and_offset(naive, Utc), sequence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn backup_names_parse_with_sequence() {
        let (ts, sequence) =
            parse_backup_name(Path::new("records_20240305_101530_000250.json")).unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-05 10:15:30");
        assert_eq!(sequence, 0);

        let first = parse_backup_name(Path::new("records_20240305_101530_000250.json"));
        let second = parse_backup_name(Path::new("records_20240305_101530_000250-1.json"));
        assert!(second > first);
    }

    #[test]
    fn foreign_files_are_not_backups() {
        for name in [
            "notes.json",
            "records_latest.json",
            "records_20240305_101530_000250.txt",
            "records_20240305_101530_000250-x.json",
        ] {
            assert!(parse_backup_name(Path::new(name)).is_none(), "{name}");
        }
    }

    #[test]
    fn generated_names_round_trip() {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        for sequence in [0, 3] {
            let name = backup_file_name(&timestamp, sequence);
            assert_eq!(
                parse_backup_name(Path::new(&name)).map(|(_, seq)| seq),
                Some(sequence)
            );
        }
    }

    #[test]
    fn open_default_uses_configured_data_dir() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(temp.path().to_path_buf()),
            ..Config::default()
        };
        let store = JsonRecordStore::open_default(&config).unwrap();
        store.insert_block(1, "1").unwrap();
        assert_eq!(store.path(), temp.path().join("records.json"));
        assert!(store.path().exists());
        assert!(temp.path().join("backups").is_dir());
    }

    #[test]
    fn block_ids_are_not_reused_after_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("records.json");
        let store = JsonRecordStore::open(path.clone(), JsonStoreOptions::default()).unwrap();
        store.insert_block(1, "1").unwrap();
        let last = store.insert_block(1, "2").unwrap();
        store.delete_block(last.id).unwrap();
        drop(store);

        let reopened = JsonRecordStore::open(path, JsonStoreOptions::default()).unwrap();
        let next = reopened.insert_block(2, "Z").unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn lenient_load_skips_malformed_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("records.json");
        let json = r#"{
            "schema_version": 1,
            "blocks": [{"id": 1, "phase_id": 1, "label": "1"}],
            "yearly_applications": [
                {"id": "0d6a8a3e-7d0c-4b7f-8a55-0c9a1cf2d5a1", "phase_id": 1, "block_id": 1,
                 "period_start": "2024-01-01", "fertilizer_name": "Urea", "amount_per_palm": 0.5},
                {"id": "7a9c1d2e-3f4b-4c5d-8e6f-7a8b9c0d1e2f", "phase_id": 1, "block_id": 1,
                 "period_start": "2024-02-01", "amount_per_palm": 0.5}
            ]
        }"#;
        fs::write(&path, json).unwrap();

        let strict = JsonRecordStore::open(path.clone(), JsonStoreOptions::default());
        assert!(matches!(strict, Err(FarmError::MalformedRecord(_))));

        let lenient = JsonRecordStore::open(
            path,
            JsonStoreOptions {
                strict_rows: false,
                ..JsonStoreOptions::default()
            },
        )
        .unwrap();
        let yearly = lenient.query_yearly(&RecordFilter::default()).unwrap();
        assert_eq!(yearly.len(), 1);
        assert_eq!(yearly[0].fertilizer_name, "Urea");
    }

    #[test]
    fn newer_schema_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("records.json");
        fs::write(&path, r#"{"schema_version": 99}"#).unwrap();
        let err = JsonRecordStore::open(path, JsonStoreOptions::default())
            .err()
            .expect("newer schema must fail");
        assert!(err.to_string().contains("newer schema"));
    }
}
