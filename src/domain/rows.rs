//! Loosely typed rows as persisted by a record store.
//!
//! Every field is optional on the wire; conversion into the typed records rejects
//! rows that are missing data or break a record invariant.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{
        application::{BagSize, DailyApplication, YearlyApplication},
        common::{BlockId, PhaseId},
    },
    errors::{FarmError, Result},
    window::PeriodKey,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct YearlyRow {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub phase_id: Option<PhaseId>,
    #[serde(default)]
    pub block_id: Option<BlockId>,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub fertilizer_name: Option<String>,
    #[serde(default)]
    pub amount_per_palm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyRow {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub phase_id: Option<PhaseId>,
    #[serde(default)]
    pub block_id: Option<BlockId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub worker_name: Option<String>,
    #[serde(default)]
    pub bag_size: Option<u32>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn required<T>(value: Option<T>, table: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| FarmError::malformed(format!("{table} row is missing `{field}`")))
}

impl TryFrom<YearlyRow> for YearlyApplication {
    type Error = FarmError;

    fn try_from(row: YearlyRow) -> Result<Self> {
        const TABLE: &str = "yearly application";
        let id = required(row.id, TABLE, "id")?;
        let period_start = required(row.period_start, TABLE, "period_start")?;
        if period_start.day() != 1 {
            return Err(FarmError::malformed(format!(
                "{TABLE} {id} has period_start {period_start}, expected the first of a month"
            )));
        }
        let fertilizer_name = required(row.fertilizer_name, TABLE, "fertilizer_name")?;
        if fertilizer_name.trim().is_empty() {
            return Err(FarmError::malformed(format!(
                "{TABLE} {id} has an empty fertilizer name"
            )));
        }
        let amount_per_palm = required(row.amount_per_palm, TABLE, "amount_per_palm")?;
        if !amount_per_palm.is_finite() || amount_per_palm <= 0.0 {
            return Err(FarmError::malformed(format!(
                "{TABLE} {id} has non-positive amount {amount_per_palm}"
            )));
        }
        Ok(YearlyApplication {
            id,
            phase_id: required(row.phase_id, TABLE, "phase_id")?,
            block_id: required(row.block_id, TABLE, "block_id")?,
            period: PeriodKey::from_date(period_start),
            fertilizer_name,
            amount_per_palm,
            created_at: row.created_at.unwrap_or_default(),
        })
    }
}

impl From<&YearlyApplication> for YearlyRow {
    fn from(record: &YearlyApplication) -> Self {
        Self {
            id: Some(record.id),
            phase_id: Some(record.phase_id),
            block_id: Some(record.block_id),
            period_start: Some(record.period.date()),
            fertilizer_name: Some(record.fertilizer_name.clone()),
            amount_per_palm: Some(record.amount_per_palm),
            created_at: Some(record.created_at),
        }
    }
}

impl TryFrom<DailyRow> for DailyApplication {
    type Error = FarmError;

    fn try_from(row: DailyRow) -> Result<Self> {
        const TABLE: &str = "daily application";
        let id = required(row.id, TABLE, "id")?;
        let worker_name = required(row.worker_name, TABLE, "worker_name")?;
        if worker_name.trim().is_empty() {
            return Err(FarmError::malformed(format!(
                "{TABLE} {id} has an empty worker name"
            )));
        }
        let bag_size = BagSize::try_from(required(row.bag_size, TABLE, "bag_size")?)
            .map_err(|err| FarmError::malformed(format!("{TABLE} {id}: {err}")))?;
        let quantity = required(row.quantity, TABLE, "quantity")?;
        if quantity < 1 {
            return Err(FarmError::malformed(format!("{TABLE} {id} has zero quantity")));
        }
        Ok(DailyApplication {
            id,
            phase_id: required(row.phase_id, TABLE, "phase_id")?,
            block_id: required(row.block_id, TABLE, "block_id")?,
            date: required(row.date, TABLE, "date")?,
            worker_name,
            bag_size,
            quantity,
            created_at: row.created_at.unwrap_or_default(),
        })
    }
}

impl From<&DailyApplication> for DailyRow {
    fn from(record: &DailyApplication) -> Self {
        Self {
            id: Some(record.id),
            phase_id: Some(record.phase_id),
            block_id: Some(record.block_id),
            date: Some(record.date),
            worker_name: Some(record.worker_name.clone()),
            bag_size: Some(record.bag_size.kg()),
            quantity: Some(record.quantity),
            created_at: Some(record.created_at),
        }
    }
}
