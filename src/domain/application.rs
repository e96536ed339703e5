//! Fertilizer application records at yearly (program-month) and daily granularity.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::common::*,
    errors::{FarmError, Result},
    window::PeriodKey,
};

/// Bag sizes offered when recording daily applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BagSize {
    Kg10,
    Kg50,
}

impl BagSize {
    pub const ALL: [BagSize; 2] = [BagSize::Kg10, BagSize::Kg50];

    pub fn kg(self) -> u32 {
        match self {
            BagSize::Kg10 => 10,
            BagSize::Kg50 => 50,
        }
    }
}

impl TryFrom<u32> for BagSize {
    type Error = FarmError;

    fn try_from(kg: u32) -> Result<Self> {
        match kg {
            10 => Ok(BagSize::Kg10),
            50 => Ok(BagSize::Kg50),
            other => Err(FarmError::validation(format!(
                "unsupported bag size {other} kg (expected 10 or 50)"
            ))),
        }
    }
}

impl From<BagSize> for u32 {
    fn from(size: BagSize) -> Self {
        size.kg()
    }
}

impl fmt::Display for BagSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.kg())
    }
}

/// One fertilizer product applied to one block in one program month, in kg per palm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YearlyApplication {
    pub id: Uuid,
    pub phase_id: PhaseId,
    pub block_id: BlockId,
    pub period: PeriodKey,
    pub fertilizer_name: String,
    pub amount_per_palm: f64,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for YearlyApplication {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl BlockScoped for YearlyApplication {
    fn phase_id(&self) -> PhaseId {
        self.phase_id
    }

    fn block_id(&self) -> BlockId {
        self.block_id
    }
}

/// One worker's bagged application to one block on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyApplication {
    pub id: Uuid,
    pub phase_id: PhaseId,
    pub block_id: BlockId,
    pub date: NaiveDate,
    pub worker_name: String,
    pub bag_size: BagSize,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl DailyApplication {
    pub fn total_kg(&self) -> f64 {
        self.bag_size.kg() as f64 * self.quantity as f64
    }
}

impl Identifiable for DailyApplication {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl BlockScoped for DailyApplication {
    fn phase_id(&self) -> PhaseId {
        self.phase_id
    }

    fn block_id(&self) -> BlockId {
        self.block_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Yearly,
    Daily,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Yearly => "yearly application",
            RecordKind::Daily => "daily application",
        })
    }
}

/// A validated application of either granularity, as handed to the record store.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationRecord {
    Yearly(YearlyApplication),
    Daily(DailyApplication),
}

impl ApplicationRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            ApplicationRecord::Yearly(_) => RecordKind::Yearly,
            ApplicationRecord::Daily(_) => RecordKind::Daily,
        }
    }
}

impl Identifiable for ApplicationRecord {
    fn id(&self) -> Uuid {
        match self {
            ApplicationRecord::Yearly(record) => record.id,
            ApplicationRecord::Daily(record) => record.id,
        }
    }
}

impl BlockScoped for ApplicationRecord {
    fn phase_id(&self) -> PhaseId {
        match self {
            ApplicationRecord::Yearly(record) => record.phase_id,
            ApplicationRecord::Daily(record) => record.phase_id,
        }
    }

    fn block_id(&self) -> BlockId {
        match self {
            ApplicationRecord::Yearly(record) => record.block_id,
            ApplicationRecord::Daily(record) => record.block_id,
        }
    }
}

/// Form input for a yearly application. Validated before any store interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewYearlyApplication {
    pub phase_id: PhaseId,
    pub block_id: Option<BlockId>,
    pub period_start: NaiveDate,
    pub fertilizer_name: String,
    pub amount_per_palm: f64,
}

impl NewYearlyApplication {
    pub fn validate(&self) -> Result<()> {
        if self.block_id.is_none() {
            return Err(FarmError::validation("a block must be selected"));
        }
        if self.fertilizer_name.trim().is_empty() {
            return Err(FarmError::validation("fertilizer name must not be empty"));
        }
        if !self.amount_per_palm.is_finite() || self.amount_per_palm <= 0.0 {
            return Err(FarmError::validation(format!(
                "amount per palm must be positive, got {}",
                self.amount_per_palm
            )));
        }
        Ok(())
    }

    /// Validates the input and stamps it as a new record keyed by the first of its month.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<YearlyApplication> {
        self.validate()?;
        let block_id = self
            .block_id
            .ok_or_else(|| FarmError::validation("a block must be selected"))?;
        Ok(YearlyApplication {
            id: Uuid::new_v4(),
            phase_id: self.phase_id,
            block_id,
            period: PeriodKey::from_date(self.period_start),
            fertilizer_name: self.fertilizer_name.trim().to_string(),
            amount_per_palm: self.amount_per_palm,
            created_at: now,
        })
    }
}

/// Form input for a daily application. `bag_size_kg` must be one of [`BagSize::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDailyApplication {
    pub phase_id: PhaseId,
    pub block_id: Option<BlockId>,
    pub date: NaiveDate,
    pub worker_name: String,
    pub bag_size_kg: u32,
    pub quantity: u32,
}

impl NewDailyApplication {
    pub fn validate(&self) -> Result<BagSize> {
        if self.block_id.is_none() {
            return Err(FarmError::validation("a block must be selected"));
        }
        if self.worker_name.trim().is_empty() {
            return Err(FarmError::validation("worker name must not be empty"));
        }
        if self.quantity < 1 {
            return Err(FarmError::validation("quantity must be at least 1"));
        }
        BagSize::try_from(self.bag_size_kg)
    }

    pub fn into_record(self, now: DateTime<Utc>) -> Result<DailyApplication> {
        let bag_size = self.validate()?;
        let block_id = self
            .block_id
            .ok_or_else(|| FarmError::validation("a block must be selected"))?;
        Ok(DailyApplication {
            id: Uuid::new_v4(),
            phase_id: self.phase_id,
            block_id,
            date: self.date,
            worker_name: self.worker_name.trim().to_string(),
            bag_size,
            quantity: self.quantity,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yearly_input() -> NewYearlyApplication {
        NewYearlyApplication {
            phase_id: 1,
            block_id: Some(3),
            period_start: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            fertilizer_name: "  Urea ".into(),
            amount_per_palm: 0.75,
        }
    }

    fn daily_input() -> NewDailyApplication {
        NewDailyApplication {
            phase_id: 1,
            block_id: Some(3),
            date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            worker_name: "Ali".into(),
            bag_size_kg: 50,
            quantity: 2,
        }
    }

    #[test]
    fn yearly_record_is_keyed_by_first_of_month() {
        let record = yearly_input().into_record(Utc::now()).unwrap();
        assert_eq!(record.period.to_string(), "2024-05-01");
        assert_eq!(record.fertilizer_name, "Urea");
        assert_eq!(record.block_id, 3);
    }

    #[test]
    fn yearly_validation_rejects_bad_input() {
        let mut missing_block = yearly_input();
        missing_block.block_id = None;
        assert!(matches!(missing_block.validate(), Err(FarmError::Validation(_))));

        let mut blank_name = yearly_input();
        blank_name.fertilizer_name = "   ".into();
        assert!(matches!(blank_name.validate(), Err(FarmError::Validation(_))));

        for amount in [0.0, -1.5, f64::NAN] {
            let mut bad_amount = yearly_input();
            bad_amount.amount_per_palm = amount;
            assert!(
                matches!(bad_amount.validate(), Err(FarmError::Validation(_))),
                "amount {amount} should be rejected"
            );
        }
    }

    #[test]
    fn daily_validation_rejects_bad_input() {
        let mut zero_quantity = daily_input();
        zero_quantity.quantity = 0;
        assert!(matches!(zero_quantity.validate(), Err(FarmError::Validation(_))));

        let mut odd_bag = daily_input();
        odd_bag.bag_size_kg = 25;
        let err = odd_bag.validate().expect_err("25 kg bags are unsupported");
        assert!(err.to_string().contains("25"));

        let mut no_worker = daily_input();
        no_worker.worker_name = String::new();
        assert!(no_worker.validate().is_err());
    }

    #[test]
    fn daily_total_is_bag_size_times_quantity() {
        let record = daily_input().into_record(Utc::now()).unwrap();
        assert_eq!(record.bag_size, BagSize::Kg50);
        assert_eq!(record.total_kg(), 100.0);
    }

    #[test]
    fn bag_size_serializes_as_kg() {
        assert_eq!(serde_json::to_string(&BagSize::Kg10).unwrap(), "10");
        assert!(serde_json::from_str::<BagSize>("25").is_err());
    }
}
