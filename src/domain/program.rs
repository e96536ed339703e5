use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{domain::common::PhaseId, window::PeriodKey};

/// Anchors a phase's program calendar. Windows always start on the first of this month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramStartDate {
    pub phase_id: PhaseId,
    pub start_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl ProgramStartDate {
    pub fn new(phase_id: PhaseId, start_date: NaiveDate) -> Self {
        Self {
            phase_id,
            start_date,
            updated_at: Utc::now(),
        }
    }

    pub fn first_period(&self) -> PeriodKey {
        PeriodKey::from_date(self.start_date)
    }
}
