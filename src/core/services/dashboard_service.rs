//! Read-side views. Every call reloads from the store and recomputes from scratch.

use chrono::NaiveDate;

use crate::aggregate::{
    block_history, daily_month_totals, phase_fertilizer_usage, year_summary_window, BlockTotals,
    DailyMonthTotals, PeriodTotals, WindowSummary,
};
use crate::calendar::{build_month_grid, MonthGrid};
use crate::config::Config;
use crate::core::services::ProgramService;
use crate::core::time::Clock;
use crate::domain::{BlockId, PhaseId};
use crate::errors::{FarmError, Result};
use crate::projection::{build_program_table, ProgramTable};
use crate::storage::{RecordFilter, RecordStore};
use crate::window::{PeriodKey, YearWindow};

pub struct DashboardService;

impl DashboardService {
    pub fn program_table(
        store: &dyn RecordStore,
        config: &Config,
        phase_id: PhaseId,
    ) -> Result<ProgramTable> {
        let start = ProgramService::start_date(store, phase_id)?;
        let blocks = store.list_blocks(phase_id)?;
        let records = store.query_yearly(&RecordFilter::phase(phase_id))?;
        let table = build_program_table(
            start.start_date,
            config.program_year_count,
            &blocks,
            &records,
        );
        tracing::debug!(
            phase = phase_id,
            blocks = table.rows.len(),
            records = records.len(),
            "rebuilt program table"
        );
        Ok(table)
    }

    /// Summary for one block over program year `year_index` (1-based).
    pub fn year_summary(
        store: &dyn RecordStore,
        phase_id: PhaseId,
        block_id: BlockId,
        year_index: usize,
    ) -> Result<WindowSummary> {
        if year_index == 0 {
            return Err(FarmError::validation("program years are numbered from 1"));
        }
        let start = ProgramService::start_date(store, phase_id)?;
        let window = YearWindow::for_year(start.start_date, year_index);
        let records =
            store.query_yearly(&RecordFilter::phase(phase_id).with_block(Some(block_id)))?;
        Ok(year_summary_window(
            &records,
            block_id,
            window.start.date(),
            window.end.date(),
        ))
    }

    pub fn block_history(
        store: &dyn RecordStore,
        phase_id: PhaseId,
        block_id: BlockId,
    ) -> Result<Vec<PeriodTotals>> {
        let records =
            store.query_yearly(&RecordFilter::phase(phase_id).with_block(Some(block_id)))?;
        Ok(block_history(&records, block_id))
    }

    /// Product usage across every block of the phase for one program year.
    pub fn fertilizer_usage(
        store: &dyn RecordStore,
        phase_id: PhaseId,
        year_index: usize,
    ) -> Result<BlockTotals> {
        if year_index == 0 {
            return Err(FarmError::validation("program years are numbered from 1"));
        }
        let start = ProgramService::start_date(store, phase_id)?;
        let window = YearWindow::for_year(start.start_date, year_index);
        let records = store.query_yearly(&RecordFilter::phase(phase_id))?;
        Ok(phase_fertilizer_usage(
            &records,
            window.start.date(),
            window.end.date(),
        ))
    }

    /// Month grid for the daily view. `month_index0` may overflow into neighbouring years.
    pub fn month_calendar(
        store: &dyn RecordStore,
        clock: &dyn Clock,
        phase_id: PhaseId,
        block_id: Option<BlockId>,
        year: i32,
        month_index0: i32,
    ) -> Result<MonthGrid> {
        let records = store.query_daily(&RecordFilter::phase(phase_id).with_block(block_id))?;
        Ok(build_month_grid(
            year,
            month_index0,
            &records,
            block_id,
            clock.today(),
        ))
    }

    pub fn daily_month_totals(
        store: &dyn RecordStore,
        phase_id: PhaseId,
        block_id: Option<BlockId>,
        month: NaiveDate,
    ) -> Result<DailyMonthTotals> {
        let month = PeriodKey::from_date(month);
        let records = store.query_daily(
            &RecordFilter::phase(phase_id)
                .with_block(block_id)
                .with_period(month),
        )?;
        Ok(daily_month_totals(&records, block_id, month))
    }
}
