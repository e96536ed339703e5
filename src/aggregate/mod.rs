//! Fertilizer ledger aggregation over already-fetched record sets.
//!
//! Every function is a pure recompute from its inputs. Empty inputs produce
//! empty collections and zero totals.

pub mod daily;
pub mod yearly;

pub use daily::{
    daily_cell_entries, daily_entries_on, daily_month_totals, DailyEntry, DailyMonthTotals,
    WorkerTotals,
};
pub use yearly::{
    block_fertilizer_totals, block_grand_total, block_history, block_totals, cell_totals,
    phase_fertilizer_usage, year_summary_window, BlockTotals, CellEntry, FertilizerTotals,
    PeriodTotals, WindowSummary,
};
