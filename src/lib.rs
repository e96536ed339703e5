#![doc(test(attr(deny(warnings))))]

//! Farm Ledger turns raw fertilizer application rows into the per-block, per-month
//! and per-program-year views a plantation dashboard renders: the year-to-year
//! program table, daily calendar grids, and fertilizer totals.

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod format;
pub mod notify;
pub mod projection;
pub mod storage;
pub mod utils;
pub mod window;

use std::sync::Once;

pub use errors::{FarmError, Result};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Farm Ledger tracing initialized.");
    });
}
