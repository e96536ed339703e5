pub mod application;
pub mod block;
pub mod common;
pub mod program;
pub mod rows;

pub use application::{
    ApplicationRecord, BagSize, DailyApplication, NewDailyApplication, NewYearlyApplication,
    RecordKind, YearlyApplication,
};
pub use block::{sort_blocks, sorted_blocks, Block, BlockLabel};
pub use common::{BlockId, BlockScoped, Displayable, Identifiable, PhaseId};
pub use program::ProgramStartDate;
pub use rows::{DailyRow, YearlyRow};
