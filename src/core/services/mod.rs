pub mod application_service;
pub mod dashboard_service;
pub mod program_service;

pub use application_service::ApplicationService;
pub use dashboard_service::DashboardService;
pub use program_service::{BlockService, ProgramService};
