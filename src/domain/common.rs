use uuid::Uuid;

pub type PhaseId = u32;
pub type BlockId = u32;

/// Identifies records that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Records scoped to a phase and block.
pub trait BlockScoped {
    fn phase_id(&self) -> PhaseId;
    fn block_id(&self) -> BlockId;
}

/// Supplies a presentation-ready label for UI or logs.
pub trait Displayable {
    fn display_label(&self) -> String;
}

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use serde;
pub use uuid;
