//! Which template governs a recording, and how assignments are kept exclusive.

pub(crate) mod engine;
pub(crate) mod manager;

pub use engine::{ResolutionEngine, candidate_order};
pub use manager::{AssignmentManager, BulkTargets};
