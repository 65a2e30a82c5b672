//! Stride Goals - Weekly step-goal engine for walking programs
//!
//! Once a week, for every admission, the engine evaluates the patient's daily
//! step counts of the previous Monday..Sunday week against the goal in effect
//! and classifies the week; the patient then picks one of the goals offered
//! and the committer records it for the new period:
//! step records → statistics → decision ladder → target status → goal commit.
//!
//! ## Modules
//!
//! - **Engine**: [`GoalDecisionEngine`] parameterized by a [`GoalPolicy`] (STEP or NORTHUMBRIA)
//! - **Committer**: [`GoalCommitter`] turning a patient choice into the new goal
//! - **Store**: the [`DataAccess`] boundary and the JSON-backed [`MemoryStore`]

pub mod agreement;
pub mod calendar;
pub mod committer;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod schema;
pub mod stats;
pub mod store;
pub mod types;

pub use committer::{GoalCommit, GoalCommitter};
pub use config::ProgramConfig;
pub use engine::{GoalDecisionEngine, WeeklyAssessment};
pub use error::ComputeError;
pub use pipeline::{GoalOutcome, GoalProcessor, IngestReport, TargetStatusOutcome};
pub use policy::{Algorithm, GoalPolicy};
pub use stats::StepStatistics;
pub use store::{DataAccess, MemoryStore};

/// Crate version reported by the CLI
pub const STRIDE_VERSION: &str = env!("CARGO_PKG_VERSION");
