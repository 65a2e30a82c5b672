//! Data access boundary
//!
//! The engine reads and writes admissions only through [`DataAccess`]. The
//! host case-management system, or any other persistence, implements it;
//! [`MemoryStore`] is the bundled implementation used by the CLI and tests.

mod memory;

pub use memory::MemoryStore;

use crate::error::ComputeError;
use crate::types::{
    Admission, AgreementWindow, DailyStepRecord, Goal, MaxGoal, RecordId, TargetStatus,
};
use chrono::NaiveDate;

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted(RecordId),
    Updated(RecordId),
}

/// Trait implemented by the persistence collaborator.
///
/// "As of" lookups return the most recent closed record dated on or before the
/// given date. All failures propagate to the caller unmodified.
pub trait DataAccess {
    fn admission(&self, admission: &str) -> Result<Option<Admission>, ComputeError>;

    /// Step records dated within `[from, to]`, ordered by date
    fn daily_steps(
        &self,
        admission: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyStepRecord>, ComputeError>;

    fn current_goal(&self, admission: &str, as_of: NaiveDate)
        -> Result<Option<Goal>, ComputeError>;

    fn max_goal(&self, admission: &str, as_of: NaiveDate) -> Result<Option<MaxGoal>, ComputeError>;

    fn agreement_window(
        &self,
        admission: &str,
        as_of: NaiveDate,
    ) -> Result<Option<AgreementWindow>, ComputeError>;

    fn prior_target_status(
        &self,
        admission: &str,
        as_of: NaiveDate,
    ) -> Result<Option<TargetStatus>, ComputeError>;

    fn write_target_status(
        &mut self,
        admission: &str,
        status: &TargetStatus,
    ) -> Result<RecordId, ComputeError>;

    fn write_goal(&mut self, admission: &str, goal: &Goal) -> Result<RecordId, ComputeError>;

    /// Insert the step count for a day, or update the existing record for it
    fn upsert_daily_steps(
        &mut self,
        admission: &str,
        record: &DailyStepRecord,
    ) -> Result<Upserted, ComputeError>;

    fn write_max_goal(&mut self, admission: &str, max_goal: &MaxGoal)
        -> Result<RecordId, ComputeError>;

    fn write_agreement_window(
        &mut self,
        admission: &str,
        window: &AgreementWindow,
    ) -> Result<RecordId, ComputeError>;
}
