//! Pipeline orchestration
//!
//! This module provides the public entry points invoked by the weekly
//! scheduler. [`GoalProcessor`] owns the data-access collaborator and the
//! program configuration, runs the engine or the committer, and writes
//! exactly one record per successful call.

use crate::committer::{GoalCommit, GoalCommitter};
use crate::config::ProgramConfig;
use crate::engine::{GoalDecisionEngine, WeeklyAssessment};
use crate::error::ComputeError;
use crate::policy::Algorithm;
use crate::stats::StepStatistics;
use crate::store::{DataAccess, Upserted};
use crate::types::{DailyStepRecord, DaySteps, PatientChoice, RecordId};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

/// Written target status with the assessment that produced it
#[derive(Debug, Clone, Serialize)]
pub struct TargetStatusOutcome {
    pub record_id: RecordId,
    pub assessment: WeeklyAssessment,
}

/// Written goal with the commitment that produced it
#[derive(Debug, Clone, Serialize)]
pub struct GoalOutcome {
    pub record_id: RecordId,
    pub commit: GoalCommit,
}

/// Counts of what step ingestion did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_before_enrolment: usize,
    pub skipped_non_positive: usize,
}

/// Processor bound to one data-access collaborator and configuration
pub struct GoalProcessor<S: DataAccess> {
    store: S,
    config: ProgramConfig,
}

impl<S: DataAccess> GoalProcessor<S> {
    /// Create a processor; the configuration is validated up front
    pub fn new(store: S, config: ProgramConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Compute and write the target status for the week before `calc_date`.
    ///
    /// `algorithm` overrides the configured default.
    pub fn calculate_target_status(
        &mut self,
        admission: &str,
        calc_date: NaiveDate,
        algorithm: Option<Algorithm>,
    ) -> Result<TargetStatusOutcome, ComputeError> {
        let algorithm = algorithm.unwrap_or(self.config.algorithm);
        let policy = self.config.policy(algorithm);
        debug!(admission, algorithm = algorithm.as_str(), %calc_date, "calculating target status");

        let assessment = GoalDecisionEngine::new(&self.store, policy).evaluate(admission, calc_date)?;
        let record_id = self.store.write_target_status(admission, &assessment.status)?;

        info!(admission, %record_id, status = assessment.status.status.as_str(), "target status written");
        Ok(TargetStatusOutcome {
            record_id,
            assessment,
        })
    }

    /// Commit the patient's choice as the goal starting on `calc_date`
    pub fn insert_new_goal(
        &mut self,
        admission: &str,
        choice: PatientChoice,
        calc_date: NaiveDate,
    ) -> Result<GoalOutcome, ComputeError> {
        let commit = GoalCommitter::new(&self.store).commit(admission, choice, calc_date)?;
        let record_id = self.store.write_goal(admission, &commit.goal)?;

        info!(admission, %record_id, goal = commit.goal.effective_goal, "goal written");
        Ok(GoalOutcome { record_id, commit })
    }

    /// Upsert manually supplied daily step counts.
    ///
    /// Days before the admission's enrolment and non-positive counts are skipped.
    pub fn ingest_steps(
        &mut self,
        admission: &str,
        days: &[DaySteps],
    ) -> Result<IngestReport, ComputeError> {
        let mut report = IngestReport::default();
        if days.is_empty() {
            return Ok(report);
        }

        let enrol_date = self
            .store
            .admission(admission)?
            .ok_or_else(|| ComputeError::AdmissionNotFound(admission.to_string()))?
            .enrol_date;

        for day in days {
            if enrol_date.is_some_and(|enrolled| day.date < enrolled) {
                report.skipped_before_enrolment += 1;
                continue;
            }
            if day.value <= 0 {
                report.skipped_non_positive += 1;
                continue;
            }

            let steps = u32::try_from(day.value).unwrap_or(u32::MAX);
            debug!(admission, date = %day.date, steps, "storing steps");
            match self
                .store
                .upsert_daily_steps(admission, &DailyStepRecord::new(day.date, steps))?
            {
                Upserted::Inserted(_) => report.inserted += 1,
                Upserted::Updated(_) => report.updated += 1,
            }
        }

        info!(
            admission,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped_before_enrolment + report.skipped_non_positive,
            "custom steps ingested"
        );
        Ok(report)
    }

    /// Statistics for an arbitrary window using the configured valid-day rule
    pub fn step_statistics(
        &self,
        admission: &str,
        from: NaiveDate,
        to: NaiveDate,
        goal: Option<u32>,
    ) -> Result<StepStatistics, ComputeError> {
        if self.store.admission(admission)?.is_none() {
            return Err(ComputeError::AdmissionNotFound(admission.to_string()));
        }
        let records = self.store.daily_steps(admission, from, to)?;
        let threshold = self.config.policy(self.config.algorithm).valid_day;
        Ok(StepStatistics::compute(&records, goal, threshold))
    }
}
