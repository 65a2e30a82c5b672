//! Weekly goal decision engine
//!
//! For one admission and calculation date the engine:
//! 1. Locates the Monday..Sunday week to evaluate
//! 2. Loads the goal in effect, the agreement window and the goal ceiling
//! 3. Aggregates the week's step records through the policy
//! 4. Runs the policy's decision ladder
//! 5. Rounds the goals and suppresses increases inside an agreement period
//!
//! The engine only reads. Writing the resulting [`TargetStatus`] is up to the
//! caller (see [`crate::pipeline::GoalProcessor`]).

use crate::agreement::is_in_agreement;
use crate::calendar::EvaluationWeek;
use crate::error::ComputeError;
use crate::policy::{GoalPolicy, WeekFigures};
use crate::stats::{round_to_hundred, StepStatistics};
use crate::store::DataAccess;
use crate::types::TargetStatus;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

/// Everything the engine derived for one admission and week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAssessment {
    pub admission: String,
    pub calc_date: NaiveDate,
    pub week: EvaluationWeek,
    pub current_goal: u32,
    /// Ceiling in effect; not looked up inside an agreement period
    pub max_goal: Option<u32>,
    pub statistics: StepStatistics,
    pub figures: WeekFigures,
    pub status: TargetStatus,
}

/// Engine evaluating weeks against a policy
pub struct GoalDecisionEngine<'a, S: DataAccess + ?Sized> {
    store: &'a S,
    policy: &'a GoalPolicy,
}

impl<'a, S: DataAccess + ?Sized> GoalDecisionEngine<'a, S> {
    pub fn new(store: &'a S, policy: &'a GoalPolicy) -> Self {
        Self { store, policy }
    }

    /// Evaluate the week preceding `calc_date` (or ending on it, for a Sunday)
    pub fn evaluate(&self, admission: &str, calc_date: NaiveDate) -> Result<WeeklyAssessment, ComputeError> {
        if self.store.admission(admission)?.is_none() {
            return Err(ComputeError::AdmissionNotFound(admission.to_string()));
        }

        let week = EvaluationWeek::for_calc_date(calc_date);
        let current_goal = self
            .store
            .current_goal(admission, week.sunday)?
            .map_or(0, |g| g.effective_goal);

        let in_agreement = is_in_agreement(self.store, admission, week.next_period_start())?;
        let max_goal = if in_agreement {
            None
        } else {
            self.store
                .max_goal(admission, calc_date)?
                .and_then(|m| m.limit())
        };

        let records = self.store.daily_steps(admission, week.monday, week.sunday)?;
        let (statistics, figures) = self.policy.figures(&records, current_goal);

        debug!(
            admission,
            algorithm = self.policy.algorithm.as_str(),
            %calc_date,
            monday = %week.monday,
            sunday = %week.sunday,
            current_goal,
            ?max_goal,
            in_agreement,
            valid_days = figures.valid_days,
            median = figures.median,
            reached = figures.reached,
            "evaluating week"
        );

        let decision = self.policy.decide(&figures, current_goal, || {
            Ok(self
                .store
                .prior_target_status(admission, week.sunday)?
                .map(|s| s.status))
        })?;

        let (goal_5m, goal_10m) = if in_agreement {
            (None, None)
        } else {
            (
                decision.goal_5m.map(round_to_hundred),
                decision.goal_10m.map(round_to_hundred),
            )
        };

        let status = TargetStatus {
            date: calc_date,
            status: decision.status,
            week_steps: figures.week_steps,
            median6: figures.median,
            avg4: figures.avg4,
            reached: figures.reached,
            valid_days: figures.valid_days,
            goal_base: round_to_hundred(decision.theoretical_goal),
            goal_5m,
            goal_10m,
            in_agreement,
        };

        info!(
            admission,
            status = status.status.as_str(),
            goal_base = status.goal_base,
            goal_5m = ?status.goal_5m,
            goal_10m = ?status.goal_10m,
            "weekly target status computed"
        );

        Ok(WeeklyAssessment {
            admission: admission.to_string(),
            calc_date,
            week,
            current_goal,
            max_goal,
            statistics,
            figures,
            status,
        })
    }
}
