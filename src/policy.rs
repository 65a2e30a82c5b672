//! Goal policies
//!
//! A policy holds everything that differs between walking programs: how a
//! valid day is recognised, how goal hits are counted, the step increments
//! and how many increase tiers are offered. The weekly decision ladder lives
//! here too, so the engine only has to load data and apply rounding.
//!
//! Two named policies exist:
//! - **STEP**: six statuses, hysteresis on KO_CLOSE, two increase tiers
//! - **NORTHUMBRIA**: strict validity and goal-hit rules, one increase tier

use crate::error::ComputeError;
use crate::stats::{median, round_half_away, top_n_mean, DayThreshold, StepStatistics};
use crate::types::{DailyStepRecord, TargetStatusCode};
use serde::{Deserialize, Serialize};

/// Goal calculation algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    #[default]
    Step,
    Northumbria,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Step => "STEP",
            Algorithm::Northumbria => "NORTHUMBRIA",
        }
    }
}

/// Number of increased goals offered when the goal is achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncreaseTiers {
    /// 5 minute increase only
    One,
    /// 5 and 10 minute increases
    Two,
}

/// How days on which the goal was reached are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachedRule {
    /// `steps > goal` instead of `steps >= goal`
    pub strict: bool,
    /// Count only valid days instead of every recorded day
    pub valid_days_only: bool,
}

impl ReachedRule {
    fn count(&self, steps: &[u32], threshold: DayThreshold, goal: u32) -> u32 {
        if goal == 0 {
            return 0;
        }
        steps
            .iter()
            .filter(|&&s| !self.valid_days_only || threshold.accepts(s))
            .filter(|&&s| if self.strict { s > goal } else { s >= goal })
            .count() as u32
    }
}

/// Program-specific thresholds for the weekly goal decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPolicy {
    pub algorithm: Algorithm,
    pub valid_day: DayThreshold,
    pub reached: ReachedRule,
    /// Fewer valid days than this makes the week not compliant
    pub min_valid_days: u32,
    /// Fewer goal hits than this is a far miss (STEP only)
    pub far_reached_days: u32,
    /// Goal hits needed to count the goal as achieved
    pub achieved_days: u32,
    /// Steps added per increase tier (5 minutes of walking)
    pub increase_steps: u32,
    /// Steps removed after a miss (STEP only)
    pub decrease_steps: u32,
    /// Added to the weekly median when the first goal is set
    pub first_goal_bonus: u32,
    pub tiers: IncreaseTiers,
}

impl Default for GoalPolicy {
    fn default() -> Self {
        Self::step()
    }
}

/// Figures of an evaluated week as seen by a policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekFigures {
    pub week_steps: u64,
    pub valid_days: u32,
    pub reached: u32,
    /// Median the new goal is anchored to
    pub median: u32,
    pub avg4: u32,
}

/// Unrounded outcome of the decision ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub status: TargetStatusCode,
    pub theoretical_goal: u32,
    pub goal_5m: Option<u32>,
    pub goal_10m: Option<u32>,
}

impl Decision {
    fn keep(status: TargetStatusCode, goal: u32) -> Self {
        Self {
            status,
            theoretical_goal: goal,
            goal_5m: None,
            goal_10m: None,
        }
    }
}

impl GoalPolicy {
    /// STEP / PACPAP programs
    pub fn step() -> Self {
        Self {
            algorithm: Algorithm::Step,
            valid_day: DayThreshold::default(),
            reached: ReachedRule {
                strict: false,
                valid_days_only: false,
            },
            min_valid_days: 4,
            far_reached_days: 2,
            achieved_days: 4,
            increase_steps: 500,
            decrease_steps: 200,
            first_goal_bonus: 0,
            tiers: IncreaseTiers::Two,
        }
    }

    /// NORTHUMBRIA program
    pub fn northumbria() -> Self {
        Self {
            algorithm: Algorithm::Northumbria,
            valid_day: DayThreshold::strict(70),
            reached: ReachedRule {
                strict: true,
                valid_days_only: true,
            },
            min_valid_days: 4,
            far_reached_days: 0,
            achieved_days: 4,
            increase_steps: 500,
            decrease_steps: 0,
            first_goal_bonus: 500,
            tiers: IncreaseTiers::One,
        }
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.min_valid_days > 7 {
            return Err(ComputeError::Configuration(format!(
                "{}: min_valid_days {} exceeds a week",
                self.algorithm.as_str(),
                self.min_valid_days
            )));
        }
        if self.achieved_days > 7 || self.far_reached_days > self.achieved_days {
            return Err(ComputeError::Configuration(format!(
                "{}: reached thresholds far={} achieved={} are inconsistent",
                self.algorithm.as_str(),
                self.far_reached_days,
                self.achieved_days
            )));
        }
        if self.increase_steps == 0 {
            return Err(ComputeError::Configuration(format!(
                "{}: increase_steps must be positive",
                self.algorithm.as_str()
            )));
        }
        Ok(())
    }

    /// Aggregate a week of records into the statistics and the policy's figures
    pub fn figures(
        &self,
        records: &[DailyStepRecord],
        current_goal: u32,
    ) -> (StepStatistics, WeekFigures) {
        let stats = StepStatistics::compute(records, Some(current_goal), self.valid_day);
        let steps: Vec<u32> = records.iter().map(|r| r.steps).collect();
        let reached = self.reached.count(&steps, self.valid_day, current_goal);

        let figures = match self.algorithm {
            Algorithm::Step => WeekFigures {
                week_steps: stats.sum,
                valid_days: stats.valid_days,
                reached,
                median: stats.median6,
                avg4: stats.average,
            },
            Algorithm::Northumbria => {
                let valid: Vec<u32> = steps
                    .iter()
                    .copied()
                    .filter(|&s| self.valid_day.accepts(s))
                    .collect();
                let as_f64: Vec<f64> = valid.iter().map(|&v| v as f64).collect();
                WeekFigures {
                    week_steps: stats.sum,
                    valid_days: stats.valid_days,
                    reached,
                    median: round_half_away(median(&as_f64)),
                    avg4: round_half_away(top_n_mean(&valid, 4)),
                }
            }
        };
        (stats, figures)
    }

    /// Run the decision ladder. `previous_status` is only called when the
    /// previous week's verdict matters (STEP near miss).
    pub fn decide<F>(
        &self,
        figures: &WeekFigures,
        current_goal: u32,
        previous_status: F,
    ) -> Result<Decision, ComputeError>
    where
        F: FnOnce() -> Result<Option<TargetStatusCode>, ComputeError>,
    {
        if figures.valid_days < self.min_valid_days {
            return Ok(Decision::keep(TargetStatusCode::NotCompliant, current_goal));
        }
        if current_goal == 0 {
            return Ok(Decision::keep(
                TargetStatusCode::FirstGoal,
                figures.median.saturating_add(self.first_goal_bonus),
            ));
        }

        match self.algorithm {
            Algorithm::Step => self.decide_step(figures, current_goal, previous_status),
            Algorithm::Northumbria => Ok(self.decide_northumbria(figures, current_goal)),
        }
    }

    fn decide_step<F>(
        &self,
        figures: &WeekFigures,
        current_goal: u32,
        previous_status: F,
    ) -> Result<Decision, ComputeError>
    where
        F: FnOnce() -> Result<Option<TargetStatusCode>, ComputeError>,
    {
        if figures.reached < self.far_reached_days {
            return Ok(Decision::keep(
                TargetStatusCode::KoFar,
                self.lowered_goal(figures, current_goal),
            ));
        }

        if figures.reached < self.achieved_days && figures.median < current_goal {
            return Ok(match previous_status()? {
                Some(TargetStatusCode::KoClose) => Decision::keep(
                    TargetStatusCode::KoRepeated,
                    self.lowered_goal(figures, current_goal),
                ),
                _ => Decision::keep(TargetStatusCode::KoClose, current_goal),
            });
        }

        // Capped at one tier above the current goal whatever the median
        let goal_5m = figures
            .median
            .saturating_add(self.increase_steps)
            .min(current_goal.saturating_add(self.increase_steps));
        Ok(self.achieved(current_goal, goal_5m))
    }

    fn decide_northumbria(&self, figures: &WeekFigures, current_goal: u32) -> Decision {
        if figures.reached < self.achieved_days {
            return Decision::keep(
                TargetStatusCode::KoFar,
                current_goal.min(figures.median.saturating_add(self.increase_steps)),
            );
        }
        self.achieved(current_goal, current_goal.saturating_add(self.increase_steps))
    }

    fn achieved(&self, current_goal: u32, goal_5m: u32) -> Decision {
        let goal_10m = match self.tiers {
            IncreaseTiers::Two => {
                Some(current_goal.saturating_add(self.increase_steps.saturating_mul(2)))
            }
            IncreaseTiers::One => None,
        };
        Decision {
            status: TargetStatusCode::Ok,
            theoretical_goal: current_goal,
            goal_5m: Some(goal_5m),
            goal_10m,
        }
    }

    fn lowered_goal(&self, figures: &WeekFigures, current_goal: u32) -> u32 {
        let reduced = if current_goal > self.decrease_steps {
            current_goal - self.decrease_steps
        } else {
            1
        };
        reduced.min(figures.median.saturating_add(self.increase_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn figures(valid_days: u32, reached: u32, median: u32) -> WeekFigures {
        WeekFigures {
            week_steps: 0,
            valid_days,
            reached,
            median,
            avg4: 0,
        }
    }

    fn no_previous() -> Result<Option<TargetStatusCode>, ComputeError> {
        Ok(None)
    }

    fn previous_not_needed() -> Result<Option<TargetStatusCode>, ComputeError> {
        panic!("previous status must not be looked up")
    }

    #[test]
    fn test_step_not_compliant_keeps_goal() {
        let decision = GoalPolicy::step()
            .decide(&figures(3, 3, 9000), 5000, previous_not_needed)
            .unwrap();
        assert_eq!(decision, Decision::keep(TargetStatusCode::NotCompliant, 5000));
    }

    #[test]
    fn test_step_first_goal_uses_median() {
        let decision = GoalPolicy::step()
            .decide(&figures(7, 0, 3500), 0, previous_not_needed)
            .unwrap();
        assert_eq!(decision, Decision::keep(TargetStatusCode::FirstGoal, 3500));
    }

    #[test]
    fn test_step_far_miss() {
        let decision = GoalPolicy::step()
            .decide(&figures(7, 1, 3900), 5000, previous_not_needed)
            .unwrap();
        assert_eq!(decision.status, TargetStatusCode::KoFar);
        assert_eq!(decision.theoretical_goal, 4400);

        // Median close to goal: capped by goal - 200
        let decision = GoalPolicy::step()
            .decide(&figures(7, 0, 4900), 5000, previous_not_needed)
            .unwrap();
        assert_eq!(decision.theoretical_goal, 4800);
    }

    #[test]
    fn test_step_far_miss_with_tiny_goal() {
        let decision = GoalPolicy::step()
            .decide(&figures(7, 0, 3000), 150, previous_not_needed)
            .unwrap();
        assert_eq!(decision.theoretical_goal, 1);
    }

    #[test]
    fn test_step_near_miss_first_time() {
        let decision = GoalPolicy::step()
            .decide(&figures(7, 3, 4800), 5000, no_previous)
            .unwrap();
        assert_eq!(decision, Decision::keep(TargetStatusCode::KoClose, 5000));
    }

    #[test]
    fn test_step_near_miss_repeated() {
        let decision = GoalPolicy::step()
            .decide(&figures(7, 3, 4800), 5000, || Ok(Some(TargetStatusCode::KoClose)))
            .unwrap();
        assert_eq!(decision.status, TargetStatusCode::KoRepeated);
        assert_eq!(decision.theoretical_goal, 4800);
    }

    #[test]
    fn test_step_near_miss_after_other_status() {
        let decision = GoalPolicy::step()
            .decide(&figures(7, 2, 4000), 5000, || Ok(Some(TargetStatusCode::KoRepeated)))
            .unwrap();
        assert_eq!(decision.status, TargetStatusCode::KoClose);
    }

    #[test]
    fn test_step_previous_status_error_propagates() {
        let result = GoalPolicy::step().decide(&figures(7, 3, 4800), 5000, || {
            Err(ComputeError::DataAccess("host unavailable".to_string()))
        });
        assert!(matches!(result, Err(ComputeError::DataAccess(_))));
    }

    #[test]
    fn test_step_achieved_low_increase() {
        // Four hits with a low top-6 median
        let decision = GoalPolicy::step()
            .decide(&figures(7, 4, 4600), 5000, previous_not_needed)
            .unwrap();
        assert_eq!(decision.status, TargetStatusCode::Ok);
        assert_eq!(decision.theoretical_goal, 5000);
        assert_eq!(decision.goal_5m, Some(5100));
        assert_eq!(decision.goal_10m, Some(6000));
    }

    #[test]
    fn test_goal_arithmetic_saturates() {
        let step = GoalPolicy::step();
        let first = step.decide(&figures(7, 0, u32::MAX), 0, previous_not_needed).unwrap();
        assert_eq!(first.theoretical_goal, u32::MAX);

        let achieved = step
            .decide(&figures(7, 7, u32::MAX), u32::MAX - 100, previous_not_needed)
            .unwrap();
        assert_eq!(achieved.goal_5m, Some(u32::MAX));
        assert_eq!(achieved.goal_10m, Some(u32::MAX));

        let far = step
            .decide(&figures(7, 0, u32::MAX), u32::MAX, previous_not_needed)
            .unwrap();
        assert_eq!(far.theoretical_goal, u32::MAX - 200);

        let northumbria = GoalPolicy::northumbria();
        let first = northumbria
            .decide(&figures(7, 0, u32::MAX), 0, previous_not_needed)
            .unwrap();
        assert_eq!(first.theoretical_goal, u32::MAX);
        let missed = northumbria
            .decide(&figures(7, 0, u32::MAX), 9000, previous_not_needed)
            .unwrap();
        assert_eq!(missed.theoretical_goal, 9000);
        let achieved = northumbria
            .decide(&figures(7, 7, u32::MAX), u32::MAX, previous_not_needed)
            .unwrap();
        assert_eq!(achieved.goal_5m, Some(u32::MAX));
    }

    #[test]
    fn test_step_achieved_high_increase() {
        let decision = GoalPolicy::step()
            .decide(&figures(7, 6, 7000), 5000, previous_not_needed)
            .unwrap();
        assert_eq!(decision.goal_5m, Some(5500));
        assert_eq!(decision.goal_10m, Some(6000));
    }

    #[test]
    fn test_step_near_miss_with_median_at_goal_is_achieved() {
        // Three hits but the median is not below goal
        let decision = GoalPolicy::step()
            .decide(&figures(7, 3, 5200), 5000, previous_not_needed)
            .unwrap();
        assert_eq!(decision.status, TargetStatusCode::Ok);
        assert_eq!(decision.goal_5m, Some(5500));
    }

    #[test]
    fn test_northumbria_ladder() {
        let policy = GoalPolicy::northumbria();

        let first = policy.decide(&figures(5, 0, 4000), 0, previous_not_needed).unwrap();
        assert_eq!(first, Decision::keep(TargetStatusCode::FirstGoal, 4500));

        let missed = policy.decide(&figures(5, 3, 4000), 5000, previous_not_needed).unwrap();
        assert_eq!(missed, Decision::keep(TargetStatusCode::KoFar, 4500));

        let achieved = policy.decide(&figures(6, 4, 6000), 5000, previous_not_needed).unwrap();
        assert_eq!(achieved.status, TargetStatusCode::Ok);
        assert_eq!(achieved.goal_5m, Some(5500));
        assert_eq!(achieved.goal_10m, None);
    }

    #[test]
    fn test_northumbria_figures_use_strict_rules() {
        let monday = chrono::NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let records: Vec<DailyStepRecord> = [70, 5000, 5001, 6000, 4000, 3000, 71]
            .iter()
            .enumerate()
            .map(|(i, &s)| DailyStepRecord::new(monday + chrono::Days::new(i as u64), s))
            .collect();

        let (stats, figures) = GoalPolicy::northumbria().figures(&records, 5000);
        // 70 is not valid under the strict rule
        assert_eq!(figures.valid_days, 6);
        assert_eq!(stats.valid_days, 6);
        // Only 5001 and 6000 are strictly above goal
        assert_eq!(figures.reached, 2);
        // Valid: 71 3000 4000 5000 5001 6000
        assert_eq!(figures.median, 4500);
        // Top 4 valid: 6000 5001 5000 4000
        assert_eq!(figures.avg4, 5000);
    }

    #[test]
    fn test_step_figures_match_statistics() {
        let monday = chrono::NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let records: Vec<DailyStepRecord> = [70, 5000, 5001, 6000, 4000, 3000, 60]
            .iter()
            .enumerate()
            .map(|(i, &s)| DailyStepRecord::new(monday + chrono::Days::new(i as u64), s))
            .collect();

        let (stats, figures) = GoalPolicy::step().figures(&records, 5000);
        assert_eq!(figures.valid_days, 6);
        assert_eq!(figures.reached, stats.reached);
        assert_eq!(figures.reached, 3);
        assert_eq!(figures.median, stats.median6);
        assert_eq!(figures.avg4, stats.average);
        assert_eq!(figures.week_steps, stats.sum);
    }

    #[test]
    fn test_policy_validation() {
        assert!(GoalPolicy::step().validate().is_ok());
        assert!(GoalPolicy::northumbria().validate().is_ok());

        let mut policy = GoalPolicy::step();
        policy.min_valid_days = 8;
        assert!(matches!(policy.validate(), Err(ComputeError::Configuration(_))));

        let mut policy = GoalPolicy::step();
        policy.far_reached_days = 5;
        assert!(policy.validate().is_err());
    }
}
