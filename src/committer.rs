//! Goal commitment
//!
//! Turns the patient's choice among the goals offered by the latest target
//! status into the goal record for the new period, clamped to the ceiling.

use crate::error::ComputeError;
use crate::store::DataAccess;
use crate::types::{Goal, PatientChoice, TargetStatus};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

/// Goal chosen for the new period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalCommit {
    pub goal: Goal,
    pub choice: PatientChoice,
    /// The chosen goal reached the ceiling and was clamped to it
    pub limit_exceeded: bool,
    pub max_goal: Option<u32>,
}

/// Resolves patient choices against target statuses and goal ceilings
pub struct GoalCommitter<'a, S: DataAccess + ?Sized> {
    store: &'a S,
}

impl<'a, S: DataAccess + ?Sized> GoalCommitter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Build the goal record for `calc_date` from the target status written
    /// yesterday or today.
    pub fn commit(
        &self,
        admission: &str,
        choice: PatientChoice,
        calc_date: NaiveDate,
    ) -> Result<GoalCommit, ComputeError> {
        if self.store.admission(admission)?.is_none() {
            return Err(ComputeError::AdmissionNotFound(admission.to_string()));
        }

        let yesterday = calc_date - Days::new(1);
        let status = self
            .store
            .prior_target_status(admission, calc_date)?
            .filter(|s| s.date >= yesterday)
            .ok_or_else(|| ComputeError::MissingPriorStatus {
                admission: admission.to_string(),
                from: yesterday,
                to: calc_date,
            })?;

        let theoretical_goal = offered_goal(&status, choice);
        let max_goal = self
            .store
            .max_goal(admission, calc_date)?
            .and_then(|m| m.limit());

        let (effective_goal, limit_exceeded) = match max_goal {
            Some(ceiling) if theoretical_goal >= ceiling => (ceiling, true),
            _ => (theoretical_goal, false),
        };

        if limit_exceeded {
            warn!(
                admission,
                theoretical_goal,
                ceiling = effective_goal,
                "goal reached the maximum allowed and was limited"
            );
        }
        info!(
            admission,
            choice = choice.code(),
            effective_goal,
            theoretical_goal,
            "goal committed"
        );

        Ok(GoalCommit {
            goal: Goal {
                date: calc_date,
                effective_goal,
                theoretical_goal,
            },
            choice,
            limit_exceeded,
            max_goal,
        })
    }
}

/// Goal offered for a choice. Missing (or zero) increases fall back to the
/// next lower tier.
pub fn offered_goal(status: &TargetStatus, choice: PatientChoice) -> u32 {
    let keep = status.goal_base;
    let five = status.goal_5m.filter(|&g| g > 0).unwrap_or(keep);
    let ten = status.goal_10m.filter(|&g| g > 0).unwrap_or(five);
    match choice {
        PatientChoice::Keep => keep,
        PatientChoice::Five => five,
        PatientChoice::Ten => ten,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordCodes;
    use crate::store::MemoryStore;
    use crate::types::{MaxGoal, TargetStatusCode};
    use pretty_assertions::assert_eq;

    const ADM: &str = "adm-7";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn status(date: NaiveDate, goal_5m: Option<u32>, goal_10m: Option<u32>) -> TargetStatus {
        TargetStatus {
            date,
            status: TargetStatusCode::Ok,
            week_steps: 40000,
            median6: 6000,
            avg4: 5700,
            reached: 5,
            valid_days: 7,
            goal_base: 5000,
            goal_5m,
            goal_10m,
            in_agreement: false,
        }
    }

    fn store_with(status: &TargetStatus) -> MemoryStore {
        let mut store = MemoryStore::new(RecordCodes::default());
        store.add_admission(ADM, None);
        store.write_target_status(ADM, status).unwrap();
        store
    }

    #[test]
    fn test_choices_map_to_tiers() {
        let store = store_with(&status(day(5), Some(5500), Some(6000)));
        let committer = GoalCommitter::new(&store);

        let keep = committer.commit(ADM, PatientChoice::Keep, day(5)).unwrap();
        let five = committer.commit(ADM, PatientChoice::Five, day(5)).unwrap();
        let ten = committer.commit(ADM, PatientChoice::Ten, day(5)).unwrap();

        assert_eq!(keep.goal.effective_goal, 5000);
        assert_eq!(five.goal.effective_goal, 5500);
        assert_eq!(ten.goal.effective_goal, 6000);
        assert!(!ten.limit_exceeded);
        assert_eq!(ten.goal.date, day(5));
    }

    #[test]
    fn test_missing_tiers_fall_back() {
        let s = status(day(5), None, None);
        assert_eq!(offered_goal(&s, PatientChoice::Ten), 5000);

        let s = status(day(5), Some(5500), Some(0));
        assert_eq!(offered_goal(&s, PatientChoice::Ten), 5500);

        let s = status(day(5), Some(0), None);
        assert_eq!(offered_goal(&s, PatientChoice::Five), 5000);
    }

    #[test]
    fn test_status_from_yesterday_is_used() {
        let store = store_with(&status(day(4), Some(5500), Some(6000)));
        let commit = GoalCommitter::new(&store)
            .commit(ADM, PatientChoice::Five, day(5))
            .unwrap();
        assert_eq!(commit.goal.theoretical_goal, 5500);
    }

    #[test]
    fn test_older_status_is_missing() {
        let store = store_with(&status(day(2), Some(5500), Some(6000)));
        let err = GoalCommitter::new(&store)
            .commit(ADM, PatientChoice::Five, day(5))
            .unwrap_err();
        assert!(matches!(
            err,
            ComputeError::MissingPriorStatus { from, to, .. } if from == day(4) && to == day(5)
        ));
    }

    #[test]
    fn test_ceiling_clamps_goal() {
        let mut store = store_with(&status(day(5), Some(5500), Some(6000)));
        store
            .write_max_goal(ADM, &MaxGoal { date: day(1), ceiling: 5800 })
            .unwrap();
        let committer = GoalCommitter::new(&store);

        let ten = committer.commit(ADM, PatientChoice::Ten, day(5)).unwrap();
        assert_eq!(ten.goal.effective_goal, 5800);
        assert_eq!(ten.goal.theoretical_goal, 6000);
        assert!(ten.limit_exceeded);

        let five = committer.commit(ADM, PatientChoice::Five, day(5)).unwrap();
        assert_eq!(five.goal.effective_goal, 5500);
        assert!(!five.limit_exceeded);
    }

    #[test]
    fn test_goal_equal_to_ceiling_is_flagged() {
        let mut store = store_with(&status(day(5), Some(5500), Some(6000)));
        store
            .write_max_goal(ADM, &MaxGoal { date: day(1), ceiling: 5500 })
            .unwrap();
        let commit = GoalCommitter::new(&store)
            .commit(ADM, PatientChoice::Five, day(5))
            .unwrap();
        assert_eq!(commit.goal.effective_goal, 5500);
        assert!(commit.limit_exceeded);
    }

    #[test]
    fn test_ceiling_for_any_goal_above_it() {
        for ceiling in [100, 2500, 4999, 5000] {
            let mut store = store_with(&status(day(5), None, None));
            store
                .write_max_goal(ADM, &MaxGoal { date: day(1), ceiling })
                .unwrap();
            let commit = GoalCommitter::new(&store)
                .commit(ADM, PatientChoice::Keep, day(5))
                .unwrap();
            assert_eq!(commit.goal.effective_goal, ceiling);
            assert!(commit.limit_exceeded);
        }
    }

    #[test]
    fn test_zero_ceiling_is_unlimited() {
        let mut store = store_with(&status(day(5), Some(5500), Some(6000)));
        store
            .write_max_goal(ADM, &MaxGoal { date: day(1), ceiling: 0 })
            .unwrap();
        let commit = GoalCommitter::new(&store)
            .commit(ADM, PatientChoice::Ten, day(5))
            .unwrap();
        assert_eq!(commit.goal.effective_goal, 6000);
        assert!(!commit.limit_exceeded);
        assert_eq!(commit.max_goal, None);
    }
}
