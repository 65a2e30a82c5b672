//! Mapping between host task records and typed engine records
//!
//! Missing answers are read the way the host reports them: an absent number
//! is zero, an absent optional goal is `None`. A record that lacks its key
//! answer (for instance a status task without a status code) is skipped.

use crate::schema::record::{RecordCodes, TaskRecord};
use crate::types::{AgreementWindow, DailyStepRecord, Goal, MaxGoal, TargetStatus, TargetStatusCode};

/// Host encoding of booleans in forms
const HOST_YES: i64 = 1;
const HOST_NO: i64 = 2;

/// Adapter converting typed records to and from host task records
pub struct RecordAdapter<'a> {
    codes: &'a RecordCodes,
}

impl<'a> RecordAdapter<'a> {
    pub fn new(codes: &'a RecordCodes) -> Self {
        Self { codes }
    }

    pub fn steps_from_task(&self, task: &TaskRecord) -> Option<DailyStepRecord> {
        let steps = task.int_answer(&self.codes.items.steps)?;
        Some(DailyStepRecord::new(task.date, clamp_u32(steps)))
    }

    pub fn fill_steps(&self, task: &mut TaskRecord, record: &DailyStepRecord) {
        task.date = record.date;
        task.set_answer(&self.codes.items.steps, record.steps);
    }

    pub fn goal_from_task(&self, task: &TaskRecord) -> Option<Goal> {
        let effective_goal = clamp_u32(task.int_answer(&self.codes.items.goal)?);
        let theoretical_goal = task
            .int_answer(&self.codes.items.theor_goal)
            .map(clamp_u32)
            .unwrap_or(effective_goal);
        Some(Goal {
            date: task.date,
            effective_goal,
            theoretical_goal,
        })
    }

    pub fn goal_to_task(&self, goal: &Goal) -> TaskRecord {
        let mut task = TaskRecord::closed(&self.codes.tasks.goal, goal.date);
        task.set_answer(&self.codes.items.goal, goal.effective_goal);
        task.set_answer(&self.codes.items.theor_goal, goal.theoretical_goal);
        task
    }

    pub fn max_goal_from_task(&self, task: &TaskRecord) -> Option<MaxGoal> {
        let ceiling = clamp_u32(task.int_answer(&self.codes.items.max_goal)?);
        Some(MaxGoal {
            date: task.date,
            ceiling,
        })
    }

    pub fn max_goal_to_task(&self, max_goal: &MaxGoal) -> TaskRecord {
        let mut task = TaskRecord::closed(&self.codes.tasks.max_goal, max_goal.date);
        task.set_answer(&self.codes.items.max_goal, max_goal.ceiling);
        task
    }

    pub fn agreement_from_task(&self, task: &TaskRecord) -> Option<AgreementWindow> {
        Some(AgreementWindow {
            date: task.date,
            start_date: task.date_answer(&self.codes.items.agreement_start)?,
            end_date: task.date_answer(&self.codes.items.agreement_end)?,
        })
    }

    pub fn agreement_to_task(&self, window: &AgreementWindow) -> TaskRecord {
        let mut task = TaskRecord::closed(&self.codes.tasks.agreement, window.date);
        task.set_answer(
            &self.codes.items.agreement_start,
            window.start_date.format("%Y-%m-%d").to_string(),
        );
        task.set_answer(
            &self.codes.items.agreement_end,
            window.end_date.format("%Y-%m-%d").to_string(),
        );
        task
    }

    pub fn target_status_from_task(&self, task: &TaskRecord) -> Option<TargetStatus> {
        let items = &self.codes.items;
        let code = task.int_answer(&items.target_status)?;
        let status = u8::try_from(code).ok().and_then(TargetStatusCode::from_code)?;
        let number = |item: &str| task.int_answer(item).map(clamp_u32).unwrap_or(0);
        let offered = |item: &str| task.int_answer(item).map(clamp_u32);

        Some(TargetStatus {
            date: task.date,
            status,
            week_steps: task.int_answer(&items.target_week_steps).unwrap_or(0).max(0) as u64,
            median6: number(&items.target_median6),
            avg4: number(&items.target_avg4),
            reached: number(&items.target_num_days_accom),
            valid_days: number(&items.target_valid_days),
            goal_base: number(&items.target_goal_base),
            goal_5m: offered(&items.target_goal_5m),
            goal_10m: offered(&items.target_goal_10m),
            in_agreement: task.int_answer(&items.target_in_agreement) == Some(HOST_YES),
        })
    }

    pub fn target_status_to_task(&self, status: &TargetStatus) -> TaskRecord {
        let items = &self.codes.items;
        let mut task = TaskRecord::closed(&self.codes.tasks.target_status, status.date);
        task.set_answer(&items.target_status, status.status.code());
        task.set_answer(&items.target_num_days_accom, status.reached);
        task.set_answer(&items.target_valid_days, status.valid_days);
        task.set_answer(&items.target_median6, status.median6);
        task.set_answer(&items.target_avg4, status.avg4);
        task.set_answer(&items.target_week_steps, status.week_steps);
        task.set_answer(&items.target_goal_base, status.goal_base);
        task.set_answer(&items.target_goal_5m, status.goal_5m);
        task.set_answer(&items.target_goal_10m, status.goal_10m);
        task.set_answer(
            &items.target_in_agreement,
            if status.in_agreement { HOST_YES } else { HOST_NO },
        );
        task
    }
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}
