//! Task/form record definitions and the codes that identify them

use crate::error::ComputeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Lifecycle state of a host task. Only closed tasks are read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Open,
    Closed,
}

/// A host task with its form answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub task_code: String,
    pub date: NaiveDate,
    pub state: TaskState,
    /// Answers keyed by item code
    #[serde(default)]
    pub answers: BTreeMap<String, serde_json::Value>,
}

impl TaskRecord {
    pub fn closed(task_code: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_code: task_code.into(),
            date,
            state: TaskState::Closed,
            answers: BTreeMap::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == TaskState::Closed
    }

    /// Integer answer; numeric strings are accepted as the host stores both
    pub fn int_answer(&self, item: &str) -> Option<i64> {
        match self.answers.get(item)? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64)),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
            _ => None,
        }
    }

    pub fn date_answer(&self, item: &str) -> Option<NaiveDate> {
        let value = self.answers.get(item)?.as_str()?;
        crate::calendar::parse_day(value).ok()
    }

    pub fn set_answer(&mut self, item: &str, value: impl Into<serde_json::Value>) {
        self.answers.insert(item.to_string(), value.into());
    }
}

/// Task codes for each record kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskCodes {
    pub steps: String,
    pub goal: String,
    pub max_goal: String,
    pub target_status: String,
    pub agreement: String,
}

impl Default for TaskCodes {
    fn default() -> Self {
        Self {
            steps: "STEPS".to_string(),
            goal: "GOAL".to_string(),
            max_goal: "MAXGOAL".to_string(),
            target_status: "TARGET_STATUS".to_string(),
            agreement: "AGREEMENT".to_string(),
        }
    }
}

/// Item (question) codes inside each form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemCodes {
    pub steps: String,
    pub goal: String,
    pub theor_goal: String,
    pub max_goal: String,
    pub agreement_start: String,
    pub agreement_end: String,
    pub target_status: String,
    pub target_num_days_accom: String,
    pub target_valid_days: String,
    pub target_median6: String,
    pub target_avg4: String,
    pub target_week_steps: String,
    pub target_goal_base: String,
    pub target_goal_5m: String,
    pub target_goal_10m: String,
    pub target_in_agreement: String,
}

impl Default for ItemCodes {
    fn default() -> Self {
        Self {
            steps: "STEPS".to_string(),
            goal: "GOAL".to_string(),
            theor_goal: "THEOR_GOAL".to_string(),
            max_goal: "MAXGOAL".to_string(),
            agreement_start: "AGREEMENT_START".to_string(),
            agreement_end: "AGREEMENT_END".to_string(),
            target_status: "TARGET_STATUS".to_string(),
            target_num_days_accom: "TARGET_NUM_DAYS_ACCOM".to_string(),
            target_valid_days: "TARGET_VALID_DAYS".to_string(),
            target_median6: "TARGET_MEDIAN6".to_string(),
            target_avg4: "TARGET_AVG4".to_string(),
            target_week_steps: "TARGET_WEEK_STEPS".to_string(),
            target_goal_base: "TARGET_GOAL_BASE".to_string(),
            target_goal_5m: "TARGET_GOAL_5M".to_string(),
            target_goal_10m: "TARGET_GOAL_10M".to_string(),
            target_in_agreement: "TARGET_IN_AGREEMENT".to_string(),
        }
    }
}

/// Codes identifying every task and item the engine reads or writes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordCodes {
    pub tasks: TaskCodes,
    pub items: ItemCodes,
}

impl RecordCodes {
    /// Reject empty codes; an empty code would silently match nothing
    pub fn validate(&self) -> Result<(), ComputeError> {
        let t = &self.tasks;
        let i = &self.items;
        let named = [
            ("tasks.steps", &t.steps),
            ("tasks.goal", &t.goal),
            ("tasks.max_goal", &t.max_goal),
            ("tasks.target_status", &t.target_status),
            ("tasks.agreement", &t.agreement),
            ("items.steps", &i.steps),
            ("items.goal", &i.goal),
            ("items.theor_goal", &i.theor_goal),
            ("items.max_goal", &i.max_goal),
            ("items.agreement_start", &i.agreement_start),
            ("items.agreement_end", &i.agreement_end),
            ("items.target_status", &i.target_status),
            ("items.target_num_days_accom", &i.target_num_days_accom),
            ("items.target_valid_days", &i.target_valid_days),
            ("items.target_median6", &i.target_median6),
            ("items.target_avg4", &i.target_avg4),
            ("items.target_week_steps", &i.target_week_steps),
            ("items.target_goal_base", &i.target_goal_base),
            ("items.target_goal_5m", &i.target_goal_5m),
            ("items.target_goal_10m", &i.target_goal_10m),
            ("items.target_in_agreement", &i.target_in_agreement),
        ];

        match named.iter().find(|(_, code)| code.trim().is_empty()) {
            Some((name, _)) => Err(ComputeError::Configuration(format!(
                "record code '{}' is empty",
                name
            ))),
            None => Ok(()),
        }
    }

    /// Task codes of every record kind, in definition order
    pub fn all_task_codes(&self) -> Vec<String> {
        vec![
            self.tasks.steps.clone(),
            self.tasks.goal.clone(),
            self.tasks.max_goal.clone(),
            self.tasks.target_status.clone(),
            self.tasks.agreement.clone(),
        ]
    }
}
