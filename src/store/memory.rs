//! In-memory task store with JSON persistence
//!
//! Mirrors the host layout: admissions own an append-only list of tasks, each
//! carrying form answers keyed by item code. Writes are rejected for task codes
//! that have no form definition, the same way the host refuses to insert a
//! task it has no template for.

use super::{DataAccess, Upserted};
use crate::error::ComputeError;
use crate::schema::{RecordAdapter, RecordCodes, TaskRecord};
use crate::types::{
    Admission, AgreementWindow, DailyStepRecord, Goal, MaxGoal, RecordId, TargetStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AdmissionTasks {
    enrol_date: Option<NaiveDate>,
    #[serde(default)]
    tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    /// Task codes that have a form definition
    #[serde(default)]
    definitions: BTreeSet<String>,
    #[serde(default)]
    admissions: BTreeMap<String, AdmissionTasks>,
}

/// Task store kept in memory and persisted as a JSON document
#[derive(Debug, Clone)]
pub struct MemoryStore {
    codes: RecordCodes,
    document: StoreDocument,
}

impl MemoryStore {
    /// Create an empty store with a form definition for every configured task code
    pub fn new(codes: RecordCodes) -> Self {
        let definitions = codes.all_task_codes().into_iter().collect();
        Self::with_definitions(codes, definitions)
    }

    /// Create an empty store that only knows the given task codes
    pub fn with_definitions(codes: RecordCodes, definitions: BTreeSet<String>) -> Self {
        Self {
            codes,
            document: StoreDocument {
                definitions,
                admissions: BTreeMap::new(),
            },
        }
    }

    /// Register an admission. Returns `false` if it already existed, in which
    /// case its enrolment date is updated.
    pub fn add_admission(&mut self, admission: &str, enrol_date: Option<NaiveDate>) -> bool {
        match self.document.admissions.get_mut(admission) {
            Some(existing) => {
                existing.enrol_date = enrol_date;
                false
            }
            None => {
                self.document.admissions.insert(
                    admission.to_string(),
                    AdmissionTasks {
                        enrol_date,
                        tasks: Vec::new(),
                    },
                );
                true
            }
        }
    }

    pub fn admission_ids(&self) -> Vec<String> {
        self.document.admissions.keys().cloned().collect()
    }

    pub fn codes(&self) -> &RecordCodes {
        &self.codes
    }

    /// All tasks of an admission, including open ones
    pub fn tasks(&self, admission: &str) -> Result<&[TaskRecord], ComputeError> {
        Ok(&self.admission_tasks(admission)?.tasks)
    }

    /// Append a raw task, e.g. one created by another host workflow
    pub fn insert_task(&mut self, admission: &str, task: TaskRecord) -> Result<RecordId, ComputeError> {
        self.ensure_definition(&task.task_code)?;
        let id = task.id;
        debug!(admission, task_code = %task.task_code, date = %task.date, "inserting task");
        self.admission_tasks_mut(admission)?.tasks.push(task);
        Ok(id)
    }

    /// Load a store from JSON
    pub fn from_json(json: &str, codes: RecordCodes) -> Result<Self, ComputeError> {
        let document: StoreDocument = serde_json::from_str(json)?;
        Ok(Self { codes, document })
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    fn admission_tasks(&self, admission: &str) -> Result<&AdmissionTasks, ComputeError> {
        self.document
            .admissions
            .get(admission)
            .ok_or_else(|| ComputeError::AdmissionNotFound(admission.to_string()))
    }

    fn admission_tasks_mut(&mut self, admission: &str) -> Result<&mut AdmissionTasks, ComputeError> {
        self.document
            .admissions
            .get_mut(admission)
            .ok_or_else(|| ComputeError::AdmissionNotFound(admission.to_string()))
    }

    fn ensure_definition(&self, task_code: &str) -> Result<(), ComputeError> {
        if self.document.definitions.contains(task_code) {
            Ok(())
        } else {
            Err(ComputeError::Configuration(format!(
                "no form definition found for task code '{}'",
                task_code
            )))
        }
    }

    /// Most recent closed task with `task_code` dated on or before `as_of`.
    /// Ties on date go to the task inserted last.
    fn latest_task(
        &self,
        admission: &str,
        task_code: &str,
        as_of: NaiveDate,
    ) -> Result<Option<&TaskRecord>, ComputeError> {
        Ok(self
            .admission_tasks(admission)?
            .tasks
            .iter()
            .filter(|t| t.is_closed() && t.task_code == task_code && t.date <= as_of)
            .max_by_key(|t| t.date))
    }
}

impl DataAccess for MemoryStore {
    fn admission(&self, admission: &str) -> Result<Option<Admission>, ComputeError> {
        Ok(self.document.admissions.get(admission).map(|a| Admission {
            id: admission.to_string(),
            enrol_date: a.enrol_date,
        }))
    }

    fn daily_steps(
        &self,
        admission: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyStepRecord>, ComputeError> {
        let adapter = RecordAdapter::new(&self.codes);
        let mut records: Vec<DailyStepRecord> = self
            .admission_tasks(admission)?
            .tasks
            .iter()
            .filter(|t| t.is_closed() && t.task_code == self.codes.tasks.steps)
            .filter(|t| from <= t.date && t.date <= to)
            .filter_map(|t| adapter.steps_from_task(t))
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    fn current_goal(&self, admission: &str, as_of: NaiveDate) -> Result<Option<Goal>, ComputeError> {
        let adapter = RecordAdapter::new(&self.codes);
        Ok(self
            .latest_task(admission, &self.codes.tasks.goal, as_of)?
            .and_then(|t| adapter.goal_from_task(t)))
    }

    fn max_goal(&self, admission: &str, as_of: NaiveDate) -> Result<Option<MaxGoal>, ComputeError> {
        let adapter = RecordAdapter::new(&self.codes);
        Ok(self
            .latest_task(admission, &self.codes.tasks.max_goal, as_of)?
            .and_then(|t| adapter.max_goal_from_task(t)))
    }

    fn agreement_window(
        &self,
        admission: &str,
        as_of: NaiveDate,
    ) -> Result<Option<AgreementWindow>, ComputeError> {
        let adapter = RecordAdapter::new(&self.codes);
        Ok(self
            .latest_task(admission, &self.codes.tasks.agreement, as_of)?
            .and_then(|t| adapter.agreement_from_task(t)))
    }

    fn prior_target_status(
        &self,
        admission: &str,
        as_of: NaiveDate,
    ) -> Result<Option<TargetStatus>, ComputeError> {
        let adapter = RecordAdapter::new(&self.codes);
        Ok(self
            .latest_task(admission, &self.codes.tasks.target_status, as_of)?
            .and_then(|t| adapter.target_status_from_task(t)))
    }

    fn write_target_status(
        &mut self,
        admission: &str,
        status: &TargetStatus,
    ) -> Result<RecordId, ComputeError> {
        let task = RecordAdapter::new(&self.codes).target_status_to_task(status);
        self.insert_task(admission, task)
    }

    fn write_goal(&mut self, admission: &str, goal: &Goal) -> Result<RecordId, ComputeError> {
        let task = RecordAdapter::new(&self.codes).goal_to_task(goal);
        self.insert_task(admission, task)
    }

    fn upsert_daily_steps(
        &mut self,
        admission: &str,
        record: &DailyStepRecord,
    ) -> Result<Upserted, ComputeError> {
        let steps_code = self.codes.tasks.steps.clone();
        self.ensure_definition(&steps_code)?;

        let codes = self.codes.clone();
        let adapter = RecordAdapter::new(&codes);
        let tasks = &mut self.admission_tasks_mut(admission)?.tasks;

        if let Some(existing) = tasks
            .iter_mut()
            .find(|t| t.is_closed() && t.task_code == steps_code && t.date == record.date)
        {
            adapter.fill_steps(existing, record);
            return Ok(Upserted::Updated(existing.id));
        }

        let mut task = TaskRecord::closed(steps_code, record.date);
        adapter.fill_steps(&mut task, record);
        let id = task.id;
        tasks.push(task);
        Ok(Upserted::Inserted(id))
    }

    fn write_max_goal(&mut self, admission: &str, max_goal: &MaxGoal) -> Result<RecordId, ComputeError> {
        let task = RecordAdapter::new(&self.codes).max_goal_to_task(max_goal);
        self.insert_task(admission, task)
    }

    fn write_agreement_window(
        &mut self,
        admission: &str,
        window: &AgreementWindow,
    ) -> Result<RecordId, ComputeError> {
        let task = RecordAdapter::new(&self.codes).agreement_to_task(window);
        self.insert_task(admission, task)
    }
}
