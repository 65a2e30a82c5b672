//! Core types for the weekly goal engine
//!
//! This module defines the records that flow between the data-access boundary,
//! the decision engine and the goal committer: daily step counts, goals,
//! weekly target statuses, agreement windows and goal ceilings.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Opaque admission identifier
pub type AdmissionId = String;

/// Identifier returned by the data-access layer for every written record
pub type RecordId = Uuid;

/// Enrollment of one patient in a walking program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub id: AdmissionId,
    /// Step counts recorded before this date are ignored on ingestion
    pub enrol_date: Option<NaiveDate>,
}

/// Step count for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStepRecord {
    pub date: NaiveDate,
    pub steps: u32,
}

impl DailyStepRecord {
    pub fn new(date: NaiveDate, steps: u32) -> Self {
        Self { date, steps }
    }
}

/// Daily step target in effect from `date` onwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub date: NaiveDate,
    /// Goal after applying the ceiling
    pub effective_goal: u32,
    /// Goal before applying the ceiling
    pub theoretical_goal: u32,
}

/// Upper limit for goals, effective from `date` onwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxGoal {
    pub date: NaiveDate,
    pub ceiling: u32,
}

impl MaxGoal {
    /// A zero ceiling is stored by the host when no limit applies
    pub fn limit(&self) -> Option<u32> {
        (self.ceiling > 0).then_some(self.ceiling)
    }
}

/// Period during which the patient's goal must not be increased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementWindow {
    /// Date the window was recorded
    pub date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AgreementWindow {
    /// Inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Weekly compliance verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetStatusCode {
    /// Fewer valid days than required
    NotCompliant,
    /// Goal reached on 0 or 1 days
    KoFar,
    /// Goal reached on 2 or 3 days with the top-6 median below goal
    KoClose,
    /// Goal achieved
    Ok,
    /// First goal computed for the admission
    FirstGoal,
    /// KO_CLOSE for the second consecutive week
    KoRepeated,
}

impl TargetStatusCode {
    /// Numeric code used by the host case-management system
    pub fn code(&self) -> u8 {
        match self {
            TargetStatusCode::NotCompliant => 1,
            TargetStatusCode::KoFar => 2,
            TargetStatusCode::KoClose => 3,
            TargetStatusCode::Ok => 4,
            TargetStatusCode::FirstGoal => 5,
            TargetStatusCode::KoRepeated => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(TargetStatusCode::NotCompliant),
            2 => Some(TargetStatusCode::KoFar),
            3 => Some(TargetStatusCode::KoClose),
            4 => Some(TargetStatusCode::Ok),
            5 => Some(TargetStatusCode::FirstGoal),
            6 => Some(TargetStatusCode::KoRepeated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatusCode::NotCompliant => "NOT_COMPLIANT",
            TargetStatusCode::KoFar => "KO_FAR",
            TargetStatusCode::KoClose => "KO_CLOSE",
            TargetStatusCode::Ok => "OK",
            TargetStatusCode::FirstGoal => "FIRST_GOAL",
            TargetStatusCode::KoRepeated => "KO_REPEATED",
        }
    }
}

/// Weekly target status record: verdict plus the goals offered for next week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStatus {
    /// Date the status was calculated (first day of the new period, usually)
    pub date: NaiveDate,
    pub status: TargetStatusCode,
    /// Total steps over the valid days of the week
    pub week_steps: u64,
    pub median6: u32,
    pub avg4: u32,
    /// Days on which the current goal was reached
    pub reached: u32,
    pub valid_days: u32,
    /// Goal kept when the patient does not choose an increase
    pub goal_base: u32,
    /// Goal offered for a 5 minute increase
    pub goal_5m: Option<u32>,
    /// Goal offered for a 10 minute increase
    pub goal_10m: Option<u32>,
    pub in_agreement: bool,
}

/// Patient's choice among the goals offered by a target status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientChoice {
    #[default]
    Keep,
    Five,
    Ten,
}

impl PatientChoice {
    /// Map the host's numeric choice; anything unrecognised keeps the goal
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(2) => PatientChoice::Five,
            Some(3) => PatientChoice::Ten,
            _ => PatientChoice::Keep,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            PatientChoice::Keep => 1,
            PatientChoice::Five => 2,
            PatientChoice::Ten => 3,
        }
    }
}

/// Manually supplied step count for one day, as received from callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySteps {
    #[serde(alias = "dateTime")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "step_count")]
    pub value: i64,
}

/// Step count sent either as a JSON number or as a numeric string
fn step_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Integer(i64),
        Decimal(f64),
        Text(String),
    }

    match RawCount::deserialize(deserializer)? {
        RawCount::Integer(value) => Ok(value),
        RawCount::Decimal(value) => Ok(value.round() as i64),
        RawCount::Text(text) => text
            .trim()
            .parse::<f64>()
            .map(|value| value.round() as i64)
            .map_err(|e| serde::de::Error::custom(format!("invalid step count '{}': {}", text, e))),
    }
}
