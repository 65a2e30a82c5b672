//! Weekly step statistics
//!
//! This module aggregates a window of daily step records into the figures the
//! goal engine works with:
//! - Sums and counts over valid (worn) days
//! - Number of days the current goal was reached
//! - Order statistics over the most active days (top-N means, medians)

use crate::types::DailyStepRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum daily steps for a day to count as real activity
pub const DEFAULT_VALID_DAY_STEPS: u32 = 70;

/// Predicate deciding whether a day's step count is valid (device worn)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayThreshold {
    pub min_steps: u32,
    /// `true` for `steps >= min_steps`, `false` for `steps > min_steps`
    pub inclusive: bool,
}

impl Default for DayThreshold {
    fn default() -> Self {
        Self {
            min_steps: DEFAULT_VALID_DAY_STEPS,
            inclusive: true,
        }
    }
}

impl DayThreshold {
    pub fn strict(min_steps: u32) -> Self {
        Self {
            min_steps,
            inclusive: false,
        }
    }

    pub fn accepts(&self, steps: u32) -> bool {
        if self.inclusive {
            steps >= self.min_steps
        } else {
            steps > self.min_steps
        }
    }
}

/// Aggregated figures for a window of daily step records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepStatistics {
    /// Total steps over valid days
    pub sum: u64,
    /// Median of the 6 most active days (all days considered)
    pub median6: u32,
    /// Median of the 4 most active days (all days considered)
    pub median4: u32,
    /// Mean over valid days
    pub average: u32,
    /// Mean of the 4 most active days (all days considered)
    pub average4: u32,
    /// Mean of the 6 most active valid days
    pub average6: u32,
    pub valid_days: u32,
    /// Days (valid or not) with steps at or above the current goal
    pub reached: u32,
    /// Total steps over all days
    pub all_steps: u64,
    pub per_day: BTreeMap<NaiveDate, u32>,
}

impl StepStatistics {
    /// Compute statistics for the given records.
    ///
    /// `current_goal` of `None` or `Some(0)` leaves `reached` at 0.
    pub fn compute(
        records: &[DailyStepRecord],
        current_goal: Option<u32>,
        threshold: DayThreshold,
    ) -> Self {
        let values: Vec<u32> = records.iter().map(|r| r.steps).collect();
        let valid: Vec<u32> = values
            .iter()
            .copied()
            .filter(|&s| threshold.accepts(s))
            .collect();

        let reached = match current_goal {
            Some(goal) if goal > 0 => values.iter().filter(|&&s| s >= goal).count() as u32,
            _ => 0,
        };

        let descending = sorted_descending(&values);

        Self {
            sum: valid.iter().map(|&s| s as u64).sum(),
            median6: round_half_away(median_of_top(&descending, 6)),
            median4: round_half_away(median_of_top(&descending, 4)),
            average: round_half_away(mean(&valid)),
            average4: round_half_away(top_n_mean(&values, 4)),
            average6: round_half_away(top_n_mean(&valid, 6)),
            valid_days: valid.len() as u32,
            reached,
            all_steps: values.iter().map(|&s| s as u64).sum(),
            per_day: records.iter().map(|r| (r.date, r.steps)).collect(),
        }
    }
}

/// Standard median: middle element for odd counts, mean of the two middle
/// elements for even counts. Empty input yields 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Mean of the `n` largest values (fewer if not available). Empty input yields 0.
pub fn top_n_mean(values: &[u32], n: usize) -> f64 {
    let top: Vec<u32> = sorted_descending(values).into_iter().take(n).collect();
    mean(&top)
}

/// Round to the nearest integer, halves away from zero
pub fn round_half_away(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Round to the nearest hundred, halves away from zero (2450 -> 2500)
pub fn round_to_hundred(value: u32) -> u32 {
    value.saturating_add(50) / 100 * 100
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

fn median_of_top(descending: &[u32], n: usize) -> f64 {
    let top: Vec<f64> = descending.iter().take(n).map(|&v| v as f64).collect();
    median(&top)
}

fn sorted_descending(values: &[u32]) -> Vec<u32> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted
}
