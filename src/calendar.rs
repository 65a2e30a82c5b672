//! Week boundaries for weekly evaluations

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Monday..Sunday window evaluated for a calculation date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWeek {
    pub monday: NaiveDate,
    pub sunday: NaiveDate,
}

impl EvaluationWeek {
    /// Week evaluated on `calc_date`.
    ///
    /// A Sunday evaluates the week ending that day; any other day evaluates the
    /// week ending on the most recent prior Sunday.
    pub fn for_calc_date(calc_date: NaiveDate) -> Self {
        let sunday = if calc_date.weekday() == Weekday::Sun {
            calc_date
        } else {
            calc_date - Days::new(calc_date.weekday().number_from_monday() as u64)
        };
        Self {
            monday: sunday - Days::new(6),
            sunday,
        }
    }

    /// First day the goal computed from this week applies to
    pub fn next_period_start(&self) -> NaiveDate {
        self.sunday + Days::new(1)
    }
}

/// Parse a `YYYY-MM-DD` date, ignoring any time part after a space or `T`
pub fn parse_day(value: &str) -> Result<NaiveDate, crate::ComputeError> {
    let day_part = value
        .trim()
        .split([' ', 'T'])
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .map_err(|e| crate::ComputeError::DateParseError(format!("{}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    #[test]
    fn test_monday_evaluates_previous_week() {
        // 2024-01-15 is a Monday
        let week = EvaluationWeek::for_calc_date(day("2024-01-15"));
        assert_eq!(week.monday, day("2024-01-08"));
        assert_eq!(week.sunday, day("2024-01-14"));
        assert_eq!(week.next_period_start(), day("2024-01-15"));
    }

    #[test]
    fn test_sunday_evaluates_its_own_week() {
        let week = EvaluationWeek::for_calc_date(day("2024-01-14"));
        assert_eq!(week.monday, day("2024-01-08"));
        assert_eq!(week.sunday, day("2024-01-14"));
    }

    #[test]
    fn test_saturday_evaluates_week_before() {
        let week = EvaluationWeek::for_calc_date(day("2024-01-20"));
        assert_eq!(week.monday, day("2024-01-08"));
        assert_eq!(week.sunday, day("2024-01-14"));
    }

    #[test]
    fn test_week_spans_monday_to_sunday() {
        let week = EvaluationWeek::for_calc_date(day("2024-01-17"));
        assert_eq!(week.monday.weekday(), Weekday::Mon);
        assert_eq!(week.sunday.weekday(), Weekday::Sun);
        assert_eq!((week.sunday - week.monday).num_days(), 6);
    }

    #[test]
    fn test_parse_day_strips_time() {
        assert_eq!(day("2024-01-15 09:30:00"), day("2024-01-15"));
        assert_eq!(day("2024-01-15T09:30:00Z"), day("2024-01-15"));
        assert!(parse_day("15/01/2024").is_err());
    }
}
