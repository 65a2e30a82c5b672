//! Program configuration
//!
//! Everything the engine needs to know about a deployment is injected through
//! [`ProgramConfig`]: which algorithm runs by default, the thresholds of each
//! policy and the host codes of every record. Missing fields fall back to the
//! STEP program defaults.

use crate::error::ComputeError;
use crate::policy::{Algorithm, GoalPolicy};
use crate::schema::RecordCodes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Algorithm used when the caller does not pick one
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default = "GoalPolicy::step")]
    pub step: GoalPolicy,
    #[serde(default = "GoalPolicy::northumbria")]
    pub northumbria: GoalPolicy,
    #[serde(default)]
    pub codes: RecordCodes,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            step: GoalPolicy::step(),
            northumbria: GoalPolicy::northumbria(),
            codes: RecordCodes::default(),
        }
    }
}

impl ProgramConfig {
    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        for (expected, policy) in [
            (Algorithm::Step, &self.step),
            (Algorithm::Northumbria, &self.northumbria),
        ] {
            if policy.algorithm != expected {
                return Err(ComputeError::Configuration(format!(
                    "policy configured under {} declares algorithm {}",
                    expected.as_str(),
                    policy.algorithm.as_str()
                )));
            }
            policy.validate()?;
        }
        self.codes.validate()
    }

    pub fn policy(&self, algorithm: Algorithm) -> &GoalPolicy {
        match algorithm {
            Algorithm::Step => &self.step,
            Algorithm::Northumbria => &self.northumbria,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DayThreshold;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ProgramConfig::from_json("{}").unwrap();
        assert_eq!(config, ProgramConfig::default());
        assert_eq!(config.policy(Algorithm::Step), &GoalPolicy::step());
    }

    #[test]
    fn test_override_northumbria_threshold() {
        let mut policy = GoalPolicy::northumbria();
        policy.valid_day = DayThreshold::default();
        let json = format!(
            r#"{{"algorithm": "NORTHUMBRIA", "northumbria": {}}}"#,
            serde_json::to_string(&policy).unwrap()
        );

        let config = ProgramConfig::from_json(&json).unwrap();
        assert_eq!(config.algorithm, Algorithm::Northumbria);
        assert!(config.policy(Algorithm::Northumbria).valid_day.inclusive);
    }

    #[test]
    fn test_mismatched_policy_is_rejected() {
        let json = format!(
            r#"{{"step": {}}}"#,
            serde_json::to_string(&GoalPolicy::northumbria()).unwrap()
        );
        assert!(matches!(
            ProgramConfig::from_json(&json),
            Err(ComputeError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_code_is_rejected() {
        let json = r#"{"codes": {"tasks": {"steps": ""}}}"#;
        assert!(matches!(
            ProgramConfig::from_json(json),
            Err(ComputeError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_roundtrips() {
        let config = ProgramConfig::default();
        let loaded = ProgramConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }
}
