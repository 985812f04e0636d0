//! Verification configuration.

use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

pub const DEFAULT_UNROLL_BOUND: u32 = 10;
pub const DEFAULT_SOLVER_TIMEOUT_MS: u64 = 10_000;

/// Settings for one verification run.
///
/// Deserializes from JSON with either snake_case or camelCase keys; absent
/// keys take their defaults.
///
/// ```json
/// { "unrollBound": 3, "solverTimeoutMs": 5000, "outputVariables": ["z"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Maximum number of unrolled copies per loop.
    #[serde(alias = "unrollBound")]
    pub unroll_bound: u32,
    /// Per-query solver timeout. 0 disables the timeout.
    #[serde(alias = "solverTimeoutMs")]
    pub solver_timeout_ms: u64,
    /// Names compared by equivalence checks. `None` compares every name
    /// assigned in both programs.
    #[serde(alias = "outputVariables")]
    pub output_variables: Option<Vec<String>>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            unroll_bound: DEFAULT_UNROLL_BOUND,
            solver_timeout_ms: DEFAULT_SOLVER_TIMEOUT_MS,
            output_variables: None,
        }
    }
}

impl VerifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unroll_bound(mut self, bound: u32) -> Self {
        self.unroll_bound = bound;
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.solver_timeout_ms = timeout_ms;
        self
    }

    pub fn with_outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_variables = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Parse a configuration from JSON text and validate it.
    pub fn from_json(text: &str) -> Result<Self, VerifyError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| VerifyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.unroll_bound == 0 {
            return Err(VerifyError::Config(
                "unroll bound must be at least 1".to_string(),
            ));
        }
        if let Some(outputs) = &self.output_variables {
            if outputs.is_empty() {
                return Err(VerifyError::Config(
                    "output variable list is empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = VerifyConfig::default();
        assert_eq!(config.unroll_bound, 10);
        assert_eq!(config.solver_timeout_ms, 10_000);
        assert!(config.output_variables.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let config = VerifyConfig::from_json(
            r#"{ "unrollBound": 3, "solverTimeoutMs": 500, "outputVariables": ["z"] }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            VerifyConfig::new().with_unroll_bound(3).with_timeout(500).with_outputs(["z"])
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config = VerifyConfig::from_json(r#"{ "unroll_bound": 2 }"#).unwrap();
        assert_eq!(config.unroll_bound, 2);
        assert_eq!(config.solver_timeout_ms, DEFAULT_SOLVER_TIMEOUT_MS);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            VerifyConfig::from_json(r#"{ "unrollBound": 0 }"#),
            Err(VerifyError::Config(_))
        ));
        assert!(matches!(
            VerifyConfig::from_json("not json"),
            Err(VerifyError::Config(_))
        ));
        assert!(VerifyConfig::new().with_outputs(Vec::<String>::new()).validate().is_err());
    }
}
