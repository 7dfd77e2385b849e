//! Engine configuration
//!
//! Values come from environment variables with documented defaults; invalid
//! values fall back with a warning rather than aborting. Callers run
//! `validate` once at startup.

use std::env;

use crate::error::ValidationError;

pub const DEFAULT_EXPIRY_THRESHOLD_DAYS: i64 = 3;
pub const DEFAULT_MOST_WASTED_TOP_N: usize = 5;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound (inclusive) of days-to-expiry for the ExpiringSoon bucket.
    pub expiring_soon_threshold_days: i64,
    /// How many names the most-wasted-items ranking returns.
    pub most_wasted_top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expiring_soon_threshold_days: DEFAULT_EXPIRY_THRESHOLD_DAYS,
            most_wasted_top_n: DEFAULT_MOST_WASTED_TOP_N,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let expiring_soon_threshold_days = env::var("PANTRYFLOW_EXPIRY_THRESHOLD_DAYS")
            .ok()
            .and_then(|v| match v.parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    log::warn!(
                        "Invalid PANTRYFLOW_EXPIRY_THRESHOLD_DAYS '{}', defaulting to {}",
                        v,
                        DEFAULT_EXPIRY_THRESHOLD_DAYS
                    );
                    None
                }
            })
            .unwrap_or(DEFAULT_EXPIRY_THRESHOLD_DAYS);

        let most_wasted_top_n = env::var("PANTRYFLOW_MOST_WASTED_TOP_N")
            .ok()
            .and_then(|v| match v.parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => {
                    log::warn!(
                        "Invalid PANTRYFLOW_MOST_WASTED_TOP_N '{}', defaulting to {}",
                        v,
                        DEFAULT_MOST_WASTED_TOP_N
                    );
                    None
                }
            })
            .unwrap_or(DEFAULT_MOST_WASTED_TOP_N);

        Self {
            expiring_soon_threshold_days,
            most_wasted_top_n,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.expiring_soon_threshold_days < 0 {
            return Err(ValidationError::new(
                "expiring_soon_threshold_days",
                format!("must be >= 0, got {}", self.expiring_soon_threshold_days),
            ));
        }
        if self.most_wasted_top_n == 0 {
            return Err(ValidationError::new("most_wasted_top_n", "must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.expiring_soon_threshold_days, 3);
        assert_eq!(config.most_wasted_top_n, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_falls_back_on_invalid_values() {
        env::set_var("PANTRYFLOW_EXPIRY_THRESHOLD_DAYS", "soon");
        env::set_var("PANTRYFLOW_MOST_WASTED_TOP_N", "-2");
        let config = EngineConfig::from_env();
        env::remove_var("PANTRYFLOW_EXPIRY_THRESHOLD_DAYS");
        env::remove_var("PANTRYFLOW_MOST_WASTED_TOP_N");

        assert_eq!(
            config.expiring_soon_threshold_days,
            DEFAULT_EXPIRY_THRESHOLD_DAYS
        );
        assert_eq!(config.most_wasted_top_n, DEFAULT_MOST_WASTED_TOP_N);
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = EngineConfig {
            expiring_soon_threshold_days: -1,
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "expiring_soon_threshold_days");
    }

    #[test]
    fn test_validate_rejects_zero_top_n() {
        let config = EngineConfig {
            most_wasted_top_n: 0,
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "most_wasted_top_n");
    }
}
