use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Process-wide economy policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Factor applied to overdraft minutes when they become debt.
    #[serde(default = "default_overdraft_multiplier")]
    pub overdraft_multiplier: f64,
    /// Upper bound on banked minutes.
    #[serde(default = "default_bank_cap")]
    pub bank_cap: u32,
}

fn default_overdraft_multiplier() -> f64 {
    2.0
}

fn default_bank_cap() -> u32 {
    60
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            overdraft_multiplier: default_overdraft_multiplier(),
            bank_cap: default_bank_cap(),
        }
    }
}

impl EconomyConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the multiplier is not a
    /// finite number of at least 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.overdraft_multiplier.is_finite() || self.overdraft_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "economy.overdraft_multiplier".into(),
                message: format!(
                    "must be a finite number >= 1.0, got {}",
                    self.overdraft_multiplier
                ),
            });
        }
        Ok(())
    }

    /// Convert overdraft minutes into whole penalty minutes.
    ///
    /// Fractional products round up.
    pub fn penalty_for(&self, overdraft_minutes: u64) -> u32 {
        let raw = (overdraft_minutes as f64 * self.overdraft_multiplier).ceil();
        if raw >= u32::MAX as f64 {
            u32::MAX
        } else {
            raw as u32
        }
    }
}
