use serde::{Deserialize, Serialize};

use crate::errors::{FeeError, Result};

/// identifier layout for one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// fixed 4-digit literal prefix on every student identifier
    pub student_id_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            student_id_prefix: "0967".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.student_id_prefix.len() != 4
            || !self.student_id_prefix.chars().all(|c| c.is_ascii_digit())
        {
            return Err(FeeError::InvalidConfiguration {
                message: format!(
                    "student id prefix must be exactly 4 digits, got {:?}",
                    self.student_id_prefix
                ),
            });
        }

        Ok(())
    }
}
