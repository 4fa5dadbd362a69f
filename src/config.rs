use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// What `step` does with an entry naming an unregistered teacher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTeacherPolicy {
    /// Log a warning and carry on with the remaining entries
    #[default]
    Skip,
    /// Fail the whole step with `UnknownEntity`
    Fail,
}

/// Academy-wide settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademyConfig {
    pub unknown_teacher_in_step: UnknownTeacherPolicy,
    /// Seed for the default strategies' randomness. Each teacher derives its
    /// own stream from it. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl AcademyConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_skip_unknown_teachers() {
        let config = AcademyConfig::default();
        assert_eq!(config.unknown_teacher_in_step, UnknownTeacherPolicy::Skip);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_parse_policy() {
        let config = AcademyConfig::from_json_str(r#"{"unknown_teacher_in_step": "fail"}"#).unwrap();
        assert_eq!(config.unknown_teacher_in_step, UnknownTeacherPolicy::Fail);

        assert!(AcademyConfig::from_json_str(r#"{"unknown_teacher_in_step": "explode"}"#).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("academy.json");
        let config = AcademyConfig {
            unknown_teacher_in_step: UnknownTeacherPolicy::Fail,
            seed: Some(42),
        };

        config.save(&path).unwrap();
        assert_eq!(AcademyConfig::from_json_file(&path).unwrap(), config);
    }
}
