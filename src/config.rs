use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which report template variant to use and how to case header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterCase {
    Upper,
    Mixed,
}

/// Report-building settings.
///
/// Stored as a JSON object on disk; every field is optional:
/// ```json
/// {
///   "all_upper_case": true,
///   "data_dir": "data",
///   "template_dir": "templates",
///   "output_dir": "output",
///   "batch_log": "output/batch_log.csv"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub all_upper_case: bool,
    pub data_dir: String,
    pub template_dir: String,
    pub output_dir: String,
    pub batch_log: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            all_upper_case: true,
            data_dir: "data".to_string(),
            template_dir: "templates".to_string(),
            output_dir: "output".to_string(),
            batch_log: "output/batch_log.csv".to_string(),
        }
    }
}

impl ReportConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{path}'"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config '{path}'"))?;
        Ok(config)
    }

    /// Loads from `F6_CONFIG_PATH` when set, otherwise returns defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var("F6_CONFIG_PATH") {
            Ok(path) => Self::load(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn letter_case(&self) -> LetterCase {
        if self.all_upper_case {
            LetterCase::Upper
        } else {
            LetterCase::Mixed
        }
    }
}
