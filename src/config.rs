//! Configuration parameters for the emotion pipeline

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Exported task index dropped by default (site policy inherited from the recording protocol)
pub const DEFAULT_EXCLUDED_TASK: u32 = 14;

/// Pipeline configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Neutrality threshold (default: 0.2)
    /// A timestamp whose dominant intensity is strictly below this is labelled "neutral"
    pub threshold: f64,

    /// Keep tasks as separate result tables (default: false = one combined table)
    pub split_tasks: bool,

    /// Exported task indices that are always dropped (default: {14})
    pub excluded_tasks: BTreeSet<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            split_tasks: false,
            excluded_tasks: BTreeSet::from([DEFAULT_EXCLUDED_TASK]),
        }
    }
}

impl PipelineConfig {
    /// Check that every parameter is within its documented range
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if the threshold is NaN or outside [0, 1]
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold must be in [0.0, 1.0], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file, defaulting missing fields
    ///
    /// The loaded configuration is validated before it is returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line style overrides on top of this configuration
    ///
    /// # Arguments
    ///
    /// * `threshold` - Replaces the threshold only when given
    /// * `split_tasks` - Turns split mode on; `false` keeps the current setting
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if the resulting configuration is invalid
    ///
    /// # Example
    ///
    /// ```
    /// use au_emotion::PipelineConfig;
    ///
    /// let loaded = PipelineConfig { threshold: 0.35, ..PipelineConfig::default() };
    /// assert_eq!(loaded.clone().with_overrides(None, false)?.threshold, 0.35);
    /// assert_eq!(loaded.with_overrides(Some(0.5), false)?.threshold, 0.5);
    /// # Ok::<(), au_emotion::PipelineError>(())
    /// ```
    pub fn with_overrides(mut self, threshold: Option<f64>, split_tasks: bool) -> Result<Self, PipelineError> {
        if let Some(threshold) = threshold {
            self.threshold = threshold;
        }
        self.split_tasks |= split_tasks;
        self.validate()?;
        Ok(self)
    }

    /// Whether the given exported task index is dropped
    pub fn is_excluded(&self, task_index: u32) -> bool {
        self.excluded_tasks.contains(&task_index)
    }
}

/// Where and what the file pipeline writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for final tables (default: "output")
    pub output_dir: PathBuf,

    /// Also persist aggregated and per-emotion tables (default: false)
    pub write_intermediates: bool,

    /// Persist a statistics JSON next to each final table (default: true)
    pub write_statistics: bool,

    /// Worker count for batch runs (default: 1, strictly sequential)
    pub jobs: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            write_intermediates: false,
            write_statistics: true,
            jobs: 1,
        }
    }
}

impl OutputConfig {
    /// Output directory rooted at `dir`, other fields defaulted
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Check that every parameter is within its documented range
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if `jobs` is zero
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.jobs == 0 {
            return Err(PipelineError::InvalidConfig("jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load an output configuration from a JSON file, defaulting missing fields
    ///
    /// The loaded configuration is validated before it is returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory holding sanitized copies of the input logs
    pub fn sanitized_dir(&self) -> PathBuf {
        self.output_dir.join("sanitized")
    }

    /// Directory holding per-task aggregated tables
    pub fn aggregated_dir(&self) -> PathBuf {
        self.output_dir.join("aggregated")
    }

    /// Directory holding per-task emotion tables
    pub fn emotions_dir(&self) -> PathBuf {
        self.output_dir.join("emotions")
    }
}
