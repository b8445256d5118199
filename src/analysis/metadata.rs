//! Analysis metadata structures

use serde::{Deserialize, Serialize};

use crate::preprocessing::task_splitter::task_name;
use crate::preprocessing::SanitizeStats;

/// Diagnostics collected while analysing one log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Algorithm version
    pub algorithm_version: String,

    /// Sanitation counters
    pub sanitize: SanitizeStats,

    /// Task marker lines found
    pub markers_found: usize,

    /// Exported indices of task segments dropped for having no rows
    pub empty_segments: Vec<u32>,

    /// Exported indices of task segments dropped by policy
    pub excluded_tasks: Vec<u32>,

    /// Rows excluded from aggregation for a non-numeric weight, over all tasks
    pub non_numeric_dropped: usize,

    /// Timestamps labelled neutral, over all tasks
    pub neutral_rows: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: f64,
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self {
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            sanitize: SanitizeStats::default(),
            markers_found: 0,
            empty_segments: vec![],
            excluded_tasks: vec![],
            non_numeric_dropped: 0,
            neutral_rows: 0,
            processing_time_ms: 0.0,
        }
    }
}

impl RunMetadata {
    /// Human-readable notes about recovered conditions, empty if none
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for task in &self.empty_segments {
            warnings.push(format!("{} had no data rows and was dropped", task_name(*task)));
        }
        for task in &self.excluded_tasks {
            warnings.push(format!("{} is excluded by configuration", task_name(*task)));
        }
        if self.non_numeric_dropped > 0 {
            warnings.push(format!(
                "{} rows with non-numeric weights were left out of aggregation",
                self.non_numeric_dropped
            ));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_carries_version() {
        let metadata = RunMetadata::default();
        assert_eq!(metadata.algorithm_version, env!("CARGO_PKG_VERSION"));
        assert!(metadata.warnings().is_empty());
    }

    #[test]
    fn test_warnings() {
        let metadata = RunMetadata {
            empty_segments: vec![3],
            excluded_tasks: vec![14],
            non_numeric_dropped: 2,
            ..RunMetadata::default()
        };
        let warnings = metadata.warnings();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("task_3"));
        assert!(warnings[1].contains("task_14"));
    }
}
