//! Error types for the emotion pipeline

use thiserror::Error;

/// Errors that can occur while turning an Action Unit log into emotion rows
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A log line could not be reconstructed into a valid `Time,Expression,Weight` row
    #[error("Malformed input at line {line}: {reason}")]
    MalformedInput {
        /// 1-based line number in the raw log
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// A task segment contained no data rows
    ///
    /// Recovered locally by the splitter; exposed so callers can report it.
    #[error("Task {task} has no data rows")]
    EmptySegment {
        /// Exported (1-based) task index of the empty segment
        task: u32,
    },

    /// A required column is absent from an input table
    #[error("Missing column: {column}")]
    MissingColumn {
        /// Name of the missing column
        column: String,
    },

    /// A weight could not be coerced to a number after sanitation
    ///
    /// Recovered locally by the aggregator, which excludes the row.
    #[error("Non-numeric weight {value:?} at line {line}")]
    NonNumericWeight {
        /// 1-based line number in the table the weight was read from
        line: usize,
        /// The raw weight text
        value: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Shorthand for [`PipelineError::MalformedInput`]
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        PipelineError::MalformedInput {
            line,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`PipelineError::MissingColumn`]
    pub(crate) fn missing_column(column: impl Into<String>) -> Self {
        PipelineError::MissingColumn {
            column: column.into(),
        }
    }

    /// Whether the pipeline recovers from this error without failing the file
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptySegment { .. } | PipelineError::NonNumericWeight { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_line() {
        let err = PipelineError::malformed(7, "expected 3 fields, found 5");
        assert_eq!(
            err.to_string(),
            "Malformed input at line 7: expected 3 fields, found 5"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(PipelineError::EmptySegment { task: 3 }.is_recoverable());
        assert!(PipelineError::NonNumericWeight {
            line: 2,
            value: "abc".to_string()
        }
        .is_recoverable());
        assert!(!PipelineError::missing_column("Weight").is_recoverable());
        assert!(!PipelineError::malformed(1, "empty").is_recoverable());
    }
}
