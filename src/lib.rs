//! # AU Emotion
//!
//! Turns facial-expression-recognition logs (timestamped Action Unit weights)
//! into a per-second timeline of the six primary emotions.
//!
//! ## Features
//!
//! - **Sanitation**: drops `Invalid` samples and repairs comma decimal separators
//! - **Task splitting**: partitions a session at `### New level - TASK n ###` markers
//! - **Second aggregation**: averages sub-second samples per Action Unit
//! - **Emotion detection**: all-or-nothing AU group patterns, normalized per second
//! - **Finalization**: dominant emotion per second with a neutrality threshold
//!
//! ## Quick Start
//!
//! ```
//! use au_emotion::{analyze_log, DominantEmotion, Emotion, PipelineConfig};
//!
//! let log = "Time,Expression,Weight\n\
//!            12:00:01.100 PM,CheekRaiserL,0.8\n\
//!            12:00:01.400 PM,CheekRaiserR,0.8\n\
//!            12:00:01.600 PM,LipCornerPullerL,0,6\n\
//!            12:00:01.900 PM,LipCornerPullerR,0.6\n";
//!
//! let analysis = analyze_log("session.csv", log, &PipelineConfig::default())?;
//! let rows = analysis.combined_rows();
//!
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].dominant_emotion, DominantEmotion::Emotion(Emotion::Happiness));
//! # Ok::<(), au_emotion::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! The pipeline follows this flow:
//!
//! ```text
//! Raw log → Sanitizer → Task Splitter → per task: Aggregator → Detector → Finalizer → Tables
//! ```
//!
//! [`batch::process_file`] and [`batch::process_files`] add the file layer:
//! reading logs, publishing tables atomically and reporting per-file failures.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::result::{DominantEmotion, FinalRow, LogAnalysis, TaskResult};
pub use analysis::{finalize, EmotionStatistics, RunMetadata};
pub use batch::{process_file, process_files, BatchReport, FileFailure, FileOutput};
pub use config::{OutputConfig, PipelineConfig};
pub use error::PipelineError;
pub use features::aggregation::{aggregate_by_second, AggregatedRow};
pub use features::emotion::{detect_emotions, Emotion, EmotionRow};
pub use preprocessing::{sanitize, split_tasks, SanitizedLog, SanitizedRow, Task};

use std::time::Instant;

/// Main analysis function
///
/// Runs the whole pipeline on the text of one log.
///
/// # Arguments
///
/// * `source` - Name of the log, used in diagnostics
/// * `content` - Full text of the raw log
/// * `config` - Pipeline configuration
///
/// # Returns
///
/// `LogAnalysis` with every stage output of every surviving task
///
/// # Errors
///
/// Returns `PipelineError` if the configuration is invalid or the log cannot be
/// sanitized (malformed row, missing column)
pub fn analyze_log(
    source: &str,
    content: &str,
    config: &PipelineConfig,
) -> Result<LogAnalysis, PipelineError> {
    config.validate()?;
    log::debug!("Starting analysis of {}: {} bytes", source, content.len());
    let sanitized = sanitize(content)?;
    analyze_sanitized(source, &sanitized, config)
}

/// Run the pipeline from an already sanitized log
///
/// # Errors
///
/// Returns `PipelineError::InvalidConfig` if the configuration is invalid
pub fn analyze_sanitized(
    source: &str,
    sanitized: &SanitizedLog,
    config: &PipelineConfig,
) -> Result<LogAnalysis, PipelineError> {
    let start_time = Instant::now();
    config.validate()?;

    let split = split_tasks(sanitized, &config.excluded_tasks);
    log::info!(
        "{}: {} rows, {} markers, {} tasks",
        source,
        sanitized.row_count(),
        split.markers_found,
        split.tasks.len()
    );

    let tasks: Vec<TaskResult> = split
        .tasks
        .iter()
        .map(|task| {
            log::debug!("{}: analysing {}", source, task.name());
            analyze_task(task, config.threshold)
        })
        .collect();

    let metadata = RunMetadata {
        sanitize: sanitized.stats.clone(),
        markers_found: split.markers_found,
        empty_segments: split.empty_segments.clone(),
        excluded_tasks: split.excluded.clone(),
        non_numeric_dropped: tasks.iter().map(|task| task.dropped_non_numeric).sum(),
        neutral_rows: tasks.iter().map(TaskResult::neutral_count).sum(),
        processing_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
        ..RunMetadata::default()
    };

    Ok(LogAnalysis {
        source: source.to_string(),
        tasks,
        metadata,
    })
}

/// Run aggregation, detection and finalization on one task
///
/// # Arguments
///
/// * `task` - Task rows
/// * `threshold` - Neutrality threshold in [0, 1]
pub fn analyze_task(task: &Task, threshold: f64) -> TaskResult {
    let aggregation = aggregate_by_second(&task.rows);
    let emotions = detect_emotions(&aggregation.rows);
    let rows = finalize(&emotions, threshold);

    log::debug!(
        "{}: {} samples → {} aggregated → {} emotion rows → {} timestamps",
        task.name(),
        task.rows.len(),
        aggregation.rows.len(),
        emotions.len(),
        rows.len()
    );

    TaskResult {
        index: task.index,
        name: task.name(),
        aggregated: aggregation.rows,
        emotions,
        rows,
        dropped_non_numeric: aggregation.dropped_non_numeric,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_log_rejects_invalid_threshold() {
        let config = PipelineConfig {
            threshold: 1.5,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            analyze_log("x", "Time,Expression,Weight\n", &config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_header_only_log_has_no_tasks() {
        let analysis = analyze_log("x", "Time,Expression,Weight\n", &PipelineConfig::default()).unwrap();
        assert!(analysis.tasks.is_empty());
        assert!(analysis.combined_rows().is_empty());
    }

    #[test]
    fn test_metadata_counts() {
        let log = "Time,Expression,Weight\n\
                   1:00:00.100 PM,Invalid,0\n\
                   1:00:00.200 PM,JawDrop,0,3\n\
                   ### New level - TASK 1 ###\n\
                   ### New level - TASK 13 ###\n\
                   1:00:05.000 PM,JawDrop,0.2\n";
        let analysis = analyze_log("x", log, &PipelineConfig::default()).unwrap();
        let metadata = &analysis.metadata;

        assert_eq!(metadata.sanitize.invalid_dropped, 1);
        assert_eq!(metadata.sanitize.decimal_fixups, 1);
        assert_eq!(metadata.markers_found, 2);
        assert_eq!(metadata.empty_segments, vec![2]);
        assert_eq!(metadata.excluded_tasks, vec![14]);
        assert_eq!(metadata.neutral_rows, 1);
        assert_eq!(analysis.tasks.len(), 1);
        assert_eq!(analysis.tasks[0].name, "task_1");
    }

    #[test]
    fn test_analyze_task_keeps_stage_outputs() {
        let task = Task::new(
            3,
            vec![
                SanitizedRow::new("1:00:00.100 PM", "CheekRaiserL", 0.5),
                SanitizedRow::new("1:00:00.200 PM", "LipCornerPullerL", 0.5),
            ],
        );
        let result = analyze_task(&task, 0.2);

        assert_eq!(result.name, "task_3");
        assert_eq!(result.aggregated.len(), 2);
        assert_eq!(result.emotions.len(), 6);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].dominant_emotion, DominantEmotion::Emotion(Emotion::Happiness));
    }
}
