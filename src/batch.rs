//! File pipeline and multi-file batch driver
//!
//! [`process_file`] runs the whole pipeline on one log file and publishes its
//! tables; [`process_files`] does so for many files, collecting per-file
//! failures instead of stopping at the first one. Files may run in parallel on
//! a rayon pool; the rows of one file are always processed sequentially.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::metadata::RunMetadata;
use crate::analysis::result::{FinalRow, LogAnalysis};
use crate::analysis::statistics::{EmotionStatistics, TaskCount};
use crate::config::{OutputConfig, PipelineConfig};
use crate::error::PipelineError;
use crate::io::reader::{file_name, file_stem, read_log};
use crate::io::writer::StagedOutputs;
use crate::preprocessing::sanitize;

/// Outputs of one successfully processed file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutput {
    /// Input log
    pub source: PathBuf,
    /// Final tables, one per task in split mode, otherwise one
    pub final_tables: Vec<PathBuf>,
    /// Every file written, final tables included
    pub written: Vec<PathBuf>,
    /// Statistics of each final table, same order as `final_tables`
    pub statistics: Vec<EmotionStatistics>,
    /// Run diagnostics
    pub metadata: RunMetadata,
}

/// A file whose pipeline run failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Input log
    pub source: PathBuf,
    /// Rendered error
    pub error: String,
}

/// Result of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Successful files, in input order
    pub outputs: Vec<FileOutput>,
    /// Failed files, in input order
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    /// Final table paths of every successful file
    pub fn final_tables(&self) -> Vec<&Path> {
        self.outputs
            .iter()
            .flat_map(|output| output.final_tables.iter().map(PathBuf::as_path))
            .collect()
    }

    /// Whether every file succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the pipeline on one log file and publish its outputs
///
/// Writes, relative to `output.output_dir`:
/// - `sanitized/sanitized_<file name>`
/// - split mode: `<stem>_task_<n>_final.csv` per task; otherwise `<stem>_emotions.csv`
/// - `<table stem>_statistics.json` per final table if statistics are enabled
/// - `aggregated/<stem>_task_<n>_aggregated.csv` and
///   `emotions/<stem>_task_<n>_emotions.csv` if intermediates are enabled
///
/// Nothing is published unless every table was computed and written.
///
/// # Errors
///
/// Any error of reading, sanitizing or writing; the configuration is
/// validated first
pub fn process_file(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
    output: &OutputConfig,
) -> Result<FileOutput, PipelineError> {
    let path = path.as_ref();
    let start = Instant::now();
    config.validate()?;

    log::info!("Processing {}", path.display());
    let source = file_name(path);
    let stem = file_stem(path);

    let content = read_log(path)?;
    let sanitized = sanitize(&content)?;
    let mut analysis = crate::analyze_sanitized(&source, &sanitized, config)?;

    let mut staged = StagedOutputs::new();
    staged.stage_bytes(
        output.sanitized_dir().join(format!("sanitized_{}", source)),
        sanitized.to_csv_text()?.as_bytes(),
    )?;

    if output.write_intermediates {
        for task in &analysis.tasks {
            staged.stage_csv(
                output
                    .aggregated_dir()
                    .join(format!("{}_{}_aggregated.csv", stem, task.name)),
                &task.aggregated,
            )?;
            staged.stage_csv(
                output
                    .emotions_dir()
                    .join(format!("{}_{}_emotions.csv", stem, task.name)),
                &task.emotions,
            )?;
        }
    }

    let mut tables = Vec::new();
    let mut statistics = Vec::new();
    for (table_stem, rows, stats) in final_tables(&stem, &analysis, config) {
        let table = output.output_dir.join(format!("{}.csv", table_stem));
        staged.stage_csv(&table, &rows)?;
        if output.write_statistics {
            staged.stage_json(
                output
                    .output_dir
                    .join(format!("{}_statistics.json", table_stem)),
                &stats,
            )?;
        }
        tables.push(table);
        statistics.push(stats);
    }

    let written = staged.commit()?;

    analysis.metadata.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    log::info!(
        "{}: {} tasks, {} final tables written to {}",
        source,
        analysis.tasks.len(),
        tables.len(),
        output.output_dir.display()
    );

    Ok(FileOutput {
        source: path.to_path_buf(),
        final_tables: tables,
        written,
        statistics,
        metadata: analysis.metadata,
    })
}

/// Final tables of one analysis as (table stem, rows, statistics)
fn final_tables(
    stem: &str,
    analysis: &LogAnalysis,
    config: &PipelineConfig,
) -> Vec<(String, Vec<FinalRow>, EmotionStatistics)> {
    if config.split_tasks {
        analysis
            .tasks
            .iter()
            .map(|task| {
                let table_stem = format!("{}_{}_final", stem, task.name);
                let stats = EmotionStatistics::from_rows(table_stem.clone(), &task.rows, None);
                (table_stem, task.rows.clone(), stats)
            })
            .collect()
    } else {
        let table_stem = format!("{}_emotions", stem);
        let rows = analysis.combined_rows();
        let task_counts = analysis
            .task_counts()
            .into_iter()
            .map(|(task, timestamps)| TaskCount { task, timestamps })
            .collect();
        let stats = EmotionStatistics::from_rows(table_stem.clone(), &rows, Some(task_counts));
        vec![(table_stem, rows, stats)]
    }
}

/// Run the pipeline on many files
///
/// A failing file is recorded in the report and never stops the others. Two
/// inputs sharing a file stem would write the same output names, so every
/// input after the first with that stem fails without being processed.
///
/// With `output.jobs > 1` files run on a dedicated rayon pool of that size.
pub fn process_files<P: AsRef<Path> + Sync>(
    paths: &[P],
    config: &PipelineConfig,
    output: &OutputConfig,
) -> BatchReport {
    let start = Instant::now();

    let mut seen = HashSet::new();
    let unique: Vec<bool> = paths
        .iter()
        .map(|path| seen.insert(file_stem(path.as_ref())))
        .collect();

    let run = |(path, unique): (&P, &bool)| -> Result<FileOutput, FileFailure> {
        let path = path.as_ref();
        if !*unique {
            return Err(FileFailure {
                source: path.to_path_buf(),
                error: format!(
                    "another input shares the name {:?}; outputs would collide",
                    file_stem(path)
                ),
            });
        }
        process_file(path, config, output).map_err(|e| {
            log::error!("Failed to process {}: {}", path.display(), e);
            FileFailure {
                source: path.to_path_buf(),
                error: e.to_string(),
            }
        })
    };

    let results: Vec<Result<FileOutput, FileFailure>> = if output.jobs > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(output.jobs).build() {
            Ok(pool) => pool.install(|| {
                paths
                    .par_iter()
                    .zip(unique.par_iter())
                    .map(run)
                    .collect::<Vec<_>>()
            }),
            Err(e) => {
                log::warn!("Could not start {} workers ({}), running sequentially", output.jobs, e);
                paths.iter().zip(unique.iter()).map(run).collect()
            }
        }
    } else {
        paths.iter().zip(unique.iter()).map(run).collect()
    };

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(file) => report.outputs.push(file),
            Err(failure) => report.failures.push(failure),
        }
    }

    log::info!(
        "Batch done: {} ok, {} failed in {:.0} ms",
        report.outputs.len(),
        report.failures.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    report
}
