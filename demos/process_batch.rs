//! Example: Process multiple Action Unit logs in parallel
//!
//! Usage:
//!   cargo run --release --example process_batch -- [--jobs N] [--json] [-t THRESHOLD] [-s] [-o DIR] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files (batch-level). Each file is still processed sequentially.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use au_emotion::{process_files, OutputConfig, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

/// Process many Action Unit logs, one worker per file
#[derive(Debug, Parser)]
#[command(name = "process_batch", version)]
struct Args {
    /// Raw log files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Parallel workers (default: CPU-1)
    #[arg(long)]
    jobs: Option<usize>,

    /// Emit one JSON object per line (JSONL)
    #[arg(long)]
    json: bool,

    /// Neutrality threshold in [0, 1]
    #[arg(short, long, default_value_t = 0.2)]
    threshold: f64,

    /// Write one table per task instead of one combined table
    #[arg(short, long)]
    split_tasks: bool,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let jobs = std::cmp::max(1, args.jobs.unwrap_or_else(default_jobs));
    eprintln!("Batch: {} files, jobs={}", args.files.len(), jobs);

    let config = PipelineConfig::default().with_overrides(Some(args.threshold), args.split_tasks)?;
    let output = OutputConfig {
        jobs,
        ..OutputConfig::in_dir(&args.output_dir)
    };

    let t0 = Instant::now();
    let report = process_files(&args.files, &config, &output);
    let total = report.outputs.len() + report.failures.len();

    if args.json {
        for file in &report.outputs {
            for (table, stats) in file.final_tables.iter().zip(&file.statistics) {
                println!(
                    "{}",
                    serde_json::json!({
                        "file": file.source,
                        "table": table,
                        "timestamps": stats.total_timestamps,
                        "counts": stats.counts,
                        "processing_time_ms": file.metadata.processing_time_ms,
                    })
                );
            }
        }
        for failure in &report.failures {
            println!("{}", serde_json::to_string(failure)?);
        }
    } else {
        for (idx, file) in report.outputs.iter().enumerate() {
            for (table, stats) in file.final_tables.iter().zip(&file.statistics) {
                println!(
                    "[{}/{}] {}: {} timestamps, most frequent={} time={:.2}ms -> {}",
                    idx + 1,
                    total,
                    file.source.display(),
                    stats.total_timestamps,
                    stats.most_frequent().unwrap_or("-"),
                    file.metadata.processing_time_ms,
                    table.display()
                );
            }
        }
        for failure in &report.failures {
            println!("{}: ERROR: {}", failure.source.display(), failure.error);
        }
    }

    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        report.outputs.len(),
        total,
        t0.elapsed().as_secs_f64() * 1000.0
    );

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
