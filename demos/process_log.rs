//! Example: Process a single Action Unit log
//!
//! Usage:
//!   cargo run --example process_log -- <input.csv> [-o DIR] [-t THRESHOLD] [-s] [-v] [--intermediates]
//!
//! Writes the sanitized copy, the final table(s) and their statistics JSON to
//! the output directory, then prints the statistics of each table.

use au_emotion::{process_file, OutputConfig, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;

/// Turn a facial Action Unit log into a per-second emotion table
#[derive(Debug, Parser)]
#[command(name = "process_log", version)]
struct Args {
    /// Raw log file (Time,Expression,Weight)
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Neutrality threshold in [0, 1] (default: 0.2, or the config file's value)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Write one table per task instead of one combined table
    #[arg(short, long)]
    split_tasks: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Also write aggregated and per-emotion tables
    #[arg(long)]
    intermediates: bool,

    /// Pipeline configuration JSON (command-line flags override it)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if !args.input.exists() {
        eprintln!("ERROR: {} does not exist", args.input.display());
        std::process::exit(2);
    }

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    }
    .with_overrides(args.threshold, args.split_tasks)?;

    let output = OutputConfig {
        write_intermediates: args.intermediates,
        ..OutputConfig::in_dir(&args.output_dir)
    };

    log::info!("Threshold: {}", config.threshold);
    log::info!("Split tasks: {}", config.split_tasks);
    log::info!("Output directory: {}", output.output_dir.display());

    let result = process_file(&args.input, &config, &output)?;

    if result.final_tables.is_empty() {
        eprintln!("No task with data rows; no table was written.");
        return Ok(());
    }

    println!("Processing completed successfully!");
    println!(
        "{} table(s) written to {}:",
        result.final_tables.len(),
        output.output_dir.display()
    );
    for (path, stats) in result.final_tables.iter().zip(&result.statistics) {
        println!("\n- {}", path.display());
        println!("{}", stats);
    }

    for warning in result.metadata.warnings() {
        println!("\nNote: {}", warning);
    }
    println!(
        "\nProcessing time: {:.2} ms",
        result.metadata.processing_time_ms
    );

    Ok(())
}
