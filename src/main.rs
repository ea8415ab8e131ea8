/// Signature Analyzer - identifies file types by their content
///
/// The main entry point for the application. It parses command-line arguments,
/// loads the signature database and classifies every file of a directory.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, LevelFilter};

use signature_analyzer::config::AnalyzerConfig;
use signature_analyzer::core::scheduler::{self, ClassificationResult, ClassificationScheduler};
use signature_analyzer::core::signatures::SignatureTable;
use signature_analyzer::utils::file_utils;
use signature_analyzer::utils::output_formatter::{self, Summary};

/// Command line argument structure
#[derive(Parser, Debug)]
#[command(
    name = "signature_analyzer",
    version,
    about = "Identifies file types by scanning file content for known signatures",
    long_about = "Every file in DIRECTORY is read and searched for the patterns of the
signature database SIGNATURES (one `name;pattern;type` record per line).
When several signatures match, the record whose line sorts last wins."
)]
struct Args {
    /// Directory containing the files to classify
    directory: PathBuf,

    /// Signature database file
    signatures: PathBuf,

    /// Number of parallel workers (0=auto, default: 10 or from config)
    #[arg(long = "workers")]
    workers: Option<usize>,

    /// Classify files in subdirectories too
    #[arg(long = "recursive", action = ArgAction::SetTrue)]
    recursive: bool,

    /// Exclude file pattern (glob syntax, can be used multiple times)
    #[arg(long = "exclude", action = ArgAction::Append)]
    exclude: Option<Vec<String>>,

    /// Include only file pattern (glob syntax, can be used multiple times)
    #[arg(long = "include", action = ArgAction::Append)]
    include: Option<Vec<String>>,

    /// Maximum file size to classify in MB
    #[arg(long = "max-size")]
    max_size: Option<u64>,

    /// Output in markdown format (wrapped in triple backticks)
    #[arg(long = "md", action = ArgAction::SetTrue)]
    md: bool,

    /// Export results to JSON file
    #[arg(long = "json")]
    json: Option<PathBuf>,

    /// Export results to CSV file
    #[arg(long = "csv")]
    csv: Option<PathBuf>,

    /// Suppress terminal output
    #[arg(long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Show only summary information
    #[arg(long = "summary-only", action = ArgAction::SetTrue)]
    summary_only: bool,

    /// Path to configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Set logging level (default: INFO)
    #[arg(long = "log-level", default_value = "info")]
    log_level: LevelFilter,

    /// Log file path (default: signature_analyzer.log)
    #[arg(long = "log-file", default_value = "signature_analyzer.log")]
    log_file: PathBuf,
}

/// Main entry point function
fn main() {
    let args = Args::parse();
    setup_logging(&args);

    match run(&args) {
        Ok(failed) if failed > 0 => process::exit(2),
        Ok(_) => {}
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Run the classification and report; returns the number of failed files
fn run(args: &Args) -> Result<usize> {
    // Record the start time
    let start_time = Instant::now();

    // Check the input paths
    file_utils::ensure_directory(&args.directory)?;
    file_utils::ensure_file(&args.signatures)?;

    // Load configuration
    let config = load_config(args);

    // The table must load cleanly before any file is scheduled.
    let signatures = SignatureTable::load(&args.signatures)?;
    let files = file_utils::list_files(&args.directory, &config.enumerate_options())?;

    // Classify all files
    let mut results = classify_files(files, &signatures, &config, args)?;
    scheduler::sort_by_path(&mut results);

    // Export results if requested
    export_all_results(&results, args)?;

    let summary = Summary::from_results(&results);
    info!(
        "{} files: {} identified, {} unknown, {} failed",
        summary.files, summary.identified, summary.unknown, summary.failed
    );

    // Print results to console if not in quiet mode
    if !args.quiet {
        if !args.summary_only {
            println!();
            print!("{}", output_formatter::format_results(&results, args.md));
        }

        println!("\n{}", "Classification Complete".bold());
        println!("{} {}", "Files classified:".green(), summary.files);
        println!("{} {}", "Identified:".green(), summary.identified);
        println!("{} {}", "Unknown:".green(), summary.unknown);
        if summary.failed > 0 {
            println!("{} {}", "Failed:".red(), summary.failed);
        }
        println!(
            "{} {:.3} seconds",
            "Time elapsed:".green(),
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(summary.failed)
}

/// Set up logging to the log file
fn setup_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    builder.filter_level(args.log_level);

    builder.format(|buf, record| {
        use chrono::Local;
        use std::io::Write;
        writeln!(
            buf,
            "{} - {} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    match File::create(&args.log_file) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => eprintln!(
            "Warning: cannot open log file {}: {}",
            args.log_file.display(),
            e
        ),
    }

    // Only fails if a logger is already installed.
    let _ = builder.try_init();
}

/// Merge the optional configuration file with command line overrides
fn load_config(args: &Args) -> AnalyzerConfig {
    let mut config = match &args.config {
        Some(path) => load_config_file(path),
        None => AnalyzerConfig::default(),
    };

    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.recursive {
        config.recursive = true;
    }
    if let Some(include) = &args.include {
        config.include = include.clone();
    }
    if let Some(exclude) = &args.exclude {
        config.exclude = exclude.clone();
    }
    if args.max_size.is_some() {
        config.max_size_mb = args.max_size;
    }

    config
}

fn load_config_file(path: &Path) -> AnalyzerConfig {
    match AnalyzerConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}; using defaults", e);
            AnalyzerConfig::default()
        }
    }
}

/// Classify files with progress tracking
fn classify_files(
    files: Vec<PathBuf>,
    signatures: &SignatureTable,
    config: &AnalyzerConfig,
    args: &Args,
) -> Result<Vec<ClassificationResult>> {
    let total_files = files.len();
    let workers = config.worker_count();

    if !args.quiet {
        println!(
            "{} {} files against {} signatures with {} workers...",
            "Classifying".bold(),
            total_files,
            signatures.len(),
            workers
        );
    }

    // Set up progress bar if not in quiet mode
    let progress_bar = if !args.quiet && total_files > 0 {
        let pb = ProgressBar::new(total_files as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    // Classify on the worker pool, ticking the bar as each file finishes
    let results = ClassificationScheduler::new(workers)
        .classify_all_with(files, signatures, |_| {
            if let Some(pb) = &progress_bar {
                pb.inc(1);
            }
        })
        .context("Classification failed")?;

    // Finish progress bar
    if let Some(pb) = progress_bar {
        pb.finish_with_message("Classification complete");
    }

    Ok(results)
}

/// Export results based on command line arguments
fn export_all_results(results: &[ClassificationResult], args: &Args) -> Result<()> {
    if let Some(json_path) = &args.json {
        output_formatter::export_results_json(results, json_path)?;
        info!("Wrote JSON report to {}", json_path.display());
    }

    if let Some(csv_path) = &args.csv {
        output_formatter::create_csv_report(results, csv_path)?;
        info!("Wrote CSV report to {}", csv_path.display());
    }

    Ok(())
}
