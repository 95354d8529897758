use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use log::info;
use std::path::PathBuf;

use datesort::error::OrganizeError;
use datesort::file_ops::{Action, Outcome};
use datesort::organizer::{Config, Organizer, Plan, RunReport, RunStatus};
use datesort::space::format_size;
use datesort::timestamp::DateMode;

#[derive(Parser)]
#[command(name = "datesort")]
#[command(version)]
#[command(about = "Organize files into YYYY/MM directories by date")]
#[command(long_about = "Recursively scans a source directory and relocates every file into a \
destination tree bucketed by year and month, derived from the file's creation or modification \
date.

Runs are dry by default: nothing is touched until --execute is given. Name collisions at the \
destination are resolved with _1, _2, ... suffixes, and copy runs are preceded by a disk-space \
check.

Output layout: <destination>/YYYY/MM/<filename>")]
struct Cli {
    /// Source directory to scan recursively
    #[arg(short, long)]
    source: PathBuf,

    /// Destination directory for organized files (created if absent)
    #[arg(short, long)]
    destination: PathBuf,

    /// Actually relocate files (default is a dry run)
    #[arg(short, long)]
    execute: bool,

    /// Preview only, even if --execute is also given
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Copy files instead of moving them (originals are preserved)
    #[arg(short, long)]
    copy: bool,

    /// Which timestamp drives the year/month bucketing
    #[arg(long, value_enum, default_value = "created")]
    date: DateMode,

    /// Skip the confirmation prompt and proceed automatically
    #[arg(short = 'y', long)]
    yes: bool,

    /// Number of parallel workers for the relocation phase
    #[arg(short, long)]
    workers: Option<usize>,

    /// Increase verbosity (-v=INFO, -vv=DEBUG, -vvv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    let execute = cli.execute && !cli.dry_run;
    let action = if cli.copy { Action::Copy } else { Action::Move };

    if !execute {
        println!(
            "Running in DRY RUN mode. Use --execute to actually {} files.",
            action.verb()
        );
    }

    let config = Config {
        source: cli.source,
        destination: cli.destination,
        execute,
        action,
        date_mode: cli.date,
        skip_confirm: cli.yes,
        workers: cli.workers,
    };

    info!("Starting datesort");

    let organizer = Organizer::new(config);
    let report = match organizer.run(|plan| confirm_operation(organizer.config(), plan)) {
        Ok(report) => report,
        Err(OrganizeError::InsufficientSpace {
            required,
            available,
        }) => {
            eprintln!("Insufficient disk space!");
            eprintln!("  Required:  {}", format_size(required));
            eprintln!("  Available: {}", format_size(available));
            eprintln!("  Shortfall: {}", format_size(required - available));
            eprintln!("Free up space on the destination drive, use a different destination, or use move mode.");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&report);

    // Individual failures are listed above but only a run where every file
    // failed flips the exit status.
    if report.total_found > 0 && report.failed == report.total_found {
        anyhow::bail!("all {} files failed", report.failed);
    }

    Ok(())
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    Ok(())
}

/// Print the operation summary and ask the user to proceed.
///
/// A read error (closed stdin, Ctrl-C) counts as a decline.
fn confirm_operation(config: &Config, plan: &Plan) -> bool {
    println!("\nOperation: {}", config.action.as_str());
    println!("Source: {}", config.source.display());
    println!("Destination: {}", config.destination.display());
    println!("Files to process: {}", plan.files.len());
    println!("Total size: {}", format_size(plan.total_bytes()));
    match config.action {
        Action::Copy => println!("Mode: copy files (originals will be preserved)"),
        Action::Move => println!("Mode: move files (originals will be relocated)"),
    }
    println!("Files will be organized into: destination/YYYY/MM/");

    Confirm::new()
        .with_prompt("Do you want to proceed?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn print_report(report: &RunReport) {
    let status = match report.status {
        RunStatus::DryRun => "DRY RUN",
        RunStatus::Completed => "COMPLETED",
        RunStatus::Cancelled => "CANCELLED",
    };

    println!("\nOperation summary");
    println!("Status: {}", status);
    println!("Operation: {}", report.action.as_str());
    println!("Date mode: {}", report.date_mode.as_str());
    println!("Source: {}", report.source.display());
    println!("Destination: {}", report.destination.display());
    println!("Total files found: {}", report.total_found);
    println!("Processed: {}", report.processed);
    println!("Skipped: {}", report.skipped);
    println!("Failed: {}", report.failed);
    println!("Total size: {}", format_size(report.total_bytes));

    let counts = report.category_counts();
    if !counts.is_empty() {
        println!("By category:");
        for (category, count) in counts {
            println!("  {}: {}", category.as_str(), count);
        }
    }

    if report.failed > 0 {
        println!("\nFailures:");
        for failure in report.failures() {
            if let Outcome::Failed(reason) = &failure.outcome {
                println!("  {}: {}", failure.source.display(), reason);
            }
        }
    }

    if report.status == RunStatus::DryRun {
        println!(
            "\nThis was a dry run. Use --execute to actually {} files.",
            report.action.verb()
        );
    }
}
