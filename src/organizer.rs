/**
 * Run orchestration: scan the source tree, plan destinations, check space,
 * confirm, relocate, report
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

use crate::classify::{self, Category};
use crate::error::{OrganizeError, Result};
use crate::file_ops::{self, Action, Outcome};
use crate::naming;
use crate::space;
use crate::timestamp::{self, DateMode};

/// One run's settings, supplied once at invocation and read-only throughout.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Relocate for real; false is a dry run that mutates nothing.
    pub execute: bool,
    pub action: Action,
    pub date_mode: DateMode,
    /// Proceed without asking the confirmation callback.
    pub skip_confirm: bool,
    /// Worker threads for the relocation phase. None uses the default pool.
    pub workers: Option<usize>,
}

/// A file discovered during the scan, with everything needed to place it.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
    pub category: Category,
    pub year: i32,
    pub month: u32,
}

/// A scan entry with its finalized destination.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub entry: FileEntry,
    pub destination: PathBuf,
    pub action: Action,
}

/// The full set of relocations for one run, plus files already ruled out
/// during scanning and planning. Built once, never mutated afterward.
#[derive(Debug)]
pub struct Plan {
    pub files: Vec<PlannedFile>,
    pub skipped: Vec<FileOutcome>,
}

impl Plan {
    pub fn total_found(&self) -> usize {
        self.files.len() + self.skipped.len()
    }

    /// Bytes of payload the run intends to relocate.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|p| p.entry.size).sum()
    }

    /// Bytes the destination volume must have free before execution.
    ///
    /// Copies need their full size. Moves within the destination volume are
    /// renames and need none; moves crossing a volume boundary degrade to
    /// copy+delete and are counted in full.
    pub fn required_bytes(&self, dest_root: &Path) -> u64 {
        self.files
            .iter()
            .map(|p| match p.action {
                Action::Copy => p.entry.size,
                Action::Move => {
                    if space::same_device(&p.entry.path, dest_root) {
                        0
                    } else {
                        p.entry.size
                    }
                }
            })
            .sum()
    }
}

/// Where a file ended up, and why, for the run report.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub category: Category,
    pub outcome: Outcome,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Planned only; nothing was written.
    DryRun,
    /// Execution finished (individual files may still have failed).
    Completed,
    /// Confirmation was declined; nothing was written.
    Cancelled,
}

/// Aggregate result of one run.
///
/// Every discovered file is accounted for in exactly one of
/// processed/skipped/failed; nothing is dropped silently.
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    pub action: Action,
    pub date_mode: DateMode,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub total_found: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_bytes: u64,
    pub outcomes: Vec<FileOutcome>,
}

impl RunReport {
    fn new(
        status: RunStatus,
        config: &Config,
        total_found: usize,
        total_bytes: u64,
        outcomes: Vec<FileOutcome>,
    ) -> Self {
        let processed = outcomes.iter().filter(|o| o.outcome.is_processed()).count();
        let skipped = outcomes.iter().filter(|o| o.outcome.is_skipped()).count();
        let failed = outcomes.iter().filter(|o| o.outcome.is_failed()).count();

        Self {
            status,
            action: config.action,
            date_mode: config.date_mode,
            source: config.source.clone(),
            destination: config.destination.clone(),
            total_found,
            processed,
            skipped,
            failed,
            total_bytes,
            outcomes,
        }
    }

    /// Non-zero per-category tallies, in display order.
    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .iter()
            .map(|category| {
                let count = self
                    .outcomes
                    .iter()
                    .filter(|o| o.category == *category)
                    .count();
                (*category, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_failed())
    }
}

pub struct Organizer {
    config: Config,
}

impl Organizer {
    pub fn new(config: Config) -> Self {
        if let Some(worker_count) = config.workers {
            // Relocation is I/O bound; cap at half the cores like any other
            // disk-heavy pool.
            let optimal_threads = std::cmp::min(worker_count, (num_cpus::get() / 2).max(1)).max(1);

            info!(
                "Configuring thread pool with {} threads (requested: {}, CPUs: {})",
                optimal_threads,
                worker_count,
                num_cpus::get()
            );

            ThreadPoolBuilder::new()
                .num_threads(optimal_threads)
                .thread_name(|i| format!("datesort-worker-{}", i))
                .build_global()
                .unwrap_or_else(|_| {
                    warn!("Thread pool already configured, using existing pool");
                });
        }

        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline: scan, plan, and either report (dry run) or check
    /// space, confirm, and execute.
    ///
    /// `confirm` is consulted only for execute runs without `skip_confirm`;
    /// the library never reads a terminal itself. Declining yields a
    /// `Cancelled` report with no files touched.
    pub fn run<F>(&self, confirm: F) -> Result<RunReport>
    where
        F: FnOnce(&Plan) -> bool,
    {
        let config = &self.config;

        if !config.source.is_dir() {
            return Err(OrganizeError::SourceNotFound(config.source.clone()));
        }

        info!(
            "Scanning {} (mode: {}, date: {})",
            config.source.display(),
            config.action.as_str(),
            config.date_mode.as_str()
        );

        let plan = self.build_plan(self.scan());
        info!(
            "Found {} files: {} to {}, {} skipped",
            plan.total_found(),
            plan.files.len(),
            config.action.verb(),
            plan.skipped.len()
        );

        let total_found = plan.total_found();
        let total_bytes = plan.total_bytes();

        if !config.execute {
            return Ok(self.dry_run_report(plan, total_found, total_bytes));
        }

        // The destination root is an input precondition (created if absent);
        // everything below it is created lazily during execution.
        fs::create_dir_all(&config.destination).map_err(|e| {
            OrganizeError::DestinationUnavailable {
                path: config.destination.clone(),
                source: e,
            }
        })?;

        self.check_space(&plan)?;

        if !config.skip_confirm && !confirm(&plan) {
            info!("Cancelled before execution, no files were touched");
            return Ok(RunReport::new(
                RunStatus::Cancelled,
                config,
                total_found,
                total_bytes,
                plan.skipped,
            ));
        }

        let outcomes = self.execute(plan);
        Ok(RunReport::new(
            RunStatus::Completed,
            config,
            total_found,
            total_bytes,
            outcomes,
        ))
    }

    /// Walk the source tree and stat every regular file.
    ///
    /// The walk materializes fully before anything is relocated, so files
    /// moved during execution are never rediscovered. Files that cannot be
    /// stat-ed are carried along as skips, not dropped.
    fn scan(&self) -> (Vec<FileEntry>, Vec<FileOutcome>) {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(&self.config.source) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path().to_path_buf();
            let extension = classify::extension_of(&path);
            let category = classify::classify(&extension);

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    skipped.push(FileOutcome {
                        source: path,
                        destination: None,
                        category,
                        outcome: Outcome::Skipped(format!("unreadable: {}", e)),
                    });
                    continue;
                }
            };

            let (year, month) = match timestamp::resolve_date(&path, self.config.date_mode) {
                Ok(date) => date,
                Err(e) => {
                    skipped.push(FileOutcome {
                        source: path,
                        destination: None,
                        category,
                        outcome: Outcome::Skipped(format!("unreadable: {}", e)),
                    });
                    continue;
                }
            };

            entries.push(FileEntry {
                path,
                size,
                extension,
                category,
                year,
                month,
            });
        }

        (entries, skipped)
    }

    /// Assign every scanned file its final destination, in traversal order.
    ///
    /// Planning is strictly sequential: the claimed-path set makes the
    /// assigned destinations injective before anything is written, so the
    /// execution phase can fan out freely.
    fn build_plan(&self, (entries, pre_skipped): (Vec<FileEntry>, Vec<FileOutcome>)) -> Plan {
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut files = Vec::new();
        let mut skipped = pre_skipped;

        for entry in entries {
            let destination = naming::plan_destination(
                &self.config.destination,
                entry.year,
                entry.month,
                &entry.path,
                &claimed,
            );

            if destination == entry.path {
                debug!("Already organized: {}", entry.path.display());
                skipped.push(FileOutcome {
                    source: entry.path,
                    destination: Some(destination),
                    category: entry.category,
                    outcome: Outcome::Skipped("already at destination".to_string()),
                });
                continue;
            }

            claimed.insert(destination.clone());
            files.push(PlannedFile {
                entry,
                destination,
                action: self.config.action,
            });
        }

        Plan { files, skipped }
    }

    fn check_space(&self, plan: &Plan) -> Result<()> {
        let required = plan.required_bytes(&self.config.destination);
        if required == 0 {
            return Ok(());
        }

        match space::available_space(&self.config.destination) {
            Ok(available) if available < required => Err(OrganizeError::InsufficientSpace {
                required,
                available,
            }),
            Ok(available) => {
                info!(
                    "Sufficient space: {} required, {} available",
                    space::format_size(required),
                    space::format_size(available)
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Could not check disk space for {}: {}; proceeding without the check",
                    self.config.destination.display(),
                    e
                );
                Ok(())
            }
        }
    }

    fn dry_run_report(&self, plan: Plan, total_found: usize, total_bytes: u64) -> RunReport {
        let mut outcomes = plan.skipped;
        for planned in plan.files {
            debug!(
                "[dry run] Would {}: {} -> {}",
                planned.action.verb(),
                planned.entry.path.display(),
                planned.destination.display()
            );
            outcomes.push(FileOutcome {
                source: planned.entry.path,
                destination: Some(planned.destination),
                category: planned.entry.category,
                outcome: Outcome::Planned,
            });
        }

        RunReport::new(
            RunStatus::DryRun,
            &self.config,
            total_found,
            total_bytes,
            outcomes,
        )
    }

    /// Relocate every planned file, in parallel.
    ///
    /// All destinations were finalized during sequential planning, so
    /// workers never contend over names; directory creation races are
    /// absorbed by `create_dir_all`. Outcome accumulation is the only
    /// shared state and sits behind a mutex.
    fn execute(&self, plan: Plan) -> Vec<FileOutcome> {
        let pb = ProgressBar::new(plan.files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1} files/s) ETA: {eta} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(match self.config.action {
            Action::Move => "Moving files",
            Action::Copy => "Copying files",
        });

        let pb = Arc::new(pb);
        let outcomes = Mutex::new(plan.skipped);

        plan.files.par_iter().for_each(|planned| {
            let outcome = file_ops::relocate(&planned.entry.path, &planned.destination, planned.action);
            if let Outcome::Failed(reason) = &outcome {
                warn!("{}: {}", planned.entry.path.display(), reason);
            }
            outcomes.lock().unwrap().push(FileOutcome {
                source: planned.entry.path.clone(),
                destination: Some(planned.destination.clone()),
                category: planned.entry.category,
                outcome,
            });
            pb.inc(1);
        });

        pb.finish_with_message("Relocation complete");
        outcomes.into_inner().unwrap()
    }
}
