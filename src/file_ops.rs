/**
 * Relocation primitives: copying and moving single files into place
 */

use log::{debug, warn};
use std::fs;
use std::path::Path;

/// What to do with each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Relocate the file; the source is removed once the destination is
    /// confirmed written.
    Move,
    /// Duplicate the file; the source is left untouched.
    Copy,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Move => "MOVE",
            Action::Copy => "COPY",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Action::Move => "move",
            Action::Copy => "copy",
        }
    }
}

/// Per-file result of a relocation attempt.
///
/// A run never aborts on a single bad file; skips and failures are data,
/// accumulated into the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Moved,
    Copied,
    /// Recorded during dry runs for files that would have been relocated.
    Planned,
    Skipped(String),
    Failed(String),
}

impl Outcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, Outcome::Moved | Outcome::Copied | Outcome::Planned)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Copy or move one file to its final destination.
///
/// Missing ancestor directories are created first; `create_dir_all` is
/// idempotent, so concurrent entries targeting the same month bucket
/// cannot fail each other. A move is a rename when source and destination
/// share a volume, and the copy-then-delete fallback otherwise, so the
/// original survives any failure before the destination write completes.
pub fn relocate(source: &Path, destination: &Path, action: Action) -> Outcome {
    debug!(
        "Attempting {}: '{}' -> '{}'",
        action.verb(),
        source.display(),
        destination.display()
    );

    if source == destination {
        return Outcome::Skipped("already at destination".to_string());
    }

    // The plan was built from a scan that may be minutes old by now.
    if !source.exists() {
        warn!("Source vanished before relocation: {}", source.display());
        return Outcome::Skipped("unreadable: source no longer exists".to_string());
    }

    if let Some(parent) = destination.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            return Outcome::Failed(format!(
                "failed to create directory {}: {}",
                parent.display(),
                e
            ));
        }
    }

    match action {
        Action::Copy => match fs::copy(source, destination) {
            Ok(_) => Outcome::Copied,
            Err(e) => Outcome::Failed(format!("copy failed: {}", e)),
        },
        Action::Move => match fs::rename(source, destination) {
            Ok(_) => Outcome::Moved,
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                debug!("Cross-device move, using copy+delete strategy");
                if let Err(e) = fs::copy(source, destination) {
                    return Outcome::Failed(format!("copy failed: {}", e));
                }
                match fs::remove_file(source) {
                    Ok(_) => Outcome::Moved,
                    Err(e) => Outcome::Failed(format!(
                        "copied to destination but failed to remove original: {}",
                        e
                    )),
                }
            }
            Err(e) => Outcome::Failed(format!("move failed: {}", e)),
        },
    }
}
