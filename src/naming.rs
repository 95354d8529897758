/**
 * Destination path planning and collision handling
 *
 * Target layout: <dest>/<YYYY>/<MM>/<basename>
 * Collisions get _1, _2, ... suffixes before the extension, counting up
 * until a name is free both on disk and in the current run.
 */

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Compute the final destination path for a source file.
///
/// The candidate is `<dest_root>/<year zero-padded to 4>/<month zero-padded
/// to 2>/<basename>`. If the candidate collides with a pre-existing file or
/// with a path already claimed earlier in this run, a numeric suffix is
/// appended before the extension until a free name is found. The counter
/// starts at 1 and is scoped to the (directory, stem, extension) triple.
///
/// One exception: a candidate that *is* the source file (the file already
/// sits at its own destination) is returned unchanged so the caller can
/// record a skip instead of fabricating a pointless `_1` copy.
///
/// `claimed` is owned by the orchestrator; it is the set of paths assigned
/// to earlier entries in the same run, which keeps the final destinations
/// injective even before anything is written.
pub fn plan_destination(
    dest_root: &Path,
    year: i32,
    month: u32,
    source: &Path,
    claimed: &HashSet<PathBuf>,
) -> PathBuf {
    let bucket = dest_root
        .join(format!("{:04}", year))
        .join(format!("{:02}", month));

    let basename = source.file_name().unwrap_or_default();
    let candidate = bucket.join(basename);

    if candidate == source {
        return candidate;
    }
    if !candidate.exists() && !claimed.contains(&candidate) {
        return candidate;
    }

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let extension = source.extension().and_then(|e| e.to_str());

    let mut counter = 1;
    loop {
        let name = match extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let numbered = bucket.join(name);
        if !numbered.exists() && !claimed.contains(&numbered) {
            return numbered;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn claimed() -> HashSet<PathBuf> {
        HashSet::new()
    }

    #[test]
    fn test_free_candidate_is_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();

        let path = plan_destination(dest, 2024, 3, Path::new("/src/photo.jpg"), &claimed());
        assert_eq!(path, dest.join("2024").join("03").join("photo.jpg"));
    }

    #[test]
    fn test_month_and_year_are_zero_padded() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();

        let path = plan_destination(dest, 987, 5, Path::new("/src/a.txt"), &claimed());
        assert_eq!(path, dest.join("0987").join("05").join("a.txt"));
    }

    #[test]
    fn test_filesystem_collision_gets_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();
        let bucket = dest.join("2024").join("01");
        fs::create_dir_all(&bucket).unwrap();
        fs::write(bucket.join("a.jpg"), b"existing").unwrap();

        let path = plan_destination(dest, 2024, 1, Path::new("/src/a.jpg"), &claimed());
        assert_eq!(path, bucket.join("a_1.jpg"));
    }

    #[test]
    fn test_counter_skips_taken_suffixes() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();
        let bucket = dest.join("2024").join("01");
        fs::create_dir_all(&bucket).unwrap();
        fs::write(bucket.join("a.jpg"), b"x").unwrap();
        fs::write(bucket.join("a_1.jpg"), b"x").unwrap();
        fs::write(bucket.join("a_2.jpg"), b"x").unwrap();

        let path = plan_destination(dest, 2024, 1, Path::new("/src/a.jpg"), &claimed());
        assert_eq!(path, bucket.join("a_3.jpg"));
    }

    #[test]
    fn test_claimed_paths_collide_like_files() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();
        let bucket = dest.join("2024").join("01");

        let mut claimed = claimed();
        claimed.insert(bucket.join("a.jpg"));
        claimed.insert(bucket.join("a_1.jpg"));

        let path = plan_destination(dest, 2024, 1, Path::new("/one/a.jpg"), &claimed);
        assert_eq!(path, bucket.join("a_2.jpg"));
    }

    #[test]
    fn test_destinations_are_injective_within_a_run() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();

        let mut claimed = claimed();
        let sources = ["/one/a.jpg", "/two/a.jpg", "/three/a.jpg"];
        for source in sources {
            let path = plan_destination(dest, 2024, 1, Path::new(source), &claimed);
            assert!(claimed.insert(path), "duplicate destination assigned");
        }
        assert_eq!(claimed.len(), sources.len());
    }

    #[test]
    fn test_self_no_op_returns_source_path() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();
        let bucket = dest.join("2024").join("01");
        fs::create_dir_all(&bucket).unwrap();
        let already_there = bucket.join("a.jpg");
        fs::write(&already_there, b"x").unwrap();

        let path = plan_destination(dest, 2024, 1, &already_there, &claimed());
        assert_eq!(path, already_there);
    }

    #[test]
    fn test_extensionless_files_suffix_after_name() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path();
        let bucket = dest.join("2024").join("01");
        fs::create_dir_all(&bucket).unwrap();
        fs::write(bucket.join("README"), b"x").unwrap();

        let path = plan_destination(dest, 2024, 1, Path::new("/src/README"), &claimed());
        assert_eq!(path, bucket.join("README_1"));
    }
}
