/**
 * Disk-space queries for the pre-flight check
 */

use std::io;
use std::path::Path;

/// Free space available to unprivileged writes at `path`, in bytes.
///
/// The path must exist; the orchestrator queries the destination root once
/// right before execution. On platforms without `statvfs` the query fails
/// with `Unsupported` and the caller downgrades the check to a warning.
#[cfg(unix)]
pub fn available_space(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::mem;
    use std::os::unix::ffi::OsStrExt;

    let path_cstr = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains null byte"))?;

    let mut stat: libc::statvfs = unsafe { mem::zeroed() };
    let result = unsafe { libc::statvfs(path_cstr.as_ptr(), &mut stat) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(stat.f_bavail as u64 * stat.f_frsize as u64)
}

#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "free-space query not supported on this platform",
    ))
}

/// Whether two paths live on the same filesystem volume.
///
/// A move within one volume is a rename and needs no extra space; a move
/// across volumes degrades to copy+delete and transiently needs the full
/// source size. Where the device id cannot be read the answer is `false`,
/// which errs toward over-reserving.
#[cfg(unix)]
pub fn same_device(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (a.metadata(), b.metadata()) {
        (Ok(meta_a), Ok(meta_b)) => meta_a.dev() == meta_b.dev(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub fn same_device(_a: &Path, _b: &Path) -> bool {
    false
}

/// Render a byte count as a short human-readable string.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    #[cfg(unix)]
    fn test_available_space_on_existing_path() {
        let temp_dir = TempDir::new().unwrap();
        let available = available_space(temp_dir.path()).unwrap();
        assert!(available > 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_available_space_missing_path_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(available_space(&missing).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_same_device_for_siblings() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"y").unwrap();

        assert!(same_device(&a, &b));
    }

    #[test]
    fn test_same_device_missing_path_is_conservative() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(!same_device(&missing, temp_dir.path()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(15 * 1024 * 1024), "15.0 MB");
        assert_eq!(format_size(7_200_000_000), "6.7 GB");
    }
}
