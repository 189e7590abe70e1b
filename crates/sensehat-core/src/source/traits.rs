//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the sources read the real `/proc` and `/sys`
//! trees on a Raspberry Pi, or an in-memory mock in tests and CI.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Capacity figures of a mounted filesystem, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsUsage {
    /// Total size (`f_blocks * f_frsize`).
    pub total: u64,
    /// Free blocks including those reserved for root (`f_bfree`).
    pub free: u64,
    /// Free blocks available to unprivileged users (`f_bavail`).
    pub available: u64,
}

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Reports capacity of the filesystem containing `path`.
    fn statvfs(&self, path: &Path) -> io::Result<FsUsage>;
}

/// Real filesystem implementation that delegates to `std::fs` and `libc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn statvfs(&self, path: &Path) -> io::Result<FsUsage> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: `c_path` is a valid NUL-terminated string and `stat` is a
        // plain C struct fully written by a successful call.
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }

        let block_size = stat.f_frsize as u64;
        Ok(FsUsage {
            total: stat.f_blocks as u64 * block_size,
            free: stat.f_bfree as u64 * block_size,
            available: stat.f_bavail as u64 * block_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_fs_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "48312\n").unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read_to_string(&path).unwrap(), "48312\n");
    }

    #[test]
    fn test_real_fs_exists() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        assert!(fs.exists(dir.path()));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();

        let fs = RealFs::new();
        let mut entries = fs.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries, vec![dir.path().join("a"), dir.path().join("b")]);
    }

    #[test]
    fn test_real_fs_statvfs() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        let usage = fs.statvfs(dir.path()).unwrap();
        assert!(usage.total > 0);
        assert!(usage.free <= usage.total);
        assert!(usage.available <= usage.free);
    }

    #[test]
    fn test_real_fs_statvfs_missing_path() {
        let fs = RealFs::new();
        assert!(fs.statvfs(Path::new("/nonexistent/path/12345")).is_err());
    }
}
