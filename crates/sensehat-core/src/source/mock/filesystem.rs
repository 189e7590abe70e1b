//! In-memory mock filesystem for testing sources without real `/proc` or `/sys`.

use crate::source::traits::{FileSystem, FsUsage};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files, directories and mount capacities in memory, so tests can
/// simulate a Pi with or without a Sense HAT attached.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Capacity reported by `statvfs`, keyed by mount point.
    mounts: HashMap<PathBuf, FsUsage>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Removes a file, leaving its directory in place.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Registers a mount point with the given capacity.
    pub fn add_mount(&mut self, mount_point: impl AsRef<Path>, usage: FsUsage) {
        let mount_point = mount_point.as_ref().to_path_buf();
        self.add_dir(&mount_point);
        self.mounts.insert(mount_point, usage);
    }

    /// Adds an IIO device directory with a `name` file and channel files.
    ///
    /// # Arguments
    /// * `sys_path` - Base path to sysfs (usually "/sys")
    /// * `index` - Device index (`iio:device<index>`)
    /// * `name` - Driver name reported by the device
    /// * `channels` - `(file name, content)` pairs, e.g. `("in_temp_raw", "2450")`
    pub fn add_iio_device(
        &mut self,
        sys_path: &str,
        index: u32,
        name: &str,
        channels: &[(&str, &str)],
    ) {
        let base = PathBuf::from(format!("{}/bus/iio/devices/iio:device{}", sys_path, index));
        self.add_dir(&base);
        self.add_file(base.join("name"), format!("{}\n", name));
        for (file, content) in channels {
            self.add_file(base.join(file), format!("{}\n", content));
        }
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    fn statvfs(&self, path: &Path) -> io::Result<FsUsage> {
        if !self.exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("path not found: {:?}", path),
            ));
        }

        // Nearest registered mount point at or above `path`.
        path.ancestors()
            .find_map(|p| self.mounts.get(p).copied())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("no mount for {:?}", path),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 16384 kB\n");

        assert!(fs.exists(Path::new("/proc/meminfo")));
        assert!(fs.exists(Path::new("/proc")));

        let content = fs.read_to_string(Path::new("/proc/meminfo")).unwrap();
        assert_eq!(content, "MemTotal: 16384 kB\n");
    }

    #[test]
    fn test_mock_fs_remove_file() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/thermal/thermal_zone0/temp", "48312\n");
        fs.remove_file("/sys/class/thermal/thermal_zone0/temp");

        assert!(!fs.exists(Path::new("/sys/class/thermal/thermal_zone0/temp")));
        assert!(fs.exists(Path::new("/sys/class/thermal/thermal_zone0")));
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/stat", "stat content");
        fs.add_file("/proc/1/status", "status content");
        fs.add_file("/proc/2/stat", "stat content 2");

        let proc_entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert_eq!(proc_entries.len(), 2); // /proc/1 and /proc/2

        let proc1_entries = fs.read_dir(Path::new("/proc/1")).unwrap();
        assert_eq!(proc1_entries.len(), 2); // stat and status
    }

    #[test]
    fn test_mock_fs_add_iio_device() {
        let mut fs = MockFs::new();
        fs.add_iio_device("/sys", 0, "hts221", &[("in_temp_raw", "2450")]);

        let base = Path::new("/sys/bus/iio/devices/iio:device0");
        assert_eq!(fs.read_to_string(&base.join("name")).unwrap(), "hts221\n");
        assert_eq!(
            fs.read_to_string(&base.join("in_temp_raw")).unwrap(),
            "2450\n"
        );
        let devices = fs.read_dir(Path::new("/sys/bus/iio/devices")).unwrap();
        assert_eq!(devices, vec![base.to_path_buf()]);
    }

    #[test]
    fn test_mock_fs_statvfs_nearest_mount() {
        let mut fs = MockFs::new();
        let root = FsUsage {
            total: 100,
            free: 50,
            available: 40,
        };
        let boot = FsUsage {
            total: 10,
            free: 5,
            available: 5,
        };
        fs.add_mount("/", root);
        fs.add_mount("/boot", boot);
        fs.add_dir("/var/log");

        assert_eq!(fs.statvfs(Path::new("/")).unwrap(), root);
        assert_eq!(fs.statvfs(Path::new("/var/log")).unwrap(), root);
        assert_eq!(fs.statvfs(Path::new("/boot")).unwrap(), boot);
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(fs.statvfs(Path::new("/nonexistent")).is_err());
    }
}
