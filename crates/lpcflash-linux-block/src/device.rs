//! Linux block device host

use crate::error::{LinuxBlockError, Result};
use log::{debug, trace};
use lpcflash_core::device::{BlockDevice, DeviceHost, DevicePath};
use nix::unistd::{access, AccessFlags};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

/// Sysfs root for block devices
const BLOCK_SYSFS_ROOT: &str = "/sys/class/block";

/// Sysfs reports sizes in 512-byte sectors regardless of the logical block size
const SYSFS_SECTOR_SIZE: u64 = 512;

/// Information about a block device read from sysfs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// Kernel name, e.g. `sda`
    pub name: String,
    /// Total size in bytes
    pub size: u64,
    /// Whether the kernel flags the media as removable
    pub removable: bool,
    /// Vendor string, if the device reports one
    pub vendor: Option<String>,
    /// Model string, if the device reports one
    pub model: Option<String>,
}

/// Device host backed by the real filesystem
///
/// Existence checks use `access(F_OK)`, so dangling or permission-restricted
/// nodes still count as present, and devices are opened read-write.
///
/// # Example
///
/// ```ignore
/// use lpcflash_core::DeviceLocator;
/// use lpcflash_linux_block::LinuxBlockHost;
///
/// let host = LinuxBlockHost::new();
/// if let Some(path) = DeviceLocator::new("/dev/block/sd").locate_path(&host) {
///     let info = host.block_info(&path)?;
///     println!("{} ({} bytes)", path, info.size);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LinuxBlockHost {
    sysfs_root: PathBuf,
}

impl Default for LinuxBlockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxBlockHost {
    /// Host using the system sysfs
    pub fn new() -> Self {
        Self::with_sysfs_root(BLOCK_SYSFS_ROOT)
    }

    /// Host reading block device attributes below `root` instead of `/sys/class/block`
    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
        }
    }

    /// Read sysfs information for a located device
    pub fn block_info(&self, device: &DevicePath) -> Result<BlockInfo> {
        let name = device
            .node_name()
            .ok_or_else(|| LinuxBlockError::NotABlockDevice(device.to_string()))?;
        let sysfs_path = self.sysfs_root.join(name);
        if !sysfs_path.exists() {
            return Err(LinuxBlockError::NotABlockDevice(name.to_string()));
        }

        let sectors = read_sysfs_int(&sysfs_path, "size")?;
        let removable = read_sysfs_int(&sysfs_path, "removable").unwrap_or(0) != 0;
        let vendor = read_sysfs_optional(&sysfs_path, "device/vendor");
        let model = read_sysfs_optional(&sysfs_path, "device/model");

        let info = BlockInfo {
            name: name.to_string(),
            size: sectors * SYSFS_SECTOR_SIZE,
            removable,
            vendor,
            model,
        };
        debug!(
            "{}: size={}, removable={}, vendor={:?}, model={:?}",
            info.name, info.size, info.removable, info.vendor, info.model
        );
        Ok(info)
    }
}

impl DeviceHost for LinuxBlockHost {
    fn node_exists(&self, path: &Path) -> bool {
        let exists = access(path, AccessFlags::F_OK).is_ok();
        trace!("access({}, F_OK) = {}", path.display(), exists);
        exists
    }

    fn open_device(&self, path: &Path) -> io::Result<Box<dyn BlockDevice>> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Box::new(file))
    }
}

/// Read a string from a sysfs file and sanitize it
fn read_sysfs_string(sysfs_path: &Path, filename: &str) -> Result<String> {
    let path = sysfs_path.join(filename);
    let content = std::fs::read_to_string(&path).map_err(|e| LinuxBlockError::SysfsRead {
        path: path.display().to_string(),
        source: e,
    })?;

    // Sanitize: remove non-printable characters and trailing whitespace
    let sanitized: String = content
        .chars()
        .take_while(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    Ok(sanitized.trim_end().to_string())
}

/// Read an integer from a sysfs file
fn read_sysfs_int(sysfs_path: &Path, filename: &str) -> Result<u64> {
    let value_str = read_sysfs_string(sysfs_path, filename)?;
    value_str
        .parse::<u64>()
        .map_err(|_| LinuxBlockError::SysfsParse {
            path: sysfs_path.join(filename).display().to_string(),
            value: value_str,
        })
}

/// Read an optional descriptive attribute; missing or blank reads as `None`
fn read_sysfs_optional(sysfs_path: &Path, filename: &str) -> Option<String> {
    read_sysfs_string(sysfs_path, filename)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpcflash_core::{DeviceLocator, DeviceSuffix};
    use std::fs;
    use std::io::{Read, Seek, SeekFrom, Write};

    fn fake_sysfs(root: &Path, name: &str, sectors: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("device")).unwrap();
        fs::write(dir.join("size"), sectors).unwrap();
        dir
    }

    #[test]
    fn test_block_info() {
        let sysfs = tempfile::tempdir().unwrap();
        let dir = fake_sysfs(sysfs.path(), "sdb", "128\n");
        fs::write(dir.join("removable"), "1\n").unwrap();
        fs::write(dir.join("device/vendor"), "NXP     \n").unwrap();
        fs::write(dir.join("device/model"), "LPC1XXX IFLASH  \n").unwrap();

        let host = LinuxBlockHost::with_sysfs_root(sysfs.path());
        let path = DevicePath::new("/dev/block/sd", DeviceSuffix::new('b').unwrap());
        let info = host.block_info(&path).unwrap();

        assert_eq!(info.name, "sdb");
        assert_eq!(info.size, 128 * 512);
        assert!(info.removable);
        assert_eq!(info.vendor.as_deref(), Some("NXP"));
        assert_eq!(info.model.as_deref(), Some("LPC1XXX IFLASH"));
    }

    #[test]
    fn test_block_info_minimal() {
        let sysfs = tempfile::tempdir().unwrap();
        fake_sysfs(sysfs.path(), "sda", "2048");

        let host = LinuxBlockHost::with_sysfs_root(sysfs.path());
        let path = DevicePath::new("/dev/block/sd", DeviceSuffix::FIRST);
        let info = host.block_info(&path).unwrap();

        assert_eq!(info.size, 2048 * 512);
        assert!(!info.removable);
        assert_eq!(info.vendor, None);
        assert_eq!(info.model, None);
    }

    #[test]
    fn test_block_info_errors() {
        let sysfs = tempfile::tempdir().unwrap();
        let host = LinuxBlockHost::with_sysfs_root(sysfs.path());
        let path = DevicePath::new("/dev/block/sd", DeviceSuffix::FIRST);
        assert!(matches!(
            host.block_info(&path),
            Err(LinuxBlockError::NotABlockDevice(_))
        ));

        fake_sysfs(sysfs.path(), "sda", "lots");
        assert!(matches!(
            host.block_info(&path),
            Err(LinuxBlockError::SysfsParse { .. })
        ));
    }

    #[test]
    fn test_locates_and_opens_regular_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/sd", dir.path().display());
        fs::write(format!("{}c", prefix), vec![0u8; 4096]).unwrap();
        fs::write(format!("{}d", prefix), vec![0u8; 4096]).unwrap();

        let host = LinuxBlockHost::new();
        let path = DeviceLocator::new(prefix).locate_path(&host).unwrap();
        assert_eq!(path.suffix().letter(), 'c');

        let mut dev = host.open_device(path.as_path()).unwrap();
        assert_eq!(dev.capacity(), None);
        dev.seek(SeekFrom::Start(2048)).unwrap();
        dev.write_all(b"firmware").unwrap();
        dev.sync().unwrap();
        drop(dev);

        let mut contents = Vec::new();
        fs::File::open(path.as_path())
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(&contents[2048..2056], b"firmware");
    }

    #[test]
    fn test_open_missing_node() {
        let dir = tempfile::tempdir().unwrap();
        let host = LinuxBlockHost::new();
        let missing = dir.path().join("sda");
        assert!(!host.node_exists(&missing));
        let err = host.open_device(&missing).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_dir_exists_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let host = LinuxBlockHost::new();
        let file = dir.path().join("nfc");
        fs::write(&file, "").unwrap();

        assert!(host.node_exists(&file));
        assert!(!host.dir_exists(&file));
        assert!(host.dir_exists(dir.path()));
    }
}
