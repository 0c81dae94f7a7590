//! Device naming and host access traits
//!
//! The bootloader shows up as `<prefix><letter>`, e.g. `/dev/block/sda`.
//! [`DevicePath`] builds that name, [`DeviceHost`] answers whether a node
//! exists and opens it, and [`BlockDevice`] is what an opened node must do.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Suffix letter of a device node, always in `'a'..='z'`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceSuffix(char);

impl DeviceSuffix {
    /// First suffix probed
    pub const FIRST: DeviceSuffix = DeviceSuffix('a');
    /// Last suffix probed
    pub const LAST: DeviceSuffix = DeviceSuffix('z');

    /// Create a suffix, returning `None` for anything outside `'a'..='z'`
    pub fn new(letter: char) -> Option<Self> {
        letter.is_ascii_lowercase().then_some(Self(letter))
    }

    /// The suffix letter
    pub fn letter(self) -> char {
        self.0
    }

    /// All suffixes in probe order
    pub fn all() -> impl Iterator<Item = DeviceSuffix> {
        ('a'..='z').map(DeviceSuffix)
    }
}

impl fmt::Display for DeviceSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full path of a candidate device node: a prefix followed by one suffix letter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DevicePath {
    path: PathBuf,
    suffix: DeviceSuffix,
}

impl DevicePath {
    /// Join `prefix` and `suffix` into a node path
    ///
    /// The join is textual (`"/dev/block/sd"` + `'a'`), not a path component
    /// join.
    pub fn new(prefix: &str, suffix: DeviceSuffix) -> Self {
        let mut name = String::with_capacity(prefix.len() + 1);
        name.push_str(prefix);
        name.push(suffix.letter());
        Self {
            path: PathBuf::from(name),
            suffix,
        }
    }

    /// Node path
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Suffix letter this path was built from
    pub fn suffix(&self) -> DeviceSuffix {
        self.suffix
    }

    /// Final path component, e.g. `sda`
    pub fn node_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

impl AsRef<Path> for DevicePath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// An opened device node
///
/// Dropping the handle closes it.
pub trait BlockDevice: Read + Write + Seek {
    /// Force written data to the device
    fn sync(&mut self) -> io::Result<()>;

    /// Size of the device in bytes, if known
    fn capacity(&mut self) -> Option<u64> {
        None
    }
}

impl BlockDevice for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    /// Only block devices report a capacity; a regular file grows on write.
    fn capacity(&mut self) -> Option<u64> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;

            let meta = self.metadata().ok()?;
            if !meta.file_type().is_block_device() {
                return None;
            }
            let pos = self.stream_position().ok()?;
            let end = self.seek(SeekFrom::End(0)).ok()?;
            self.seek(SeekFrom::Start(pos)).ok()?;
            Some(end)
        }
        #[cfg(not(unix))]
        {
            None
        }
    }
}

/// Host-side access to device nodes
pub trait DeviceHost {
    /// Whether a node (file, device or directory) exists at `path`
    fn node_exists(&self, path: &Path) -> bool;

    /// Whether a directory exists at `path`
    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    /// Open the node at `path` for reading and writing
    fn open_device(&self, path: &Path) -> io::Result<Box<dyn BlockDevice>>;
}

impl<H: DeviceHost + ?Sized> DeviceHost for &H {
    fn node_exists(&self, path: &Path) -> bool {
        (**self).node_exists(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        (**self).dir_exists(path)
    }

    fn open_device(&self, path: &Path) -> io::Result<Box<dyn BlockDevice>> {
        (**self).open_device(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_range() {
        assert_eq!(DeviceSuffix::new('a'), Some(DeviceSuffix::FIRST));
        assert_eq!(DeviceSuffix::new('z'), Some(DeviceSuffix::LAST));
        assert_eq!(DeviceSuffix::new('A'), None);
        assert_eq!(DeviceSuffix::new('0'), None);
        assert_eq!(DeviceSuffix::new('é'), None);

        let all: Vec<char> = DeviceSuffix::all().map(DeviceSuffix::letter).collect();
        assert_eq!(all.len(), 26);
        assert_eq!(all.first(), Some(&'a'));
        assert_eq!(all.last(), Some(&'z'));
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_device_path() {
        let path = DevicePath::new("/dev/block/sd", DeviceSuffix::new('c').unwrap());
        assert_eq!(path.as_path(), Path::new("/dev/block/sdc"));
        assert_eq!(path.suffix().letter(), 'c');
        assert_eq!(path.node_name(), Some("sdc"));
        assert_eq!(path.to_string(), "/dev/block/sdc");
    }

    #[test]
    fn test_device_path_long_prefix() {
        let prefix = "/".repeat(64) + "very/long/device/prefix/sd";
        let path = DevicePath::new(&prefix, DeviceSuffix::LAST);
        assert_eq!(path.to_string(), format!("{}z", prefix));
    }

    #[test]
    fn test_regular_file_has_no_capacity() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[0u8; 16]).unwrap();
        assert_eq!(file.capacity(), None);
        file.sync().unwrap();
    }
}
