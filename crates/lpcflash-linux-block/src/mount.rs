//! Unmounting via umount2(2)

use log::info;
use lpcflash_core::error::UnmountError;
use lpcflash_core::mount::Unmounter;
use nix::mount::{umount2, MntFlags};
use std::io;
use std::path::Path;

/// Unmounter calling `umount2` directly
#[derive(Debug, Clone, Copy)]
pub struct LinuxUnmounter {
    flags: MntFlags,
}

impl Default for LinuxUnmounter {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxUnmounter {
    /// Plain unmount
    pub fn new() -> Self {
        Self {
            flags: MntFlags::empty(),
        }
    }

    /// Detach the mount lazily (`MNT_DETACH`) so busy volumes still go away
    pub fn lazy() -> Self {
        Self {
            flags: MntFlags::MNT_DETACH,
        }
    }
}

impl Unmounter for LinuxUnmounter {
    fn unmount(&self, mount_point: &Path) -> Result<(), UnmountError> {
        umount2(mount_point, self.flags).map_err(|errno| UnmountError {
            mount_point: mount_point.to_path_buf(),
            source: io::Error::from(errno),
        })?;
        info!("Unmounted {}", mount_point.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmount_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-mounted");

        let err = LinuxUnmounter::new().unmount(&missing).unwrap_err();
        assert_eq!(err.mount_point, missing);
        // EPERM without CAP_SYS_ADMIN, ENOENT with it
        assert!(err.source.raw_os_error().is_some());
    }
}
