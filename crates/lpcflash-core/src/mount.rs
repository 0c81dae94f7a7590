//! Unmounting the bootloader's auto-mounted volume

use std::path::Path;

use crate::error::UnmountError;

/// Unmounts a mount point on the host
pub trait Unmounter {
    /// Unmount `mount_point`
    fn unmount(&self, mount_point: &Path) -> Result<(), UnmountError>;
}
