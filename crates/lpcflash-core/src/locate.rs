//! Device node discovery
//!
//! Candidates are probed from `<prefix>a` to `<prefix>z` and the first one
//! that exists wins. Any other storage that happens to share the prefix is
//! indistinguishable from the bootloader, so with several matches the
//! earliest letter is chosen.

use log::{debug, trace};

use crate::device::{DeviceHost, DevicePath, DeviceSuffix};

/// Finds the bootloader's device node under a fixed naming prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLocator {
    prefix: String,
}

impl DeviceLocator {
    /// Create a locator for nodes named `<prefix><a-z>`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Naming prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Node path for a given suffix
    pub fn path_for(&self, suffix: DeviceSuffix) -> DevicePath {
        DevicePath::new(&self.prefix, suffix)
    }

    /// Return the smallest suffix whose node exists, or `None` after all 26
    pub fn locate<H: DeviceHost + ?Sized>(&self, host: &H) -> Option<DeviceSuffix> {
        for suffix in DeviceSuffix::all() {
            let path = self.path_for(suffix);
            trace!("Probing {}", path);
            if host.node_exists(path.as_path()) {
                debug!("Found device node {}", path);
                return Some(suffix);
            }
        }
        debug!("No device node matches {}[a-z]", self.prefix);
        None
    }

    /// Like [`locate`](Self::locate), returning the full node path
    pub fn locate_path<H: DeviceHost + ?Sized>(&self, host: &H) -> Option<DevicePath> {
        self.locate(host).map(|suffix| self.path_for(suffix))
    }

    /// Every existing node, in probe order
    pub fn locate_all<H: DeviceHost + ?Sized>(&self, host: &H) -> Vec<DevicePath> {
        DeviceSuffix::all()
            .map(|suffix| self.path_for(suffix))
            .filter(|path| host.node_exists(path.as_path()))
            .collect()
    }
}
