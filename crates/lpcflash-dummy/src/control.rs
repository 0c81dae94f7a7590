//! Emulated reset driver and unmounter

use crate::{lock, DummyConfig, DummyHost};
use log::trace;
use lpcflash_core::error::{ResetError, UnmountError};
use lpcflash_core::mount::Unmounter;
use lpcflash_core::reset::{BootMode, ResetControl};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const DUMMY_MODE_PATH: &str = "/sys/class/gpio-boot-reset/dummy/mode";

/// Reset driver that records every mode request
///
/// Optionally attaches a device to a [`DummyHost`] when programming mode is
/// requested, the way the bootloader enumerates after a reset.
#[derive(Debug, Default)]
pub struct DummyReset {
    modes: Mutex<Vec<BootMode>>,
    fail_on: Option<BootMode>,
    fail_after: Option<usize>,
    attach: Option<(DummyHost, PathBuf, DummyConfig)>,
}

impl DummyReset {
    /// Reset driver that accepts every request
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail requests for `mode`
    pub fn failing_on(mut self, mode: BootMode) -> Self {
        self.fail_on = Some(mode);
        self
    }

    /// Accept the first `count` requests and fail every later one
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Attach a device at `path` to `host` on the first programming-mode request
    pub fn attach_on_program(
        mut self,
        host: DummyHost,
        path: impl Into<PathBuf>,
        config: DummyConfig,
    ) -> Self {
        self.attach = Some((host, path.into(), config));
        self
    }

    /// Modes requested so far, failed requests included
    pub fn modes(&self) -> Vec<BootMode> {
        lock(&self.modes).clone()
    }
}

impl ResetControl for DummyReset {
    fn is_available(&self) -> bool {
        true
    }

    fn set_mode(&self, mode: BootMode) -> Result<(), ResetError> {
        let index = {
            let mut modes = lock(&self.modes);
            modes.push(mode);
            modes.len() - 1
        };
        trace!("Dummy reset: {} mode", mode);

        if self.fail_on == Some(mode) || self.fail_after.is_some_and(|n| index >= n) {
            return Err(ResetError {
                path: PathBuf::from(DUMMY_MODE_PATH),
                mode,
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }

        if mode == BootMode::Program {
            if let Some((host, path, config)) = &self.attach {
                if !host.has_device(path) {
                    host.add_device(path.clone(), config.clone());
                }
            }
        }
        Ok(())
    }
}

/// Unmounter that records its calls
#[derive(Debug, Default)]
pub struct DummyUnmounter {
    calls: Mutex<Vec<PathBuf>>,
    fail: bool,
}

impl DummyUnmounter {
    /// Unmounter that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Unmounter that always reports the volume busy
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Mount points passed so far
    pub fn calls(&self) -> Vec<PathBuf> {
        lock(&self.calls).clone()
    }
}

impl Unmounter for DummyUnmounter {
    fn unmount(&self, mount_point: &Path) -> Result<(), UnmountError> {
        lock(&self.calls).push(mount_point.to_path_buf());
        if self.fail {
            return Err(UnmountError {
                mount_point: mount_point.to_path_buf(),
                source: io::Error::from_raw_os_error(16),
            });
        }
        Ok(())
    }
}
