//! Complete flash session
//!
//! Wraps a programming run with the steps the host performs around it:
//! reset the MCU into programming mode, wait for its device node, unmount
//! the volume the host auto-mounted, program, and return the MCU to normal
//! mode. The MCU is always sent back to normal mode once it has been put
//! into programming mode.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::config::ProgramConfig;
use crate::device::{DeviceHost, DevicePath};
use crate::error::SessionError;
use crate::mount::Unmounter;
use crate::program::Programmer;
use crate::reset::{BootMode, ResetControl};
use crate::writer::WriteReport;

/// Reset / wait / unmount / program / reset cycle for one image
pub struct FlashSession<'a, H> {
    programmer: &'a Programmer<H>,
    reset: &'a dyn ResetControl,
    unmounter: Option<&'a dyn Unmounter>,
    mount_point: PathBuf,
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl<'a, H: DeviceHost> FlashSession<'a, H> {
    /// Create a session; unmounting is skipped until [`with_unmount`](Self::with_unmount)
    pub fn new(
        programmer: &'a Programmer<H>,
        reset: &'a dyn ResetControl,
        config: &ProgramConfig,
    ) -> Self {
        Self {
            programmer,
            reset,
            unmounter: None,
            mount_point: config.mount.point.clone(),
            settle_timeout: config.reset.settle_timeout(),
            poll_interval: config.reset.poll_interval(),
        }
    }

    /// Unmount the configured mount point before programming
    pub fn with_unmount(mut self, unmounter: &'a dyn Unmounter) -> Self {
        self.unmounter = Some(unmounter);
        self
    }

    /// Run the whole session for the image at `image`
    pub fn run(&self, image: &Path) -> Result<WriteReport, SessionError> {
        info!("Entering programming mode");
        self.reset.set_mode(BootMode::Normal)?;
        self.reset.set_mode(BootMode::Program)?;

        let result = self.program_in_boot_mode(image);

        info!("Resetting MCU to normal mode");
        if let Err(e) = self.reset.set_mode(BootMode::Normal) {
            error!("{}; firmware may be corrupted", e);
        }

        result
    }

    fn program_in_boot_mode(&self, image: &Path) -> Result<WriteReport, SessionError> {
        let device = self.wait_for_device()?;
        info!("Device {} attached", device);

        if let Some(unmounter) = self.unmounter {
            info!("Unmounting {}", self.mount_point.display());
            unmounter.unmount(&self.mount_point)?;
        }

        Ok(self.programmer.try_program(image)?)
    }

    /// Poll the locator until a node appears or the settle timeout passes
    fn wait_for_device(&self) -> Result<DevicePath, SessionError> {
        let start = Instant::now();
        loop {
            if let Some(device) = self.programmer.locate() {
                return Ok(device);
            }

            let waited = start.elapsed();
            if waited >= self.settle_timeout {
                warn!(
                    "No device under {}[a-z] after {:?}",
                    self.programmer.locator().prefix(),
                    waited
                );
                return Err(SessionError::DeviceTimeout {
                    prefix: self.programmer.locator().prefix().to_string(),
                    waited,
                });
            }

            debug!("Waiting for device node");
            thread::sleep(self.poll_interval.min(self.settle_timeout - waited));
        }
    }
}
