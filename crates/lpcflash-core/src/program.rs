//! Programming orchestrator
//!
//! One run is a straight gated sequence with no retries:
//!
//! 1. (optional) check the reset driver is loaded
//! 2. load the image; on failure no device is touched
//! 3. locate the device node; on failure the image is dropped
//! 4. write the image
//!
//! The image is owned by the run and dropped on every exit path.
//! [`Programmer::program`] logs the failing step and collapses the result to
//! a [`ProgramOutcome`]; [`Programmer::try_program`] keeps the typed error.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::config::ProgramConfig;
use crate::device::{DeviceHost, DevicePath};
use crate::error::ProgramError;
use crate::image;
use crate::locate::DeviceLocator;
use crate::writer::{DeviceWriter, WriteReport};

/// Result of a programming run as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramOutcome {
    /// Every step completed
    Success,
    /// Some step failed; details are in the log
    Failure,
}

impl ProgramOutcome {
    /// Status code handed to the host: `1` on success, `-1` on failure
    pub fn code(self) -> i32 {
        match self {
            ProgramOutcome::Success => 1,
            ProgramOutcome::Failure => -1,
        }
    }

    /// Whether the run succeeded
    pub fn is_success(self) -> bool {
        self == ProgramOutcome::Success
    }
}

impl fmt::Display for ProgramOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.code())
    }
}

/// Sequences loading, locating and writing for one host
pub struct Programmer<H> {
    host: H,
    locator: DeviceLocator,
    writer: DeviceWriter,
    max_image_size: u64,
    reset_driver: Option<PathBuf>,
}

impl<H: DeviceHost> Programmer<H> {
    /// Build a programmer from configuration
    pub fn new(host: H, config: &ProgramConfig) -> Self {
        Self {
            host,
            locator: DeviceLocator::new(config.device.prefix.clone()),
            writer: DeviceWriter::new(config.device.verify),
            max_image_size: config.device.max_image_size,
            reset_driver: config
                .reset
                .required
                .then(|| config.reset.driver.clone()),
        }
    }

    /// Host this programmer talks to
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Locator used to find the device
    pub fn locator(&self) -> &DeviceLocator {
        &self.locator
    }

    /// Find the target device node without programming it
    pub fn locate(&self) -> Option<DevicePath> {
        self.locator.locate_path(&self.host)
    }

    /// Program the image at `path`, collapsing any failure into [`ProgramOutcome::Failure`]
    pub fn program(&self, path: &Path) -> ProgramOutcome {
        match self.try_program(path) {
            Ok(_) => ProgramOutcome::Success,
            Err(e) => {
                error!("{}", e);
                ProgramOutcome::Failure
            }
        }
    }

    /// Program the image at `path`
    pub fn try_program(&self, path: &Path) -> Result<WriteReport, ProgramError> {
        if let Some(driver) = &self.reset_driver {
            if !self.host.dir_exists(driver) {
                return Err(ProgramError::ResetDriverMissing {
                    path: driver.clone(),
                });
            }
        }

        let image = image::load(path, self.max_image_size)?;

        let device = self
            .locate()
            .ok_or_else(|| ProgramError::DeviceNotFound {
                prefix: self.locator.prefix().to_string(),
            })?;
        info!("Device found at {}", device);

        let report = self.writer.write(&self.host, &device, &image)?;
        info!(
            "Programmed {} bytes from {} to {}",
            report.bytes_written,
            path.display(),
            report.device
        );
        Ok(report)
    }
}
