//! gpio-boot-reset sysfs control
//!
//! The driver exposes a class directory (by default
//! `/sys/class/gpio-boot-reset/nfc`) whose `mode` attribute accepts `prog`
//! or `normal`. Writing it toggles the MCU's boot pin and resets it.

use log::info;
use lpcflash_core::error::ResetError;
use lpcflash_core::reset::{BootMode, ResetControl};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the mode attribute inside the driver directory
const MODE_ATTRIBUTE: &str = "mode";

/// Reset controller backed by the gpio-boot-reset sysfs class
#[derive(Debug, Clone)]
pub struct SysfsReset {
    driver_dir: PathBuf,
}

impl SysfsReset {
    /// Controller for the driver directory `driver_dir`
    pub fn new(driver_dir: impl Into<PathBuf>) -> Self {
        Self {
            driver_dir: driver_dir.into(),
        }
    }

    /// Driver directory
    pub fn driver_dir(&self) -> &Path {
        &self.driver_dir
    }

    /// Full path of the `mode` attribute
    pub fn mode_path(&self) -> PathBuf {
        self.driver_dir.join(MODE_ATTRIBUTE)
    }
}

impl ResetControl for SysfsReset {
    fn is_available(&self) -> bool {
        self.driver_dir.is_dir()
    }

    fn set_mode(&self, mode: BootMode) -> Result<(), ResetError> {
        let path = self.mode_path();
        let to_err = |e: std::io::Error| ResetError {
            path: path.clone(),
            mode,
            source: e,
        };

        // sysfs attributes must be written in place, never created
        let mut file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(to_err)?;
        file.write_all(mode.as_str().as_bytes()).map_err(to_err)?;

        info!("Requested {} mode via {}", mode, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_set_mode_writes_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let reset = SysfsReset::new(dir.path());
        fs::write(reset.mode_path(), "").unwrap();

        assert!(reset.is_available());
        reset.set_mode(BootMode::Program).unwrap();
        assert_eq!(fs::read_to_string(reset.mode_path()).unwrap(), "prog");

        fs::write(reset.mode_path(), "").unwrap();
        reset.set_mode(BootMode::Normal).unwrap();
        assert_eq!(fs::read_to_string(reset.mode_path()).unwrap(), "normal");
    }

    #[test]
    fn test_missing_driver() {
        let dir = tempfile::tempdir().unwrap();
        let reset = SysfsReset::new(dir.path().join("gpio-boot-reset/nfc"));

        assert!(!reset.is_available());
        let err = reset.set_mode(BootMode::Program).unwrap_err();
        assert_eq!(err.mode, BootMode::Program);
        assert_eq!(err.path, reset.mode_path());
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }
}
