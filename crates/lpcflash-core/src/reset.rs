//! Boot mode control
//!
//! A reset driver can pull the MCU into its programming mode (where it shows
//! up as block storage) or back into normal mode.

use std::fmt;

use crate::error::ResetError;

/// MCU boot mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// Bootloader exposed as block storage
    Program,
    /// Application firmware running
    Normal,
}

impl BootMode {
    /// Value written to the driver's `mode` attribute
    pub fn as_str(self) -> &'static str {
        match self {
            BootMode::Program => "prog",
            BootMode::Normal => "normal",
        }
    }
}

impl fmt::Display for BootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BootMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prog" | "program" => Ok(BootMode::Program),
            "normal" => Ok(BootMode::Normal),
            other => Err(format!("unknown boot mode '{}', expected prog or normal", other)),
        }
    }
}

/// Drives the MCU between boot modes
pub trait ResetControl {
    /// Whether the driver is loaded
    fn is_available(&self) -> bool;

    /// Request a boot mode; returns once the request is written
    fn set_mode(&self, mode: BootMode) -> Result<(), ResetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_strings() {
        assert_eq!(BootMode::Program.as_str(), "prog");
        assert_eq!(BootMode::Normal.to_string(), "normal");
        assert_eq!("prog".parse::<BootMode>(), Ok(BootMode::Program));
        assert_eq!("program".parse::<BootMode>(), Ok(BootMode::Program));
        assert_eq!("normal".parse::<BootMode>(), Ok(BootMode::Normal));
        assert!("boot".parse::<BootMode>().is_err());
    }
}
