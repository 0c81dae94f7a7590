//! Programming configuration
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! file (or no file at all) describes the stock setup:
//!
//! ```toml
//! [device]
//! prefix = "/dev/block/sd"
//! max_image_size = "250 KiB"
//! verify = false
//!
//! [reset]
//! driver = "/sys/class/gpio-boot-reset/nfc"
//! required = false
//! settle_timeout_ms = 5000
//! poll_interval_ms = 250
//!
//! [mount]
//! point = "/mnt/media_rw/0000-0000"
//! ```
//!
//! The write offset is not configurable; it is fixed at [`WRITE_OFFSET`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Byte offset on the device where the firmware payload starts
pub const WRITE_OFFSET: u64 = 0x800;

/// Device node prefix the bootloader shows up under
pub const DEFAULT_DEVICE_PREFIX: &str = "/dev/block/sd";

/// Largest image accepted by default
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 256_000;

/// sysfs directory of the gpio-boot-reset driver
pub const DEFAULT_RESET_DRIVER: &str = "/sys/class/gpio-boot-reset/nfc";

/// Where the host auto-mounts the bootloader's volume
pub const DEFAULT_MOUNT_POINT: &str = "/mnt/media_rw/0000-0000";

const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Complete programming configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramConfig {
    /// Target device settings
    pub device: DeviceConfig,
    /// Reset driver settings
    pub reset: ResetConfig,
    /// Auto-mount settings
    pub mount: MountConfig,
}

/// Target device settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Node prefix; candidates are `<prefix>a` through `<prefix>z`
    pub prefix: String,
    /// Images larger than this are rejected before any device I/O
    #[serde(deserialize_with = "deserialize_size")]
    pub max_image_size: u64,
    /// Read the written region back and compare after flushing
    pub verify: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_DEVICE_PREFIX.to_string(),
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            verify: false,
        }
    }
}

/// Reset driver settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResetConfig {
    /// Driver directory containing the `mode` attribute
    pub driver: PathBuf,
    /// Refuse to program when the driver directory is missing
    pub required: bool,
    /// How long to wait for the device node after entering programming mode
    pub settle_timeout_ms: u64,
    /// Delay between device node probes while waiting
    pub poll_interval_ms: u64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            driver: PathBuf::from(DEFAULT_RESET_DRIVER),
            required: false,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ResetConfig {
    /// Settle timeout as a `Duration`
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Auto-mount settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    /// Mount point of the bootloader's volume
    pub point: PathBuf,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            point: PathBuf::from(DEFAULT_MOUNT_POINT),
        }
    }
}

impl ProgramConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ProgramConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check values that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "device.prefix",
                message: "must not be empty".to_string(),
            });
        }
        if self.device.max_image_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "device.max_image_size",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.reset.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "reset.poll_interval_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Deserialize a size given as an integer or a string like "0x3E800" or "250 KiB"
fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeOrStr {
        Int(u64),
        Str(String),
    }

    match SizeOrStr::deserialize(deserializer)? {
        SizeOrStr::Int(n) => Ok(n),
        SizeOrStr::Str(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a size string like "256000", "0x3E800", "250 KiB" or "1 MiB"
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex.trim(), 16).map_err(|e| format!("invalid hex: {}", e));
    }

    let s_lower = s.to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s_lower.strip_suffix("mib") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s_lower.strip_suffix("kib") {
        (n.trim(), 1024)
    } else if let Some(n) = s_lower.strip_suffix("mb") {
        (n.trim(), 1000 * 1000)
    } else if let Some(n) = s_lower.strip_suffix("kb") {
        (n.trim(), 1000)
    } else {
        return Err(format!("invalid size: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid size: {}", s))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("256000").unwrap(), 256_000);
        assert_eq!(parse_size("0x800").unwrap(), 2048);
        assert_eq!(parse_size("250 KiB").unwrap(), 250 * 1024);
        assert_eq!(parse_size("250KiB").unwrap(), 250 * 1024);
        assert_eq!(parse_size("256 kB").unwrap(), 256_000);
        assert_eq!(parse_size("1 MiB").unwrap(), 1024 * 1024);
        assert!(parse_size("lots").is_err());
        assert!(parse_size("0xZZ").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ProgramConfig::from_toml_str("").unwrap();
        assert_eq!(config, ProgramConfig::default());
        assert_eq!(config.device.prefix, "/dev/block/sd");
        assert_eq!(config.device.max_image_size, 256_000);
        assert!(!config.device.verify);
        assert!(!config.reset.required);
        assert_eq!(config.mount.point, PathBuf::from("/mnt/media_rw/0000-0000"));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[device]
prefix = "/dev/sd"
max_image_size = "128 KiB"
verify = true

[reset]
driver = "/tmp/reset"
required = true
settle_timeout_ms = 100
poll_interval_ms = 10

[mount]
point = "/media/lpc"
"#;
        let config = ProgramConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.device.prefix, "/dev/sd");
        assert_eq!(config.device.max_image_size, 128 * 1024);
        assert!(config.device.verify);
        assert_eq!(config.reset.driver, PathBuf::from("/tmp/reset"));
        assert!(config.reset.required);
        assert_eq!(config.reset.settle_timeout(), Duration::from_millis(100));
        assert_eq!(config.reset.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.mount.point, PathBuf::from("/media/lpc"));
    }

    #[test]
    fn test_integer_size() {
        let config = ProgramConfig::from_toml_str("[device]\nmax_image_size = 4096\n").unwrap();
        assert_eq!(config.device.max_image_size, 4096);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = ProgramConfig::from_toml_str("[device]\noffset = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = ProgramConfig::from_toml_str("[device]\nprefix = \"\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "device.prefix",
                ..
            }
        ));

        let err = ProgramConfig::from_toml_str("[device]\nmax_image_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "device.max_image_size",
                ..
            }
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lpcflash.toml");
        fs::write(&path, "[mount]\npoint = \"/mnt/x\"\n").unwrap();
        let config = ProgramConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.mount.point, PathBuf::from("/mnt/x"));

        let err = ProgramConfig::from_toml_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
