//! Error types for the firmware-write pipeline
//!
//! Every variant that wraps an OS failure keeps the `io::Error` as its
//! source, so the rendered message always ends with the OS error string.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::reset::BootMode;

/// Errors raised while loading a firmware image into memory
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be opened for reading
    #[error("can't open firmware image {path}: {source}")]
    FileOpen {
        /// Image file
        path: PathBuf,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// Seeking to the end of the image to measure it failed
    #[error("can't compute size of firmware image {path}: {source}")]
    SizeComputation {
        /// Image file
        path: PathBuf,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The image file is zero bytes long
    #[error("firmware image {path} is empty")]
    Empty {
        /// Image file
        path: PathBuf,
    },

    /// The image is larger than the configured maximum
    #[error("firmware image is {size} bytes, exceeding the {limit} byte limit")]
    SizeLimitExceeded {
        /// Image size in bytes
        size: u64,
        /// Configured maximum in bytes
        limit: u64,
    },

    /// The OS reported an error while reading the image
    #[error("read of firmware image {path} failed after {read} of {expected} bytes: {source}")]
    Read {
        /// Image file
        path: PathBuf,
        /// Bytes read before the error
        read: usize,
        /// Size measured before reading
        expected: u64,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// Fewer (or more) bytes were read than the computed size
    #[error("read {read} bytes from firmware image {path}, expected {expected}")]
    ReadMismatch {
        /// Image file
        path: PathBuf,
        /// Bytes actually read
        read: usize,
        /// Size measured before reading
        expected: u64,
    },
}

/// Errors raised while writing an image to the located device
#[derive(Debug, Error)]
pub enum WriteError {
    /// The device node could not be opened read-write
    #[error("can't open device {path}: {source}")]
    DeviceOpen {
        /// Device node
        path: PathBuf,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The image would run past the end of the device
    #[error("image of {len} bytes at offset {offset:#x} exceeds device {path} capacity of {capacity} bytes")]
    ExceedsCapacity {
        /// Device node
        path: PathBuf,
        /// Write offset
        offset: u64,
        /// Image length
        len: usize,
        /// Device size in bytes
        capacity: u64,
    },

    /// Seeking to the write offset failed
    #[error("seek to offset {offset:#x} on {path} failed: {source}")]
    Seek {
        /// Device node
        path: PathBuf,
        /// Target offset
        offset: u64,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The write call itself failed
    #[error("write of {len} bytes to {path} failed: {source}")]
    Write {
        /// Device node
        path: PathBuf,
        /// Bytes submitted
        len: usize,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The device accepted fewer bytes than the image holds
    #[error("device {path} accepted only {written} of {expected} bytes")]
    ShortWrite {
        /// Device node
        path: PathBuf,
        /// Bytes the device accepted
        written: usize,
        /// Image length
        expected: usize,
    },

    /// Forcing the written data to the device failed
    #[error("flush of device {path} failed: {source}")]
    Flush {
        /// Device node
        path: PathBuf,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// Reading the written region back failed
    #[error("read-back of {path} failed: {source}")]
    Readback {
        /// Device node
        path: PathBuf,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The read-back data differs from the image
    #[error("verification of {path} failed at offset {offset:#x}: expected {expected:#04x}, found {found:#04x}")]
    VerifyMismatch {
        /// Device node
        path: PathBuf,
        /// Device offset of the first differing byte
        offset: u64,
        /// Byte in the image
        expected: u8,
        /// Byte on the device
        found: u8,
    },
}

/// Errors raised by a single programming run
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The reset driver is required but its directory does not exist
    #[error("reset driver {path} not available, is the gpio-boot-reset driver loaded?")]
    ResetDriverMissing {
        /// Expected driver directory
        path: PathBuf,
    },

    /// Loading the image failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// No `<prefix><letter>` node exists
    #[error("no device found matching {prefix}[a-z], did the MCU boot into programming mode?")]
    DeviceNotFound {
        /// Naming prefix that was probed
        prefix: String,
    },

    /// Writing to the device failed
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Error switching the MCU between boot modes
#[derive(Debug, Error)]
#[error("can't switch MCU to {mode} mode via {path}: {source}")]
pub struct ResetError {
    /// Mode file written
    pub path: PathBuf,
    /// Requested mode
    pub mode: BootMode,
    /// OS error
    #[source]
    pub source: io::Error,
}

/// Error unmounting the auto-mounted volume
#[derive(Debug, Error)]
#[error("can't unmount {mount_point}: {source}")]
pub struct UnmountError {
    /// Mount point that was targeted
    pub mount_point: PathBuf,
    /// OS error
    #[source]
    pub source: io::Error,
}

/// Errors raised by a complete flash session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Driving the MCU into a boot mode failed
    #[error(transparent)]
    Reset(#[from] ResetError),

    /// The device node did not appear in time
    #[error("no device appeared under {prefix}[a-z] within {waited:?}")]
    DeviceTimeout {
        /// Naming prefix that was probed
        prefix: String,
        /// Time spent polling
        waited: Duration,
    },

    /// Unmounting the auto-mounted volume failed
    #[error(transparent)]
    Unmount(#[from] UnmountError),

    /// The programming run failed
    #[error(transparent)]
    Program(#[from] ProgramError),
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Configuration file
        path: PathBuf,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range
    #[error("invalid value for '{name}': {message}")]
    InvalidValue {
        /// Dotted key, e.g. `device.prefix`
        name: &'static str,
        /// Why the value was rejected
        message: String,
    },
}
