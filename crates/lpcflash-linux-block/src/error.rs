//! Error types for Linux block device access

use std::io;
use thiserror::Error;

/// Linux block device errors
#[derive(Debug, Error)]
pub enum LinuxBlockError {
    /// The node has no entry under the sysfs block class
    #[error("no sysfs entry for block device {0}")]
    NotABlockDevice(String),

    /// Failed to read sysfs attribute
    #[error("Failed to read sysfs attribute '{path}': {source}")]
    SysfsRead {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse sysfs attribute
    #[error("Failed to parse sysfs attribute '{path}': {value}")]
    SysfsParse { path: String, value: String },
}

/// Result type for Linux block device operations
pub type Result<T> = std::result::Result<T, LinuxBlockError>;
