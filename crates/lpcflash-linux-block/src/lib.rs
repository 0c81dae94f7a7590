//! lpcflash-linux-block - Linux host support for lpcflash
//!
//! This crate implements the host traits of `lpcflash-core` on Linux:
//!
//! - [`LinuxBlockHost`] - probes `/dev/block/sdX` style nodes with
//!   `access(F_OK)`, opens them read-write and reads their sysfs attributes
//! - [`SysfsReset`] - drives the MCU between programming and normal mode
//!   through the gpio-boot-reset driver
//! - [`LinuxUnmounter`] - unmounts the volume the host auto-mounted when the
//!   bootloader appeared
//!
//! # Example
//!
//! ```ignore
//! use lpcflash_core::{ProgramConfig, Programmer};
//! use lpcflash_linux_block::LinuxBlockHost;
//!
//! let programmer = Programmer::new(LinuxBlockHost::new(), &ProgramConfig::default());
//! let outcome = programmer.program(Path::new("firmware.bin"));
//! println!("{}", outcome);
//! ```
//!
//! # System Requirements
//!
//! - Read/write access to the block device node (usually root or a udev rule)
//! - Write access to `/sys/class/gpio-boot-reset/<name>/mode` for mode switching
//! - `CAP_SYS_ADMIN` for unmounting
//!
//! # Device Discovery
//!
//! ```bash
//! ls -la /dev/block/sd*
//! cat /sys/class/block/sda/size
//! cat /sys/class/block/sda/device/model
//! ```

pub mod device;
pub mod error;
pub mod mount;
pub mod reset;

// Re-exports
pub use device::{BlockInfo, LinuxBlockHost};
pub use error::{LinuxBlockError, Result};
pub use mount::LinuxUnmounter;
pub use reset::SysfsReset;
