//! lpcflash-core - Firmware-write pipeline for block-storage bootloaders
//!
//! Some microcontrollers (the LPC11U6x family among them) present their
//! flash to the host as a small raw block device while sitting in their
//! programming mode. Writing a firmware image to that device at a fixed
//! offset reprograms the part.
//!
//! This crate contains the whole pipeline, independent of the host OS:
//!
//! - [`locate::DeviceLocator`] - finds the first `<prefix><a..z>` node that exists
//! - [`image::load`] - reads and validates the firmware image
//! - [`writer::DeviceWriter`] - writes the image at [`WRITE_OFFSET`], then flushes
//! - [`program::Programmer`] - sequences the above into one status
//! - [`session::FlashSession`] - the complete reset / wait / unmount / program cycle
//!
//! Host access goes through the [`device::DeviceHost`],
//! [`reset::ResetControl`] and [`mount::Unmounter`] traits. The
//! `lpcflash-linux-block` crate implements them for Linux and
//! `lpcflash-dummy` implements them in memory.
//!
//! # Example
//!
//! ```ignore
//! use lpcflash_core::{config::ProgramConfig, program::Programmer};
//! use lpcflash_linux_block::LinuxBlockHost;
//!
//! let programmer = Programmer::new(LinuxBlockHost::new(), &ProgramConfig::default());
//! let outcome = programmer.program(Path::new("firmware.bin"));
//! std::process::exit(if outcome.is_success() { 0 } else { 1 });
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod device;
pub mod error;
pub mod image;
pub mod locate;
pub mod mount;
pub mod program;
pub mod reset;
pub mod session;
pub mod writer;

pub use config::{ProgramConfig, WRITE_OFFSET};
pub use device::{BlockDevice, DeviceHost, DevicePath, DeviceSuffix};
pub use error::{LoadError, ProgramError, SessionError, WriteError};
pub use image::FirmwareImage;
pub use locate::DeviceLocator;
pub use program::{ProgramOutcome, Programmer};
pub use session::FlashSession;
pub use writer::{DeviceWriter, WriteReport};
