//! Program command implementation

use super::unmounter;
use log::error;
use lpcflash_core::mount::Unmounter;
use lpcflash_core::{FlashSession, ProgramConfig, ProgramOutcome, Programmer};
use lpcflash_linux_block::{LinuxBlockHost, SysfsReset};
use std::path::Path;

/// How much of the host-side sequence to run around the write
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramOptions {
    /// Cycle the MCU through programming mode and back
    pub reset: bool,
    /// Unmount the auto-mounted volume before writing
    pub unmount: bool,
    /// Unmount with MNT_DETACH
    pub lazy: bool,
}

/// Program `image` and report the host status
pub fn run(config: &ProgramConfig, image: &Path, options: ProgramOptions) -> ProgramOutcome {
    let programmer = Programmer::new(LinuxBlockHost::new(), config);
    let unmounter = unmounter(options.lazy);

    if options.reset {
        let reset = SysfsReset::new(&config.reset.driver);
        let mut session = FlashSession::new(&programmer, &reset, config);
        if options.unmount {
            session = session.with_unmount(&unmounter);
        }

        return match session.run(image) {
            Ok(report) => {
                println!(
                    "Wrote {} bytes to {} at offset {:#x}{}",
                    report.bytes_written,
                    report.device,
                    report.offset,
                    if report.verified { " (verified)" } else { "" }
                );
                ProgramOutcome::Success
            }
            Err(e) => {
                error!("{}", e);
                ProgramOutcome::Failure
            }
        };
    }

    if options.unmount {
        if let Err(e) = unmounter.unmount(&config.mount.point) {
            error!("{}", e);
            return ProgramOutcome::Failure;
        }
    }

    programmer.program(image)
}
