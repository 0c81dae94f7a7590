//! Mode command implementation

use lpcflash_core::reset::{BootMode, ResetControl};
use lpcflash_core::ProgramConfig;
use lpcflash_linux_block::SysfsReset;

/// Switch the MCU to `mode` through the configured reset driver
pub fn run(config: &ProgramConfig, mode: BootMode) -> Result<(), Box<dyn std::error::Error>> {
    let reset = SysfsReset::new(&config.reset.driver);
    if !reset.is_available() {
        return Err(format!(
            "Reset driver {} not available, is the gpio-boot-reset driver loaded?",
            reset.driver_dir().display()
        )
        .into());
    }

    reset.set_mode(mode)?;
    println!("MCU switched to {} mode", mode);
    Ok(())
}
