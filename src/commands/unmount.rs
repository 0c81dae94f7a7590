//! Unmount command implementation

use super::unmounter;
use lpcflash_core::mount::Unmounter;
use lpcflash_core::ProgramConfig;

/// Unmount the configured mount point
pub fn run(config: &ProgramConfig, lazy: bool) -> Result<(), Box<dyn std::error::Error>> {
    unmounter(lazy).unmount(&config.mount.point)?;
    println!("Unmounted {}", config.mount.point.display());
    Ok(())
}
