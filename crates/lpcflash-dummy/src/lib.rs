//! lpcflash-dummy - In-memory block device host for testing
//!
//! This crate provides a host that emulates the bootloader's block devices
//! in memory. It records how the pipeline used them (existence checks, open
//! attempts, syncs, closes) and can inject the faults real hardware shows:
//! short writes, failing writes and flushes, stuck bits and refused opens.

mod control;

pub use control::{DummyReset, DummyUnmounter};

use log::trace;
use lpcflash_core::device::{BlockDevice, DeviceHost};
use std::collections::{HashMap, HashSet};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Configuration for one emulated device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Device size in bytes
    pub size: usize,
    /// Accept at most this many bytes per `write` call
    pub max_write_len: Option<usize>,
    /// Written bytes are ANDed with this mask, emulating stuck-at-zero bits
    pub write_mask: u8,
    /// Report the size through [`BlockDevice::capacity`]
    pub report_capacity: bool,
    /// Refuse to open
    pub fail_open: bool,
    /// Fail every `write` call
    pub fail_write: bool,
    /// Fail every sync
    pub fail_sync: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: 64 * 1024,
            max_write_len: None,
            write_mask: 0xFF,
            report_capacity: true,
            fail_open: false,
            fail_write: false,
            fail_sync: false,
        }
    }
}

impl DummyConfig {
    /// Default configuration with the given size
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct DeviceState {
    config: DummyConfig,
    data: Vec<u8>,
    opens: usize,
    closes: usize,
    syncs: usize,
}

#[derive(Debug, Default)]
struct HostState {
    devices: HashMap<PathBuf, Arc<Mutex<DeviceState>>>,
    dirs: HashSet<PathBuf>,
}

#[derive(Debug, Default)]
struct Counters {
    exists_checks: AtomicUsize,
    open_attempts: AtomicUsize,
}

/// Emulated host filesystem
///
/// Clones share state, so a test can keep one clone for inspection while
/// the programmer owns another.
#[derive(Debug, Clone, Default)]
pub struct DummyHost {
    state: Arc<Mutex<HostState>>,
    counters: Arc<Counters>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DummyHost {
    /// Empty host: no devices, no directories
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device node at `path`, initially erased to 0xFF
    pub fn add_device(&self, path: impl Into<PathBuf>, config: DummyConfig) {
        let data = vec![0xFF; config.size];
        let device = DeviceState {
            config,
            data,
            opens: 0,
            closes: 0,
            syncs: 0,
        };
        lock(&self.state)
            .devices
            .insert(path.into(), Arc::new(Mutex::new(device)));
    }

    /// Detach the device node at `path`
    pub fn remove_device(&self, path: &Path) {
        lock(&self.state).devices.remove(path);
    }

    /// Create a directory node at `path`
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        lock(&self.state).dirs.insert(path.into());
    }

    /// Whether a device node is attached at `path`; not counted as a probe
    pub fn has_device(&self, path: &Path) -> bool {
        lock(&self.state).devices.contains_key(path)
    }

    fn device(&self, path: &Path) -> Option<Arc<Mutex<DeviceState>>> {
        lock(&self.state).devices.get(path).cloned()
    }

    /// Current contents of the device at `path`
    pub fn data(&self, path: &Path) -> Option<Vec<u8>> {
        self.device(path).map(|d| lock(&d).data.clone())
    }

    /// Successful opens of the device at `path`
    pub fn opens(&self, path: &Path) -> usize {
        self.device(path).map_or(0, |d| lock(&d).opens)
    }

    /// Handles to the device at `path` that have been dropped
    pub fn closes(&self, path: &Path) -> usize {
        self.device(path).map_or(0, |d| lock(&d).closes)
    }

    /// Sync requests on the device at `path`, including failed ones
    pub fn syncs(&self, path: &Path) -> usize {
        self.device(path).map_or(0, |d| lock(&d).syncs)
    }

    /// Calls to [`DeviceHost::node_exists`]
    pub fn exists_checks(&self) -> usize {
        self.counters.exists_checks.load(Ordering::Relaxed)
    }

    /// Calls to [`DeviceHost::open_device`], successful or not
    pub fn open_attempts(&self) -> usize {
        self.counters.open_attempts.load(Ordering::Relaxed)
    }
}

impl DeviceHost for DummyHost {
    fn node_exists(&self, path: &Path) -> bool {
        self.counters.exists_checks.fetch_add(1, Ordering::Relaxed);
        let state = lock(&self.state);
        state.devices.contains_key(path) || state.dirs.contains(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        lock(&self.state).dirs.contains(path)
    }

    fn open_device(&self, path: &Path) -> io::Result<Box<dyn BlockDevice>> {
        self.counters.open_attempts.fetch_add(1, Ordering::Relaxed);
        let device = self
            .device(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        {
            let mut state = lock(&device);
            if state.config.fail_open {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            state.opens += 1;
        }
        trace!("Opened dummy device {}", path.display());
        Ok(Box::new(DummyDevice {
            state: device,
            pos: 0,
        }))
    }
}

/// Open handle to an emulated device
pub struct DummyDevice {
    state: Arc<Mutex<DeviceState>>,
    pos: u64,
}

impl Read for DummyDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let state = lock(&self.state);
        let start = (self.pos as usize).min(state.data.len());
        let n = buf.len().min(state.data.len() - start);
        buf[..n].copy_from_slice(&state.data[start..start + n]);
        drop(state);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for DummyDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = lock(&self.state);
        if state.config.fail_write {
            return Err(io::Error::new(io::ErrorKind::Other, "emulated I/O error"));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let start = self.pos as usize;
        let available = state.data.len().saturating_sub(start);
        let mut n = buf.len().min(available);
        if let Some(max) = state.config.max_write_len {
            n = n.min(max);
        }
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "no space left on device",
            ));
        }

        let mask = state.config.write_mask;
        for (dst, src) in state.data[start..start + n].iter_mut().zip(buf) {
            *dst = src & mask;
        }
        drop(state);
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for DummyDevice {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let size = lock(&self.state).data.len() as i64;
        let new_pos = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => size + n,
            SeekFrom::Current(n) => self.pos as i64 + n,
        };
        if new_pos < 0 {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        self.pos = new_pos as u64;
        Ok(self.pos)
    }
}

impl BlockDevice for DummyDevice {
    fn sync(&mut self) -> io::Result<()> {
        let mut state = lock(&self.state);
        state.syncs += 1;
        if state.config.fail_sync {
            return Err(io::Error::new(io::ErrorKind::Other, "emulated flush failure"));
        }
        Ok(())
    }

    fn capacity(&mut self) -> Option<u64> {
        let state = lock(&self.state);
        state
            .config
            .report_capacity
            .then_some(state.data.len() as u64)
    }
}

impl Drop for DummyDevice {
    fn drop(&mut self) {
        lock(&self.state).closes += 1;
    }
}
