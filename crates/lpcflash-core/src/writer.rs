//! Device writer
//!
//! Opens the located node read-write, seeks to [`WRITE_OFFSET`] and hands
//! the whole image to a single `write` call. Once the device is open it is
//! always flushed and then closed, whether the write succeeded, came up
//! short or failed outright. A short write is reported as
//! [`WriteError::ShortWrite`] after the flush.

use std::io::{Read, Seek, SeekFrom, Write};

use log::{debug, error, info, warn};

use crate::config::WRITE_OFFSET;
use crate::device::{BlockDevice, DeviceHost, DevicePath};
use crate::error::WriteError;
use crate::image::FirmwareImage;

/// Chunk size for read-back verification
const VERIFY_CHUNK_SIZE: usize = 4096;

/// Summary of a completed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Node that was written
    pub device: DevicePath,
    /// Offset the image starts at
    pub offset: u64,
    /// Bytes accepted by the device
    pub bytes_written: usize,
    /// Whether the written region was read back and compared
    pub verified: bool,
}

/// Writes firmware images at the fixed payload offset
#[derive(Debug, Clone, Default)]
pub struct DeviceWriter {
    verify: bool,
}

impl DeviceWriter {
    /// Create a writer; with `verify` the region is read back after flushing
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    /// Write `image` to `device` at [`WRITE_OFFSET`]
    pub fn write<H: DeviceHost + ?Sized>(
        &self,
        host: &H,
        device: &DevicePath,
        image: &FirmwareImage,
    ) -> Result<WriteReport, WriteError> {
        let path = device.as_path();
        let mut dev = host
            .open_device(path)
            .map_err(|e| WriteError::DeviceOpen {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!("Opened {} read-write", device);

        if let Some(capacity) = dev.capacity() {
            let end = WRITE_OFFSET + image.len() as u64;
            if end > capacity {
                return Err(WriteError::ExceedsCapacity {
                    path: path.to_path_buf(),
                    offset: WRITE_OFFSET,
                    len: image.len(),
                    capacity,
                });
            }
        }

        info!(
            "Writing {} bytes to {} at offset {:#x}",
            image.len(),
            device,
            WRITE_OFFSET
        );
        let written = transfer(&mut *dev, device, image.as_bytes());

        // Flush whatever reached the device before looking at the result
        let synced = dev.sync();

        let written = match written {
            Ok(n) => n,
            Err(e) => {
                if let Err(sync_err) = synced {
                    warn!("Flush of {} after failed write also failed: {}", device, sync_err);
                }
                return Err(e);
            }
        };
        synced.map_err(|e| WriteError::Flush {
            path: path.to_path_buf(),
            source: e,
        })?;

        if written < image.len() {
            warn!(
                "Device {} accepted only {} of {} bytes",
                device,
                written,
                image.len()
            );
            return Err(WriteError::ShortWrite {
                path: path.to_path_buf(),
                written,
                expected: image.len(),
            });
        }

        if self.verify {
            verify(&mut *dev, device, image.as_bytes())?;
            info!("Verified {} bytes on {}", image.len(), device);
        }

        info!("Finished writing {}", device);
        Ok(WriteReport {
            device: device.clone(),
            offset: WRITE_OFFSET,
            bytes_written: written,
            verified: self.verify,
        })
    }
}

/// Seek to the payload offset and issue one write for the whole image
fn transfer(
    dev: &mut dyn BlockDevice,
    device: &DevicePath,
    data: &[u8],
) -> Result<usize, WriteError> {
    dev.seek(SeekFrom::Start(WRITE_OFFSET))
        .map_err(|e| WriteError::Seek {
            path: device.as_path().to_path_buf(),
            offset: WRITE_OFFSET,
            source: e,
        })?;

    dev.write(data).map_err(|e| {
        error!("Write to {} failed: {}", device, e);
        WriteError::Write {
            path: device.as_path().to_path_buf(),
            len: data.len(),
            source: e,
        }
    })
}

/// Read the payload region back and compare it against `expected`
fn verify(dev: &mut dyn BlockDevice, device: &DevicePath, expected: &[u8]) -> Result<(), WriteError> {
    let readback_err = |e: std::io::Error| WriteError::Readback {
        path: device.as_path().to_path_buf(),
        source: e,
    };

    dev.seek(SeekFrom::Start(WRITE_OFFSET)).map_err(readback_err)?;

    let mut buf = vec![0u8; VERIFY_CHUNK_SIZE];
    let mut offset = 0usize;
    while offset < expected.len() {
        let chunk_size = std::cmp::min(VERIFY_CHUNK_SIZE, expected.len() - offset);
        let chunk = &mut buf[..chunk_size];
        dev.read_exact(chunk).map_err(readback_err)?;

        let expected_chunk = &expected[offset..offset + chunk_size];
        if let Some(i) = chunk.iter().zip(expected_chunk).position(|(a, b)| a != b) {
            return Err(WriteError::VerifyMismatch {
                path: device.as_path().to_path_buf(),
                offset: WRITE_OFFSET + (offset + i) as u64,
                expected: expected_chunk[i],
                found: chunk[i],
            });
        }

        offset += chunk_size;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceSuffix;
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::path::{Path, PathBuf};

    /// Host where every node is a regular file inside a temp dir
    struct FileHost {
        dir: tempfile::TempDir,
    }

    impl FileHost {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn prefix(&self) -> String {
            format!("{}/sd", self.dir.path().display())
        }

        fn create(&self, letter: char, size: usize) -> DevicePath {
            let path = DevicePath::new(&self.prefix(), DeviceSuffix::new(letter).unwrap());
            let mut file = File::create(path.as_path()).unwrap();
            file.write_all(&vec![0xFF; size]).unwrap();
            path
        }
    }

    impl DeviceHost for FileHost {
        fn node_exists(&self, path: &Path) -> bool {
            path.exists()
        }

        fn open_device(&self, path: &Path) -> io::Result<Box<dyn BlockDevice>> {
            let file = OpenOptions::new().read(true).write(true).open(path)?;
            Ok(Box::new(file))
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_round_trip_at_offset() {
        let host = FileHost::new();
        let device = host.create('a', 8192);
        let data = pattern(1024);
        let image = FirmwareImage::from_bytes(data.clone());

        let report = DeviceWriter::new(false).write(&host, &device, &image).unwrap();
        assert_eq!(report.bytes_written, 1024);
        assert_eq!(report.offset, 2048);
        assert!(!report.verified);

        let mut file = File::open(device.as_path()).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(&contents[2048..3072], &data[..]);
        // Region below the offset and past the image untouched
        assert!(contents[..2048].iter().all(|&b| b == 0xFF));
        assert!(contents[3072..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_write_extends_small_file() {
        let host = FileHost::new();
        let device = host.create('b', 0);
        let data = pattern(100);

        DeviceWriter::new(true)
            .write(&host, &device, &FirmwareImage::from_bytes(data.clone()))
            .unwrap();

        let mut file = File::open(device.as_path()).unwrap();
        file.seek(SeekFrom::Start(WRITE_OFFSET)).unwrap();
        let mut back = vec![0u8; 100];
        file.read_exact(&mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_verify_reports_success() {
        let host = FileHost::new();
        let device = host.create('c', 4096);
        let report = DeviceWriter::new(true)
            .write(&host, &device, &FirmwareImage::from_bytes(pattern(5000)))
            .unwrap();
        assert!(report.verified);
        assert_eq!(report.bytes_written, 5000);
    }

    #[test]
    fn test_open_failure() {
        let host = FileHost::new();
        let device = DevicePath::new(&host.prefix(), DeviceSuffix::FIRST);
        let err = DeviceWriter::new(false)
            .write(&host, &device, &FirmwareImage::from_bytes(pattern(16)))
            .unwrap_err();
        match err {
            WriteError::DeviceOpen { path, source } => {
                assert_eq!(path, PathBuf::from(device.as_path()));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected DeviceOpen, got {:?}", other),
        }
    }
}
