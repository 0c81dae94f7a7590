//! Firmware image loading
//!
//! The image is read completely into memory before any device is touched.
//! Its size is taken by seeking to the end of the file; an empty image or
//! one above the size limit is rejected before the buffer is allocated, and
//! a read that does not return exactly that many bytes is a hard failure.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, error, info};

use crate::error::LoadError;

/// A firmware image held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    data: Vec<u8>,
}

impl FirmwareImage {
    /// Wrap bytes already in memory
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Image contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Image size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Release the buffer, returning the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Load the firmware image at `path`, rejecting images over `max_size` bytes
pub fn load(path: &Path, max_size: u64) -> Result<FirmwareImage, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::FileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Firmware image {} opened", path.display());

    load_from(file, path, max_size)
}

/// Load an image from any seekable reader; `path` is used for messages only
pub fn load_from<R: Read + Seek>(
    mut reader: R,
    path: &Path,
    max_size: u64,
) -> Result<FirmwareImage, LoadError> {
    let size = reader
        .seek(SeekFrom::End(0))
        .and_then(|size| reader.seek(SeekFrom::Start(0)).map(|_| size))
        .map_err(|e| LoadError::SizeComputation {
            path: path.to_path_buf(),
            source: e,
        })?;

    if size == 0 {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    if size > max_size {
        return Err(LoadError::SizeLimitExceeded {
            size,
            limit: max_size,
        });
    }
    info!("Firmware image is {} bytes", size);

    // `size <= max_size` keeps this allocation bounded
    let mut data = Vec::with_capacity(size as usize);

    // Read one byte past the measured size so growth is caught as a mismatch
    let result = reader.by_ref().take(size + 1).read_to_end(&mut data);
    if let Err(e) = result {
        return Err(LoadError::Read {
            path: path.to_path_buf(),
            read: data.len(),
            expected: size,
            source: e,
        });
    }

    if data.len() as u64 != size {
        error!(
            "Firmware image {} changed while reading: got {} bytes, expected {}",
            path.display(),
            data.len(),
            size
        );
        return Err(LoadError::ReadMismatch {
            path: path.to_path_buf(),
            read: data.len(),
            expected: size,
        });
    }

    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(FirmwareImage { data })
}
