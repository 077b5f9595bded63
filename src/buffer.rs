//! Byte hosts the interpreter reads from and writes to.

use crate::datefmt::FormatSpec;
use crate::error::BufferError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The host buffer behind a session.
pub trait ByteSource {
    fn data_len(&self) -> u64;

    fn is_mutable(&self) -> bool;

    /// Copy `len` bytes at `offset`; fails if the range exceeds the data.
    fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>, BufferError>;

    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<(), BufferError>;

    /// Date layout the host wants timestamps shown and parsed in
    fn date_format(&self) -> FormatSpec {
        FormatSpec::default()
    }
}

fn checked_range(offset: u64, len: usize, data_len: u64) -> Result<std::ops::Range<usize>, BufferError> {
    let out_of_bounds = || BufferError::OutOfBounds {
        offset,
        len,
        data_len,
    };
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    if end as u64 > data_len {
        return Err(out_of_bounds());
    }
    Ok(start..end)
}

/// In-memory bytes
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    mutable: bool,
    date_format: FormatSpec,
}

impl MemoryBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            mutable: true,
            date_format: FormatSpec::default(),
        }
    }

    pub fn read_only(data: Vec<u8>) -> Self {
        Self {
            mutable: false,
            ..Self::new(data)
        }
    }

    pub fn with_date_format(mut self, spec: FormatSpec) -> Self {
        self.date_format = spec;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl ByteSource for MemoryBuffer {
    fn data_len(&self) -> u64 {
        self.data.len() as u64
    }

    fn is_mutable(&self) -> bool {
        self.mutable
    }

    fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>, BufferError> {
        let range = checked_range(offset, len, self.data_len())?;
        Ok(self.data[range].to_vec())
    }

    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<(), BufferError> {
        if !self.mutable {
            return Err(BufferError::ReadOnly);
        }
        let range = checked_range(offset, bytes.len(), self.data_len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    fn date_format(&self) -> FormatSpec {
        self.date_format
    }
}

/// A file loaded into memory; edits stay in memory until [`FileBuffer::save`].
#[derive(Debug)]
pub struct FileBuffer {
    path: PathBuf,
    inner: MemoryBuffer,
    dirty: bool,
}

impl FileBuffer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BufferError> {
        let path = path.as_ref().to_path_buf();
        let data = fs::read(&path)?;
        let writable = fs::metadata(&path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false);
        let inner = if writable {
            MemoryBuffer::new(data)
        } else {
            MemoryBuffer::read_only(data)
        };
        Ok(Self {
            path,
            inner,
            dirty: false,
        })
    }

    pub fn with_date_format(mut self, spec: FormatSpec) -> Self {
        self.inner = self.inner.with_date_format(spec);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write pending edits back to disk. Does nothing if clean.
    pub fn save(&mut self) -> Result<(), BufferError> {
        if !self.dirty {
            return Ok(());
        }
        fs::write(&self.path, self.inner.as_bytes())?;
        self.dirty = false;
        info!(path = %self.path.display(), "saved edits");
        Ok(())
    }
}

impl ByteSource for FileBuffer {
    fn data_len(&self) -> u64 {
        self.inner.data_len()
    }

    fn is_mutable(&self) -> bool {
        self.inner.is_mutable()
    }

    fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>, BufferError> {
        self.inner.read_bytes(offset, len)
    }

    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<(), BufferError> {
        self.inner.write_bytes(offset, bytes)?;
        self.dirty = true;
        Ok(())
    }

    fn date_format(&self) -> FormatSpec {
        self.inner.date_format()
    }
}
