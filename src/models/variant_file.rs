//! File handles for freshly produced variants.

use bytes::Bytes;
use std::{
    fs::{self, File},
    io::{self, Cursor, Read, Seek},
    path::PathBuf,
};

/// Readable, seekable payload of a variant.
pub trait VariantReader: Read + Seek {}

impl<T: Read + Seek> VariantReader for T {}

/// Handle to one rendered variant waiting to be written.
///
/// The handle reports its own byte length. Inspection opens a reader and
/// only pulls the bytes it needs.
pub trait VariantFile {
    fn byte_size(&self) -> io::Result<u64>;

    fn open(&self) -> io::Result<Box<dyn VariantReader + '_>>;
}

/// Variant stored in a file on local disk (usually a processing temp file).
#[derive(Clone, Debug)]
pub struct DiskFile {
    path: PathBuf,
}

impl DiskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VariantFile for DiskFile {
    fn byte_size(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    fn open(&self) -> io::Result<Box<dyn VariantReader + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// Variant held entirely in memory.
#[derive(Clone, Debug)]
pub struct MemoryFile {
    data: Bytes,
}

impl MemoryFile {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl VariantFile for MemoryFile {
    fn byte_size(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn open(&self) -> io::Result<Box<dyn VariantReader + '_>> {
        Ok(Box::new(Cursor::new(self.data.clone())))
    }
}
