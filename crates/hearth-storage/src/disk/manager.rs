//! Synchronous disk manager.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use hearth_common::types::PageId;
use parking_lot::Mutex;
use thiserror::Error;

/// Result type for disk operations.
pub type DiskResult<T> = Result<T, DiskError>;

/// Errors raised by the disk manager.
#[derive(Debug, Error)]
pub enum DiskError {
    /// Underlying file I/O failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path of the database file.
        path: PathBuf,
        /// The originating error.
        source: io::Error,
    },
}

/// Page-granular access to a single database file.
///
/// Pages live at offset `page_id * page_size`. The file grows lazily: a page
/// that was allocated but never written reads back as zeros.
///
/// The file handle is guarded by a mutex; callers that need atomicity across
/// several pages (the buffer pool) provide their own outer lock.
pub struct DiskManager {
    file: Mutex<File>,
    path: PathBuf,
    page_size: usize,
}

impl DiskManager {
    /// Opens (creating if necessary) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> DiskResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|source| DiskError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            page_size,
        })
    }

    /// Returns the page size this manager was opened with.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the path of the database file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the page `page_id` into `buf`.
    ///
    /// A read past the current end of file zero-fills the remainder of the
    /// buffer: the file grows lazily and unwritten pages are all zeros.
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        let offset = page_id.as_u64() * self.page_size as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| self.io_err(source))?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(self.io_err(source)),
            }
        }
        buf[filled..].fill(0);
        Ok(())
    }

    /// Writes `buf` as page `page_id`.
    pub fn write_page(&self, page_id: PageId, buf: &[u8]) -> DiskResult<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        let offset = page_id.as_u64() * self.page_size as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| self.io_err(source))?;
        file.write_all(buf).map_err(|source| self.io_err(source))?;
        Ok(())
    }

    /// Flushes buffered writes through to the storage device.
    pub fn sync(&self) -> DiskResult<()> {
        self.file
            .lock()
            .sync_all()
            .map_err(|source| self.io_err(source))
    }

    /// Returns the current size of the database file in bytes.
    pub fn size(&self) -> DiskResult<u64> {
        self.file
            .lock()
            .metadata()
            .map(|m| m.len())
            .map_err(|source| self.io_err(source))
    }

    fn io_err(&self, source: io::Error) -> DiskError {
        DiskError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for DiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskManager")
            .field("path", &self.path)
            .field("page_size", &self.page_size)
            .finish()
    }
}
