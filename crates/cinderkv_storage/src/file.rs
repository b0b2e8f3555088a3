//! File-based storage backend for segment files.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-backed storage backend.
///
/// The size is tracked in memory so rotation checks never hit the
/// filesystem. Positional reads seek under an internal lock and leave the
/// append position untouched (appends always seek to the end first).
///
/// # Durability
///
/// `sync()` calls `File::sync_all()`, flushing both data and metadata.
///
/// # Example
///
/// ```no_run
/// use cinderkv_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("0000000001.active")).unwrap();
/// backend.append(b"record bytes").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: RwLock<PathBuf>,
    file: RwLock<File>,
    size: RwLock<u64>,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();

        Ok(Self {
            path: RwLock::new(path.to_path_buf()),
            file: RwLock::new(file),
            size: RwLock::new(size),
        })
    }

    /// Returns the current path of the underlying file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.path.read().clone()
    }

    /// Atomically renames the underlying file.
    ///
    /// The open handle stays valid across the rename; only the bookkeeping
    /// path changes. Used when an active segment is sealed and when a
    /// compaction output is committed.
    pub fn rename_to(&self, new_path: &Path) -> StorageResult<()> {
        let mut path = self.path.write();
        fs::rename(&*path, new_path)?;
        *path = new_path.to_path_buf();
        Ok(())
    }

    /// Removes the underlying file from the filesystem.
    ///
    /// The handle is dropped by the caller afterwards; reads through other
    /// clones of the handle keep working until then (POSIX unlink semantics).
    pub fn remove(&self) -> StorageResult<()> {
        fs::remove_file(&*self.path.read())?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if data.is_empty() {
            return Ok(*self.size.read());
        }

        let mut file = self.file.write();
        let mut size = self.size.write();

        let offset = *size;
        file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        *size += data.len() as u64;

        Ok(offset)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let file = self.file.write();
        let mut size = self.size.write();

        if new_size > *size {
            return Err(StorageError::TruncateBeyondEnd {
                size: *size,
                requested: new_size,
            });
        }

        file.set_len(new_size)?;
        file.sync_all()?;
        *size = new_size;

        Ok(())
    }
}
