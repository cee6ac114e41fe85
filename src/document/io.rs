//! Reading, writing and locking secret files on disk.
//!
//! Rewrites go through a [`DocumentLock`], an advisory exclusive lock held for the
//! whole persist-then-encrypt sequence so two ejflow processes never interleave
//! on one file. Newly created files get owner-only permissions.

use crate::errors::{AppResult, LockError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the document text at `path`.
///
/// # Errors
///
/// Returns `AppError::Io` if the file is missing or unreadable.
pub fn read_document_file(path: &Path) -> AppResult<String> {
    Ok(fs::read_to_string(path)?)
}

/// An exclusive advisory lock on a secret file.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct DocumentLock {
    file: File,
    path: PathBuf,
}

impl DocumentLock {
    /// Opens (creating if needed) and locks `path` without blocking.
    ///
    /// # Errors
    ///
    /// - `LockError::FileBusy` if another process holds the lock
    /// - `LockError::AcquisitionFailed` if the file cannot be opened or locked
    pub fn acquire(path: &Path) -> AppResult<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        options.mode(0o600);

        let file = options.open(path).map_err(|e| LockError::AcquisitionFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "Acquired document lock");
                Ok(DocumentLock {
                    file,
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(LockError::FileBusy {
                    path: path.to_path_buf(),
                }
                .into())
            }
            Err(e) => Err(LockError::AcquisitionFailed {
                path: path.to_path_buf(),
                source: e,
            }
            .into()),
        }
    }

    /// The locked path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file through the locked handle.
    pub fn read_contents(&mut self) -> AppResult<String> {
        let mut text = String::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Replaces the file contents with `text`, keeping its permissions.
    pub fn replace_contents(&mut self, text: &str) -> AppResult<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(text.as_bytes())?;
        self.file.sync_all()?;
        Ok(())
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "Failed to release document lock");
        }
    }
}
