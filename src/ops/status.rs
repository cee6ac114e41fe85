//! Inspect a secret file without running the binary.

use crate::document::io::read_document_file;
use crate::document::{looks_like_public_key, Document};
use crate::errors::AppResult;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// What `ejflow status` reports about a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// The inspected file.
    pub path: PathBuf,
    /// The `_public_key`, if any.
    pub public_key: Option<String>,
    /// Whether the key has the expected 64-hex shape.
    pub key_well_formed: bool,
    /// Values already in a ciphertext envelope.
    pub encrypted_values: usize,
    /// Values still in plaintext.
    pub plaintext_values: usize,
}

impl StatusReport {
    /// True when the file has a key and no plaintext secrets left.
    pub fn fully_encrypted(&self) -> bool {
        self.public_key.is_some() && self.plaintext_values == 0
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "file: {}", self.path.display())?;
        match &self.public_key {
            Some(key) if self.key_well_formed => writeln!(f, "public key: {}", key)?,
            Some(key) => writeln!(f, "public key: {} (not 64 hex characters)", key)?,
            None => writeln!(f, "public key: none")?,
        }
        writeln!(f, "encrypted values: {}", self.encrypted_values)?;
        write!(f, "plaintext values: {}", self.plaintext_values)
    }
}

/// Reads and summarizes the file at `path`.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read and `DocumentError` if it
/// is not a JSON object.
pub fn file_status(path: &Path) -> AppResult<StatusReport> {
    let document = Document::parse(&read_document_file(path)?)?;
    let summary = document.secret_summary();
    let public_key = document.public_key().map(str::to_string);

    Ok(StatusReport {
        path: path.to_path_buf(),
        key_well_formed: public_key.as_deref().is_some_and(looks_like_public_key),
        public_key,
        encrypted_values: summary.encrypted,
        plaintext_values: summary.plaintext,
    })
}
