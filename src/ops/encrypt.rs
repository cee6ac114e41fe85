//! Encrypt a secret file in place.

use crate::constants::SUBCOMMAND_ENCRYPT;
use crate::document::io::read_document_file;
use crate::document::Document;
use crate::errors::{AppResult, DocumentError};
use crate::runner::{Ejson, Runner};
use std::path::Path;
use tracing::{debug, info};

/// Encrypts every secret value of the file at `path`.
///
/// The binary rewrites the file on disk; callers holding the text in memory must
/// reload it afterwards.
///
/// # Errors
///
/// - `AppError::Io` if the file cannot be read
/// - `DocumentError::Malformed`/`NotAnObject` if it is not a JSON object,
///   detected before the binary is started
/// - `DocumentError::MissingKey` if it has no `_public_key`
/// - `SubprocessError` if the binary cannot be launched or fails
pub fn encrypt_file<R: Runner>(ejson: &Ejson<R>, path: &Path) -> AppResult<()> {
    let document = Document::parse(&read_document_file(path)?)?;
    if !document.has_public_key() {
        return Err(DocumentError::MissingKey.into());
    }

    let report = ejson.run(SUBCOMMAND_ENCRYPT, &[path])?;
    if !report.is_empty() {
        debug!(report = %report, "Encrypt output");
    }

    info!(path = %path.display(), "Encrypted secret file");
    Ok(())
}
