//! Decrypt a secret file to memory.

use crate::constants::SUBCOMMAND_DECRYPT;
use crate::document::io::read_document_file;
use crate::document::Document;
use crate::errors::{AppResult, DocumentError};
use crate::runner::{Ejson, Runner};
use std::path::Path;
use tracing::info;
use zeroize::Zeroizing;

/// Returns the decrypted text of the file at `path`.
///
/// The file on disk is left untouched. The returned text is wiped from memory
/// when dropped and is checked to be a JSON object.
///
/// # Errors
///
/// - `AppError::Io` if the file cannot be read
/// - `DocumentError` if the file, or the decrypted output, is not a JSON object,
///   or if the file has no `_public_key`
/// - `SubprocessError` if the binary cannot be launched or fails
pub fn decrypt_file<R: Runner>(ejson: &Ejson<R>, path: &Path) -> AppResult<Zeroizing<String>> {
    let document = Document::parse(&read_document_file(path)?)?;
    if !document.has_public_key() {
        return Err(DocumentError::MissingKey.into());
    }

    let plaintext = Zeroizing::new(ejson.run(SUBCOMMAND_DECRYPT, &[path])?);
    Document::parse(&plaintext)?;

    info!(path = %path.display(), "Decrypted secret file");
    Ok(plaintext)
}
