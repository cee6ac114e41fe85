//! Key generation and the ensure-key flow.

use crate::constants::{KEYGEN_WRITE_FLAG, SUBCOMMAND_KEYGEN};
use crate::document::io::DocumentLock;
use crate::document::{insert_key, looks_like_public_key, Document};
use crate::errors::{AppResult, SubprocessError};
use crate::prompt::Confirm;
use crate::runner::{Ejson, Runner};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Generates a new keypair and returns its public key.
///
/// The binary writes the private key into the keystore itself; ejflow never
/// sees it.
///
/// # Errors
///
/// Returns the runner's `SubprocessError` if `keygen` cannot be launched or fails,
/// and `SubprocessError::EmptyOutput` if it prints no key.
pub fn generate_key<R: Runner>(ejson: &Ejson<R>) -> AppResult<String> {
    let key = ejson.run(SUBCOMMAND_KEYGEN, &[KEYGEN_WRITE_FLAG])?;
    let key = key.trim().to_string();

    if key.is_empty() {
        return Err(SubprocessError::EmptyOutput {
            command: ejson.program().to_string(),
            subcommand: SUBCOMMAND_KEYGEN.to_string(),
        }
        .into());
    }

    if !looks_like_public_key(&key) {
        warn!(
            length = key.len(),
            "Generated public key does not look like 64 hex characters"
        );
    }
    info!("Generated new keypair");
    Ok(key)
}

/// Outcome of [`resolve_key`].
#[derive(Debug, Clone, PartialEq)]
pub enum KeyDecision {
    /// The document already has a key; nothing was asked or generated.
    Present,
    /// A key was generated; the keyed document is attached.
    Generated(Document),
    /// The user declined key generation.
    Declined,
}

/// Makes sure `document` has a key, asking before generating one.
///
/// `path` only appears in the question.
pub fn resolve_key<R: Runner, C: Confirm>(
    ejson: &Ejson<R>,
    confirm: &C,
    document: &Document,
    path: &Path,
) -> AppResult<KeyDecision> {
    if document.has_public_key() {
        debug!(path = %path.display(), "Document already has a public key");
        return Ok(KeyDecision::Present);
    }

    let question = format!(
        "{} has no _public_key. Generate a new keypair?",
        path.display()
    );
    if !confirm.confirm(&question)? {
        debug!(path = %path.display(), "Key generation declined");
        return Ok(KeyDecision::Declined);
    }

    let key = generate_key(ejson)?;
    Ok(KeyDecision::Generated(insert_key(document, &key)))
}

/// What [`ensure_key`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureKeyOutcome {
    /// The file already had this key.
    AlreadyPresent(String),
    /// This key was generated and written into the file.
    Generated(String),
    /// The user declined; the file is unchanged.
    Declined,
}

/// Adds a freshly generated `_public_key` to the file at `path` if it has none.
///
/// # Errors
///
/// - `AppError::Io` if the file does not exist or cannot be read
/// - `LockError` if another process is rewriting the file
/// - `DocumentError` if the file is not a JSON object
/// - `SubprocessError` if key generation fails
pub fn ensure_key<R: Runner, C: Confirm>(
    ejson: &Ejson<R>,
    confirm: &C,
    path: &Path,
) -> AppResult<EnsureKeyOutcome> {
    // Locking creates missing files.
    fs::metadata(path)?;

    let mut lock = DocumentLock::acquire(path)?;
    let document = Document::parse(&lock.read_contents()?)?;
    if let Some(key) = document.public_key() {
        return Ok(EnsureKeyOutcome::AlreadyPresent(key.to_string()));
    }

    match resolve_key(ejson, confirm, &document, path)? {
        KeyDecision::Generated(keyed) => {
            lock.replace_contents(&keyed.to_pretty_string()?)?;
            let key = keyed.public_key().unwrap_or_default().to_string();
            info!(path = %path.display(), "Inserted new public key");
            Ok(EnsureKeyOutcome::Generated(key))
        }
        KeyDecision::Declined => Ok(EnsureKeyOutcome::Declined),
        KeyDecision::Present => Ok(EnsureKeyOutcome::AlreadyPresent(
            document.public_key().unwrap_or_default().to_string(),
        )),
    }
}
