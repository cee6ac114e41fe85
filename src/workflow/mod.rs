//! The save/load state machine for a secret file.
//!
//! A [`Buffer`] is the in-memory view of one file. The [`Workflow`] moves it between
//! states around the two persistence callbacks:
//!
//! ```text
//!            edit                      manual_decrypt
//!   Clean ---------> Modified          Clean/Modified ---------> DecryptedView
//!     ^                 |                                              |
//!     |   save: on_before_persist -> write -> on_after_persist         | revert
//!     +-----------------+                                              |
//!     +----------------------------------------------------------------+
//! ```
//!
//! `on_before_persist` makes sure a key exists (asking first), `on_after_persist`
//! encrypts the written file and reloads the buffer from disk, since the file is
//! then the canonical encrypted form.

use crate::config::{Config, DeclinePolicy};
use crate::constants::REDACTED_PLACEHOLDER;
use crate::document::io::{read_document_file, DocumentLock};
use crate::document::Document;
use crate::errors::{AppResult, WorkflowError};
use crate::ops::{decrypt_file, encrypt_file, resolve_key, KeyDecision};
use crate::prompt::Confirm;
use crate::runner::{Ejson, Runner};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Where a buffer stands relative to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// The text matches the last persisted form.
    Clean,
    /// The text has unsaved edits.
    Modified,
    /// The text is transient decrypted output and must not be saved.
    DecryptedView,
}

/// In-memory view of a secret file.
pub struct Buffer {
    path: PathBuf,
    text: Zeroizing<String>,
    state: BufferState,
    persisted: Option<blake3::Hash>,
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("path", &self.path)
            .field("text", &REDACTED_PLACEHOLDER)
            .field("state", &self.state)
            .finish()
    }
}

impl Buffer {
    /// Loads the file at `path`.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = read_document_file(path)?;
        let persisted = Some(blake3::hash(text.as_bytes()));
        Ok(Buffer {
            path: path.to_path_buf(),
            text: Zeroizing::new(text),
            state: BufferState::Clean,
            persisted,
        })
    }

    /// A buffer for a file that has never been saved.
    pub fn unsaved(path: &Path, text: impl Into<String>) -> Self {
        Buffer {
            path: path.to_path_buf(),
            text: Zeroizing::new(text.into()),
            state: BufferState::Modified,
            persisted: None,
        }
    }

    /// The file this buffer belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current state.
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Replaces the text.
    ///
    /// A decrypted view stays a decrypted view; otherwise the buffer is `Clean`
    /// exactly when the text matches the persisted form.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Zeroizing::new(text.into());
        if self.state != BufferState::DecryptedView {
            self.state = if self.matches_persisted() {
                BufferState::Clean
            } else {
                BufferState::Modified
            };
        }
    }

    /// Discards the in-memory text and reads the file again.
    pub fn reload(&mut self) -> AppResult<()> {
        let text = read_document_file(&self.path)?;
        self.persisted = Some(blake3::hash(text.as_bytes()));
        self.text = Zeroizing::new(text);
        self.state = BufferState::Clean;
        debug!(path = %self.path.display(), "Reloaded buffer from disk");
        Ok(())
    }

    fn matches_persisted(&self) -> bool {
        self.persisted == Some(blake3::hash(self.text.as_bytes()))
    }

    fn mark_persisted(&mut self) {
        self.persisted = Some(blake3::hash(self.text.as_bytes()));
        self.state = BufferState::Clean;
    }

    fn show_decrypted(&mut self, plaintext: Zeroizing<String>) {
        self.text = plaintext;
        self.state = BufferState::DecryptedView;
    }
}

/// Decision returned by [`Workflow::on_before_persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    /// Write the buffer; encrypt afterwards if `encrypt` is set.
    Persist {
        /// Whether `on_after_persist` should run the encrypt step.
        encrypt: bool,
    },
    /// Do not write anything.
    Abort,
}

/// Result of a completed [`Workflow::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Whether the file was encrypted after writing.
    pub encrypted: bool,
}

/// Drives buffers through the save/load lifecycle.
pub struct Workflow<R: Runner, C: Confirm> {
    ejson: Ejson<R>,
    confirm: C,
    auto_encrypt: bool,
    on_decline: DeclinePolicy,
}

impl<R: Runner, C: Confirm> Workflow<R, C> {
    /// Creates a workflow using `config`'s auto-encrypt flag and decline policy.
    pub fn new(config: &Config, ejson: Ejson<R>, confirm: C) -> Self {
        Workflow {
            ejson,
            confirm,
            auto_encrypt: config.auto_encrypt,
            on_decline: config.on_decline,
        }
    }

    /// The binary client used by this workflow.
    pub fn ejson(&self) -> &Ejson<R> {
        &self.ejson
    }

    /// Runs before the buffer is written.
    ///
    /// With auto-encrypt enabled and no `_public_key` in the buffer, asks whether to
    /// generate a key. Accepting inserts the new key into the buffer. Declining
    /// follows the decline policy: `Save` writes without encrypting, `Abort` writes
    /// nothing. A buffer that already has a key is never prompted for.
    ///
    /// # Errors
    ///
    /// - `WorkflowError::DecryptedViewSave` if the buffer holds decrypted output
    /// - `DocumentError` if the buffer is not a JSON object (auto-encrypt only)
    /// - `SubprocessError` if key generation fails
    pub fn on_before_persist(&self, buffer: &mut Buffer) -> AppResult<SaveAction> {
        if buffer.state == BufferState::DecryptedView {
            return Err(WorkflowError::DecryptedViewSave {
                path: buffer.path.clone(),
            }
            .into());
        }

        if !self.auto_encrypt {
            return Ok(SaveAction::Persist { encrypt: false });
        }

        let document = Document::parse(buffer.text())?;
        match resolve_key(&self.ejson, &self.confirm, &document, &buffer.path)? {
            KeyDecision::Present => Ok(SaveAction::Persist { encrypt: true }),
            KeyDecision::Generated(keyed) => {
                buffer.set_text(keyed.to_pretty_string()?);
                info!(path = %buffer.path.display(), "Added new public key before save");
                Ok(SaveAction::Persist { encrypt: true })
            }
            KeyDecision::Declined => match self.on_decline {
                DeclinePolicy::Save => {
                    warn!(
                        path = %buffer.path.display(),
                        "Key generation declined; saving without encryption"
                    );
                    Ok(SaveAction::Persist { encrypt: false })
                }
                DeclinePolicy::Abort => Ok(SaveAction::Abort),
            },
        }
    }

    /// Runs after the buffer was written.
    ///
    /// With auto-encrypt enabled and `encrypt` set, encrypts the file and reloads
    /// the buffer from disk. If encryption fails the error is returned and the
    /// buffer is not reloaded.
    pub fn on_after_persist(&self, buffer: &mut Buffer, encrypt: bool) -> AppResult<()> {
        if !(self.auto_encrypt && encrypt) {
            debug!(path = %buffer.path.display(), "Skipping encryption after save");
            return Ok(());
        }

        encrypt_file(&self.ejson, &buffer.path)?;
        buffer.reload()
    }

    /// Saves the buffer: before-persist, write, after-persist.
    ///
    /// The file stays locked from the write until encryption finishes.
    ///
    /// # Errors
    ///
    /// Everything [`on_before_persist`](Self::on_before_persist) and
    /// [`on_after_persist`](Self::on_after_persist) return, plus
    /// `WorkflowError::KeyDeclined` when the decline policy aborts, and
    /// `LockError`/`AppError::Io` from writing.
    pub fn save(&self, buffer: &mut Buffer) -> AppResult<SaveOutcome> {
        let encrypt = match self.on_before_persist(buffer)? {
            SaveAction::Persist { encrypt } => encrypt,
            SaveAction::Abort => {
                return Err(WorkflowError::KeyDeclined {
                    path: buffer.path.clone(),
                }
                .into())
            }
        };

        let mut lock = DocumentLock::acquire(&buffer.path)?;
        lock.replace_contents(buffer.text())?;
        buffer.mark_persisted();
        info!(path = %buffer.path.display(), "Saved buffer");

        self.on_after_persist(buffer, encrypt)?;
        drop(lock);

        Ok(SaveOutcome {
            encrypted: self.auto_encrypt && encrypt,
        })
    }

    /// Saves the buffer even if it holds a decrypted view.
    ///
    /// The decrypted text is written to disk and, with auto-encrypt enabled,
    /// encrypted again right away. Otherwise identical to [`save`](Self::save).
    pub fn save_forced(&self, buffer: &mut Buffer) -> AppResult<SaveOutcome> {
        if buffer.state == BufferState::DecryptedView {
            warn!(
                path = %buffer.path.display(),
                "Forcing save of decrypted content"
            );
            buffer.state = BufferState::Modified;
        }
        self.save(buffer)
    }

    /// Replaces the view with the decrypted document, leaving the file untouched.
    ///
    /// The buffer becomes a `DecryptedView`; only [`save_forced`](Self::save_forced)
    /// will write it.
    pub fn manual_decrypt(&self, buffer: &mut Buffer) -> AppResult<()> {
        let plaintext = decrypt_file(&self.ejson, &buffer.path)?;
        buffer.show_decrypted(plaintext);
        warn!(
            path = %buffer.path.display(),
            "Buffer now holds decrypted content; it will not be saved unless forced"
        );
        Ok(())
    }

    /// Encrypts the file on disk without saving first, then reloads the buffer.
    ///
    /// Unsaved edits are discarded by the reload.
    pub fn manual_encrypt(&self, buffer: &mut Buffer) -> AppResult<()> {
        if buffer.state == BufferState::Modified {
            warn!(
                path = %buffer.path.display(),
                "Discarding unsaved changes; encrypting the file as it is on disk"
            );
        }

        let lock = DocumentLock::acquire(&buffer.path)?;
        encrypt_file(&self.ejson, &buffer.path)?;
        buffer.reload()?;
        drop(lock);
        Ok(())
    }

    /// Discards the in-memory text, including a decrypted view, and reloads.
    pub fn revert(&self, buffer: &mut Buffer) -> AppResult<()> {
        buffer.reload()
    }
}
