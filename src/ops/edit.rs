//! Edit a secret file in plaintext and save it back encrypted.
//!
//! # Flow
//!
//! 1. Decrypt the file (or take it as-is when it has no key yet, or start from
//!    an empty object when it does not exist)
//! 2. Write the plaintext to a private scratch file and open it in the editor
//! 3. If the content changed, run the save workflow on the original path:
//!    ensure a key, write, encrypt, reload
//!
//! The scratch file is overwritten with zeros before it is removed.

use crate::constants::{EDIT_TEMP_PREFIX, EDIT_TEMP_SUFFIX};
use crate::document::io::read_document_file;
use crate::document::Document;
use crate::editor::Editor;
use crate::errors::AppResult;
use crate::ops::decrypt_file;
use crate::prompt::Confirm;
use crate::runner::Runner;
use crate::workflow::{Buffer, SaveOutcome, Workflow};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Starting text for a file that does not exist yet.
const NEW_DOCUMENT_TEMPLATE: &str = "{\n}\n";

/// What [`edit_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The editor exited without changing anything; nothing was written.
    Unchanged,
    /// The edited document was saved.
    Saved(SaveOutcome),
}

/// A scratch file that is scrubbed and deleted on drop unless kept.
struct Scratch(Option<NamedTempFile>);

impl Scratch {
    fn create(contents: &str) -> AppResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(EDIT_TEMP_PREFIX)
            .suffix(EDIT_TEMP_SUFFIX)
            .tempfile()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(Scratch(Some(file)))
    }

    fn path(&self) -> Option<&Path> {
        self.0.as_ref().map(NamedTempFile::path)
    }

    fn keep(mut self) -> AppResult<Option<PathBuf>> {
        match self.0.take() {
            Some(file) => {
                let (_, path) = file.keep().map_err(std::io::Error::from)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if let Some(file) = self.0.take() {
            if let Err(e) = scrub(file.path()) {
                debug!(error = %e, "Failed to scrub scratch file");
            }
        }
    }
}

/// Best-effort overwrite with zeros.
///
/// Not a guarantee on journaling filesystems or SSDs.
fn scrub(path: &Path) -> std::io::Result<()> {
    let len = fs::metadata(path)?.len();
    fs::write(path, vec![0u8; len as usize])
}

/// Opens the decrypted content of `path` in `editor` and saves changes back
/// through `workflow`.
///
/// # Errors
///
/// - `DocumentError` if the file or the edited text is not a JSON object; in the
///   second case the scratch file is kept and its path logged
/// - `EditorError` if the editor fails; the original file is untouched
/// - any error of [`decrypt_file`] or [`Workflow::save`]
pub fn edit_file<R: Runner, C: Confirm, E: Editor>(
    workflow: &Workflow<R, C>,
    editor: &E,
    path: &Path,
) -> AppResult<EditOutcome> {
    let exists = path.exists();
    let plaintext = if exists {
        let text = read_document_file(path)?;
        if Document::parse(&text)?.has_public_key() {
            decrypt_file(workflow.ejson(), path)?
        } else {
            Zeroizing::new(text)
        }
    } else {
        debug!(path = %path.display(), "Starting a new document");
        Zeroizing::new(NEW_DOCUMENT_TEMPLATE.to_string())
    };

    let scratch = Scratch::create(&plaintext)?;
    let scratch_path = scratch
        .path()
        .map(Path::to_path_buf)
        .ok_or_else(|| std::io::Error::other("scratch file missing"))?;

    editor.edit(&scratch_path)?;
    let edited = Zeroizing::new(fs::read_to_string(&scratch_path)?);

    if blake3::hash(edited.as_bytes()) == blake3::hash(plaintext.as_bytes()) {
        info!(path = %path.display(), "No changes");
        return Ok(EditOutcome::Unchanged);
    }

    if let Err(e) = Document::parse(&edited) {
        if let Some(kept) = scratch.keep()? {
            warn!(
                scratch = %kept.display(),
                "Edited text is not a valid document; your changes were kept in the scratch file"
            );
        }
        return Err(e);
    }
    drop(scratch);

    let mut buffer = if exists {
        let mut buffer = Buffer::load(path)?;
        buffer.set_text(edited.as_str());
        buffer
    } else {
        Buffer::unsaved(path, edited.as_str())
    };

    let outcome = workflow.save(&mut buffer)?;
    Ok(EditOutcome::Saved(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::errors::{AppError, DocumentError, EditorError};
    use crate::ops::test_support::{RecordingConfirm, ScriptedRunner};
    use crate::runner::Ejson;
    use std::cell::RefCell;
    use tempfile::tempdir;

    const ENCRYPTED: &str = "{\n  \"_public_key\": \"abc123\",\n  \"a\": \"EJ[1:x]\"\n}\n";

    /// Records what it was shown and optionally replaces it.
    struct ScriptedEditor {
        replacement: Option<String>,
        seen: RefCell<Option<String>>,
    }

    impl ScriptedEditor {
        fn writing(replacement: Option<&str>) -> Self {
            ScriptedEditor {
                replacement: replacement.map(str::to_string),
                seen: RefCell::new(None),
            }
        }
    }

    impl Editor for ScriptedEditor {
        fn edit(&self, path: &Path) -> AppResult<()> {
            *self.seen.borrow_mut() = Some(fs::read_to_string(path)?);
            if let Some(text) = &self.replacement {
                fs::write(path, text)?;
            }
            Ok(())
        }
    }

    struct FailingEditor;

    impl Editor for FailingEditor {
        fn edit(&self, _path: &Path) -> AppResult<()> {
            Err(EditorError::NonZeroExit {
                command: "vim".to_string(),
                status_code: 1,
            }
            .into())
        }
    }

    #[test]
    fn test_edit_decrypts_and_saves_encrypted() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("secrets.json");
        fs::write(&path, ENCRYPTED).unwrap();

        let runner = ScriptedRunner::new()
            .respond("decrypt", 0, "{\"_public_key\": \"abc123\", \"a\": \"1\"}\n")
            .rewrite_on("encrypt", ENCRYPTED);
        let confirm = RecordingConfirm::new(true);
        let config = Config::default();
        let flow = Workflow::new(&config, Ejson::with_runner(&config, &runner), &confirm);
        let editor = ScriptedEditor::writing(Some("{\"_public_key\": \"abc123\", \"a\": \"2\"}"));

        let outcome = edit_file(&flow, &editor, &path).unwrap();

        assert_eq!(outcome, EditOutcome::Saved(SaveOutcome { encrypted: true }));
        assert_eq!(
            editor.seen.borrow().as_deref(),
            Some("{\"_public_key\": \"abc123\", \"a\": \"1\"}")
        );
        assert_eq!(runner.subcommands(), vec!["decrypt", "encrypt"]);
        assert!(confirm.questions().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), ENCRYPTED);
    }

    #[test]
    fn test_edit_unchanged_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("secrets.json");
        fs::write(&path, ENCRYPTED).unwrap();

        let runner = ScriptedRunner::new().respond("decrypt", 0, "{\"_public_key\": \"abc123\"}");
        let confirm = RecordingConfirm::new(true);
        let config = Config::default();
        let flow = Workflow::new(&config, Ejson::with_runner(&config, &runner), &confirm);

        let outcome = edit_file(&flow, &ScriptedEditor::writing(None), &path).unwrap();

        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(runner.subcommands(), vec!["decrypt"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), ENCRYPTED);
    }

    #[test]
    fn test_edit_new_file_generates_key() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("new.json");

        let runner = ScriptedRunner::new()
            .respond("keygen", 0, "abc123")
            .rewrite_on("encrypt", ENCRYPTED);
        let confirm = RecordingConfirm::new(true);
        let config = Config::default();
        let flow = Workflow::new(&config, Ejson::with_runner(&config, &runner), &confirm);
        let editor = ScriptedEditor::writing(Some("{\"a\": \"1\"}"));

        edit_file(&flow, &editor, &path).unwrap();

        assert_eq!(editor.seen.borrow().as_deref(), Some(NEW_DOCUMENT_TEMPLATE));
        assert_eq!(confirm.questions().len(), 1);
        assert_eq!(runner.subcommands(), vec!["keygen", "encrypt"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), ENCRYPTED);
    }

    #[test]
    fn test_edit_rejects_invalid_result_and_keeps_original() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("secrets.json");
        fs::write(&path, ENCRYPTED).unwrap();

        let runner = ScriptedRunner::new().respond("decrypt", 0, "{\"_public_key\": \"abc123\"}");
        let confirm = RecordingConfirm::new(true);
        let config = Config::default();
        let flow = Workflow::new(&config, Ejson::with_runner(&config, &runner), &confirm);

        let result = edit_file(&flow, &ScriptedEditor::writing(Some("{ broken")), &path);

        assert!(matches!(
            result,
            Err(AppError::Document(DocumentError::Malformed(_)))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), ENCRYPTED);
    }

    #[test]
    fn test_edit_editor_failure_leaves_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("secrets.json");
        fs::write(&path, "{\"a\": \"1\"}").unwrap();

        let runner = ScriptedRunner::new();
        let confirm = RecordingConfirm::new(true);
        let config = Config::default();
        let flow = Workflow::new(&config, Ejson::with_runner(&config, &runner), &confirm);

        assert!(matches!(
            edit_file(&flow, &FailingEditor, &path),
            Err(AppError::Editor(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\": \"1\"}");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_scrub_zeroes_contents() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("scratch.json");
        fs::write(&path, "secret").unwrap();

        scrub(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![0u8; 6]);
    }
}
