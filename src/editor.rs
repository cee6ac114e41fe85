//! Editor abstraction for the `edit` command.
//!
//! This module provides an abstraction for opening a file in an external editor,
//! so the edit flow can be tested with an editor that rewrites the file directly.

use crate::errors::{AppResult, EditorError};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Trait defining the interface for an editor component.
///
/// # Examples
///
/// ```
/// use ejflow::editor::Editor;
/// use ejflow::errors::AppResult;
/// use std::path::Path;
///
/// struct DummyEditor;
///
/// impl Editor for DummyEditor {
///     fn edit(&self, path: &Path) -> AppResult<()> {
///         println!("Would edit: {}", path.display());
///         Ok(())
///     }
/// }
///
/// DummyEditor.edit(Path::new("secrets.json")).unwrap();
/// ```
pub trait Editor {
    /// Opens `path` and returns once the user is done editing.
    ///
    /// # Errors
    ///
    /// Different implementations may return different errors when editing fails.
    fn edit(&self, path: &Path) -> AppResult<()>;
}

/// An implementation of the Editor trait that launches a system command.
///
/// The command receives the file path as its only argument and is waited on.
pub struct SystemEditor {
    /// The command to use for opening files (e.g., "vim", "code", "nano").
    pub editor_cmd: String,
}

impl Editor for SystemEditor {
    /// Launches the editor and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` with:
    /// - `EditorError::CommandNotFound` if the editor command doesn't exist
    /// - `EditorError::PermissionDenied` if permission is denied to execute it
    /// - `EditorError::ExecutionFailed` for other I/O errors during execution
    /// - `EditorError::NonZeroExit` if the editor exits with a non-zero status code
    fn edit(&self, path: &Path) -> AppResult<()> {
        debug!(editor = %self.editor_cmd, "Launching editor");

        let status = Command::new(&self.editor_cmd).arg(path).status();
        let command = self.editor_cmd.clone();

        match status {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EditorError::CommandNotFound { command, source: e }.into())
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(EditorError::PermissionDenied { command, source: e }.into())
            }
            Err(e) => Err(EditorError::ExecutionFailed { command, source: e }.into()),
            Ok(status) if !status.success() => Err(EditorError::NonZeroExit {
                command,
                status_code: status.code().unwrap_or(-1),
            }
            .into()),
            Ok(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[test]
    fn test_system_editor_not_found() {
        let editor = SystemEditor {
            editor_cmd: "ejflow-test-editor-that-does-not-exist".to_string(),
        };

        match editor.edit(Path::new("secrets.json")) {
            Err(AppError::Editor(EditorError::CommandNotFound { command, .. })) => {
                assert_eq!(command, "ejflow-test-editor-that-does-not-exist")
            }
            other => panic!("Expected CommandNotFound, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_system_editor_success_and_failure() {
        let editor = SystemEditor {
            editor_cmd: "true".to_string(),
        };
        assert!(editor.edit(Path::new("secrets.json")).is_ok());

        let editor = SystemEditor {
            editor_cmd: "false".to_string(),
        };
        match editor.edit(Path::new("secrets.json")) {
            Err(AppError::Editor(EditorError::NonZeroExit { status_code, .. })) => {
                assert_eq!(status_code, 1)
            }
            other => panic!("Expected NonZeroExit, got {:?}", other),
        }
    }
}
