//! Error handling utilities for the ejflow application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents specific error cases that can occur when running the encryption binary.
///
/// Each variant captures the command that was attempted so the message can point
/// the user at the right installation or keystore problem.
///
/// # Examples
///
/// ```
/// use ejflow::errors::SubprocessError;
///
/// let error = SubprocessError::NonZeroExit {
///     command: "ejson".to_string(),
///     subcommand: "encrypt".to_string(),
///     status_code: 1,
///     output: "error: bad key".to_string(),
/// };
///
/// assert!(format!("{}", error).contains("error: bad key"));
/// assert!(format!("{}", error).contains("encrypt"));
/// ```
#[derive(Debug, Error)]
pub enum SubprocessError {
    /// The binary could not be found on disk or in `PATH`.
    #[error("Command '{command}' not found: {source}. Please check that it is installed and available in your PATH, or set EJFLOW_BINARY.")]
    CommandNotFound {
        /// The command that was not found
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The binary exists but may not be executed.
    #[error("Permission denied when trying to execute '{command}': {source}. Please check the file's executable bit.")]
    PermissionDenied {
        /// The command that had permission denied
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Any other failure while spawning or waiting on the process.
    #[error("Failed to launch '{command}': {source}")]
    LaunchFailed {
        /// The command that failed to launch
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The binary ran and reported failure.
    ///
    /// `output` is the captured diagnostic text, shown verbatim.
    #[error("'{command} {subcommand}' exited with status {status_code}: {output}")]
    NonZeroExit {
        /// The command that exited with a non-zero status
        command: String,
        /// The subcommand that was invoked
        subcommand: String,
        /// The exit status code, or -1 when killed by a signal
        status_code: i32,
        /// Captured stdout and stderr
        output: String,
    },

    /// The binary succeeded but printed nothing where output was required.
    #[error("'{command} {subcommand}' succeeded but printed no output. Please check the binary and keystore.")]
    EmptyOutput {
        /// The command that was run
        command: String,
        /// The subcommand that was invoked
        subcommand: String,
    },
}

/// Problems with the JSON document itself.
///
/// These are detected before any subprocess is started.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The text is not valid JSON.
    #[error("Malformed document: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The text is valid JSON but the root is not an object.
    #[error("Malformed document: root must be a JSON object, found {found}")]
    NotAnObject {
        /// Kind of JSON value found at the root
        found: &'static str,
    },

    /// The document has no `_public_key`.
    #[error("Document has no _public_key. Run 'ejflow ensure-key' to generate one.")]
    MissingKey,
}

/// Represents specific error cases that can occur when interacting with external editors.
///
/// # Examples
///
/// ```
/// use ejflow::errors::EditorError;
///
/// let error = EditorError::NonZeroExit {
///     command: "vim".to_string(),
///     status_code: 1,
/// };
///
/// assert!(format!("{}", error).contains("non-zero status code"));
/// assert!(format!("{}", error).contains("vim"));
/// ```
#[derive(Debug, Error)]
pub enum EditorError {
    /// Error when the specified editor command cannot be found.
    #[error("Editor command '{command}' not found: {source}. Please check that the editor is installed and available in your PATH.")]
    CommandNotFound {
        /// The editor command that was not found
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when permission is denied to execute the editor command.
    #[error("Permission denied when trying to execute editor '{command}': {source}. Please check file permissions or try running with appropriate access rights.")]
    PermissionDenied {
        /// The editor command that had permission denied
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor command fails to execute due to other I/O errors.
    #[error("Failed to execute editor '{command}': {source}. Please check system resources or editor installation.")]
    ExecutionFailed {
        /// The editor command that failed to execute
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor exits with a non-zero status code.
    #[error("Editor '{command}' exited with non-zero status code: {status_code}. The original file was left untouched.")]
    NonZeroExit {
        /// The editor command that exited with a non-zero status
        command: String,
        /// The exit status code
        status_code: i32,
    },
}

/// Represents errors that can occur when attempting to lock secret files.
///
/// # Examples
///
/// ```
/// use ejflow::errors::LockError;
/// use std::path::PathBuf;
///
/// let error = LockError::FileBusy {
///     path: PathBuf::from("/path/to/secrets.ejson"),
/// };
///
/// assert!(format!("{}", error).contains("being rewritten"));
/// ```
#[derive(Debug, Error)]
pub enum LockError {
    /// Error when the file is already locked by another process.
    #[error("Secret file is currently being rewritten by another process: {path}. Please wait for the other ejflow process to finish.")]
    FileBusy {
        /// The path to the file that is locked
        path: PathBuf,
    },

    /// Error when acquiring the lock fails for a technical reason.
    #[error("Failed to acquire lock for {path}: {source}. Please check file permissions.")]
    AcquisitionFailed {
        /// The path to the file that couldn't be locked
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Refusals raised by the save/load state machine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A save was requested while the buffer holds decrypted plaintext.
    #[error("Refusing to save {path}: the buffer holds decrypted content. Revert or re-encrypt before saving.")]
    DecryptedViewSave {
        /// The file the buffer belongs to
        path: PathBuf,
    },

    /// Key generation was declined and the decline policy aborts the save.
    #[error("Save of {path} aborted: no _public_key and key generation was declined.")]
    KeyDeclined {
        /// The file the buffer belongs to
        path: PathBuf,
    },
}

/// Represents all possible errors that can occur in the ejflow application.
///
/// This enum is the central error type used across the application, with variants
/// for different error categories. It uses `thiserror` for deriving the `Error` trait
/// implementation and formatted error messages.
///
/// # Examples
///
/// ```
/// use ejflow::errors::AppError;
///
/// let error = AppError::Config("Binary command cannot be empty".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Binary command cannot be empty");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from launching or running the encryption binary.
    #[error("Subprocess error: {0}")]
    Subprocess(#[from] SubprocessError),

    /// Errors in the secret document.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Errors when interacting with the text editor.
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// Errors related to file locking.
    #[error("File locking error: {0}")]
    Lock(#[from] LockError),

    /// Save/load workflow refusals.
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Failure to render a document or report as JSON.
    #[error("Failed to serialize JSON output: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;
