//! Configuration management for the ejflow application.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults. Command-line flags are layered on top through
//! [`ConfigOverrides`].
//!
//! # Environment Variables
//!
//! - `EJFLOW_BINARY`: Encryption binary to run (defaults to "ejson")
//! - `EJSON_KEYDIR`: Keystore directory handed to the binary (optional)
//! - `EJFLOW_AUTO_ENCRYPT`: Encrypt after every save (defaults to true)
//! - `EJFLOW_ON_DECLINE`: `save` or `abort` when key generation is declined (defaults to `save`)
//! - `EJFLOW_EDITOR`: Editor used by `ejflow edit`
//! - `EDITOR`: Fallback editor if EJFLOW_EDITOR is not set (defaults to "vi")

use crate::constants::{
    COMMAND_FORBIDDEN_CHARS, DEFAULT_BINARY_COMMAND, DEFAULT_EDITOR_COMMAND, ENV_VAR_EDITOR,
    ENV_VAR_EJFLOW_AUTO_ENCRYPT, ENV_VAR_EJFLOW_BINARY, ENV_VAR_EJFLOW_EDITOR,
    ENV_VAR_EJFLOW_ON_DECLINE, ENV_VAR_KEYDIR, REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What the save workflow does when a keyless document is saved and the user
/// declines key generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DeclinePolicy {
    /// Persist the document as-is and skip encryption for this save.
    #[default]
    Save,
    /// Abort the save; nothing is written.
    Abort,
}

impl FromStr for DeclinePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "save" => Ok(DeclinePolicy::Save),
            "abort" => Ok(DeclinePolicy::Abort),
            other => Err(AppError::Config(format!(
                "Invalid decline policy '{}'. Expected 'save' or 'abort'",
                other
            ))),
        }
    }
}

/// Configuration for the ejflow application.
///
/// Built once at startup and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use ejflow::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     keydir: Some(PathBuf::from("/opt/ejson/keys")),
///     ..Config::default()
/// };
/// assert_eq!(config.binary, "ejson");
/// assert!(config.auto_encrypt);
/// ```
#[derive(Clone)]
pub struct Config {
    /// Encryption binary, either a bare name looked up in `PATH` or a path.
    pub binary: String,

    /// Keystore directory passed to the binary through `EJSON_KEYDIR`.
    ///
    /// `None` leaves the binary's own default in place.
    pub keydir: Option<PathBuf>,

    /// Run `encrypt` after every save.
    pub auto_encrypt: bool,

    /// Editor command used by `ejflow edit`.
    ///
    /// This is loaded from environment variables in the following order of precedence:
    /// 1. EJFLOW_EDITOR
    /// 2. EDITOR
    /// 3. Defaults to "vi" if neither is set
    pub editor: String,

    /// Behavior when key generation is declined during a save.
    pub on_decline: DeclinePolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("binary", &self.binary)
            .field(
                "keydir",
                &self.keydir.as_ref().map(|_| REDACTED_PLACEHOLDER),
            )
            .field("auto_encrypt", &self.auto_encrypt)
            .field("editor", &"[REDACTED_COMMAND]")
            .field("on_decline", &self.on_decline)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            binary: DEFAULT_BINARY_COMMAND.to_string(),
            keydir: None,
            auto_encrypt: true,
            editor: DEFAULT_EDITOR_COMMAND.to_string(),
            on_decline: DeclinePolicy::default(),
        }
    }
}

/// Values given on the command line that take precedence over the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Replacement for `Config::binary`.
    pub binary: Option<String>,
    /// Replacement for `Config::keydir`.
    pub keydir: Option<PathBuf>,
    /// Replacement for `Config::auto_encrypt`.
    pub auto_encrypt: Option<bool>,
    /// Replacement for `Config::on_decline`.
    pub on_decline: Option<DeclinePolicy>,
}

impl Config {
    /// Validates an external command string for security.
    ///
    /// This function checks that the command:
    /// - Is not empty
    /// - Contains no shell metacharacters
    /// - Contains no spaces
    ///
    /// `what` names the command in error messages ("Editor", "Binary").
    fn validate_command<'a>(what: &str, cmd: &'a str) -> AppResult<&'a str> {
        if cmd.is_empty() {
            return Err(AppError::Config(format!(
                "{} command cannot be empty",
                what
            )));
        }

        if cmd.contains(' ') {
            return Err(AppError::Config(format!(
                "{} command cannot contain spaces. Use a wrapper script for commands requiring arguments",
                what
            )));
        }

        for &ch in COMMAND_FORBIDDEN_CHARS.iter() {
            if cmd.contains(ch) {
                return Err(AppError::Config(format!(
                    "{} command cannot contain shell metacharacters: '{}'. Use a wrapper script instead",
                    what, ch
                )));
            }
        }

        Ok(cmd)
    }

    /// Parses a boolean environment value.
    fn parse_bool(name: &str, raw: &str) -> AppResult<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(AppError::Config(format!(
                "Invalid boolean '{}' for {}. Expected true or false",
                other, name
            ))),
        }
    }

    /// Expands `~` and environment references in a keystore path.
    fn expand_keydir(raw: &str) -> AppResult<PathBuf> {
        let expanded = shellexpand::full(raw)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
        Ok(PathBuf::from(expanded.into_owned()))
    }

    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - The keystore path expansion fails
    /// - `EJFLOW_AUTO_ENCRYPT` or `EJFLOW_ON_DECLINE` hold unrecognized values
    /// - The binary command fails validation
    ///
    /// The editor is only resolved here; [`validate_editor`](Self::validate_editor)
    /// checks it when a command actually launches it.
    pub fn load() -> AppResult<Self> {
        let binary_raw =
            env::var(ENV_VAR_EJFLOW_BINARY).unwrap_or_else(|_| DEFAULT_BINARY_COMMAND.to_string());
        let binary = Config::validate_command("Binary", &binary_raw)?.to_string();

        let editor = env::var(ENV_VAR_EJFLOW_EDITOR)
            .or_else(|_| env::var(ENV_VAR_EDITOR))
            .unwrap_or_else(|_| DEFAULT_EDITOR_COMMAND.to_string());

        let keydir = match env::var(ENV_VAR_KEYDIR) {
            Ok(raw) if !raw.is_empty() => Some(Config::expand_keydir(&raw)?),
            _ => None,
        };

        let auto_encrypt = match env::var(ENV_VAR_EJFLOW_AUTO_ENCRYPT) {
            Ok(raw) => Config::parse_bool(ENV_VAR_EJFLOW_AUTO_ENCRYPT, &raw)?,
            Err(_) => true,
        };

        let on_decline = match env::var(ENV_VAR_EJFLOW_ON_DECLINE) {
            Ok(raw) => raw.parse()?,
            Err(_) => DeclinePolicy::default(),
        };

        Ok(Config {
            binary,
            keydir,
            auto_encrypt,
            editor,
            on_decline,
        })
    }

    /// Applies command-line overrides on top of the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an overriding binary fails validation.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> AppResult<Self> {
        if let Some(binary) = overrides.binary {
            self.binary = Config::validate_command("Binary", &binary)?.to_string();
        }
        if let Some(keydir) = overrides.keydir {
            self.keydir = Some(Config::expand_keydir(&keydir.to_string_lossy())?);
        }
        if let Some(auto_encrypt) = overrides.auto_encrypt {
            self.auto_encrypt = auto_encrypt;
        }
        if let Some(on_decline) = overrides.on_decline {
            self.on_decline = on_decline;
        }
        Ok(self)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the binary is empty, or if the keystore
    /// directory is set but is not a directory.
    pub fn validate(&self) -> AppResult<()> {
        if self.binary.is_empty() {
            return Err(AppError::Config("Binary command is empty".to_string()));
        }

        if let Some(keydir) = &self.keydir {
            if keydir.as_os_str().is_empty() {
                return Err(AppError::Config("Keystore directory path is empty".to_string()));
            }
            if keydir.exists() && !keydir.is_dir() {
                return Err(AppError::Config(format!(
                    "Keystore path is not a directory: {}",
                    keydir.display()
                )));
            }
        }

        Ok(())
    }

    /// Validates the editor command before `ejflow edit` launches it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the editor is empty, contains spaces, or
    /// contains shell metacharacters.
    pub fn validate_editor(&self) -> AppResult<()> {
        Config::validate_command("Editor", &self.editor)?;
        Ok(())
    }
}
