//! Constants used throughout the application.
//!
//! This module contains all constants used in ejflow, organized into logical
//! groups. Having constants centralized makes them easier to find, modify, and
//! reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "ejflow";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "Keep EJSON secret files encrypted across edit and save cycles";

// External Binary
/// Default command for the encryption binary if not specified otherwise.
pub const DEFAULT_BINARY_COMMAND: &str = "ejson";
/// Subcommand that generates a keypair.
pub const SUBCOMMAND_KEYGEN: &str = "keygen";
/// Flag passed to `keygen` so the private key is written into the keystore.
pub const KEYGEN_WRITE_FLAG: &str = "-w";
/// Subcommand that encrypts a file in place.
pub const SUBCOMMAND_ENCRYPT: &str = "encrypt";
/// Subcommand that prints the decrypted document on stdout.
pub const SUBCOMMAND_DECRYPT: &str = "decrypt";
/// Environment variable consumed by the encryption binary to locate private keys.
pub const ENV_VAR_KEYDIR: &str = "EJSON_KEYDIR";

// Document Format
/// Reserved document key holding the public key.
pub const PUBLIC_KEY_FIELD: &str = "_public_key";
/// Length of a hex-encoded public key.
pub const PUBLIC_KEY_HEX_LEN: usize = 64;
/// Prefix of values already wrapped in a ciphertext envelope.
pub const CIPHERTEXT_ENVELOPE_PREFIX: &str = "EJ[";

// Configuration Keys & Environment Variables
/// Environment variable overriding the encryption binary.
pub const ENV_VAR_EJFLOW_BINARY: &str = "EJFLOW_BINARY";
/// Environment variable toggling encryption after every save.
pub const ENV_VAR_EJFLOW_AUTO_ENCRYPT: &str = "EJFLOW_AUTO_ENCRYPT";
/// Environment variable selecting what happens when key generation is declined.
pub const ENV_VAR_EJFLOW_ON_DECLINE: &str = "EJFLOW_ON_DECLINE";
/// Environment variable for specifying the preferred editor.
pub const ENV_VAR_EJFLOW_EDITOR: &str = "EJFLOW_EDITOR";
/// Standard environment variable for specifying the default editor.
pub const ENV_VAR_EDITOR: &str = "EDITOR";
/// Environment variable selecting the log format.
pub const ENV_VAR_EJFLOW_LOG_FORMAT: &str = "EJFLOW_LOG_FORMAT";
/// Default command for the editor if not specified otherwise.
pub const DEFAULT_EDITOR_COMMAND: &str = "vi";

// Validation
/// Characters forbidden in external commands for security reasons.
pub const COMMAND_FORBIDDEN_CHARS: &[char] =
    &['|', '&', ';', '$', '(', ')', '`', '\\', '<', '>', '\'', '"'];
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// File System Parameters
/// File name prefix of the private scratch copy used by `edit`.
pub const EDIT_TEMP_PREFIX: &str = "ejflow-edit-";
/// File extension of the private scratch copy used by `edit`.
pub const EDIT_TEMP_SUFFIX: &str = ".json";

// Logging Configuration
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";
