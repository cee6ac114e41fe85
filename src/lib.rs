/*!
# ejflow

ejflow keeps EJSON secret files encrypted across edit and save cycles. It drives an
external encryption binary (`ejson` by default) as a subprocess and only ever edits
one field of the document itself: `_public_key`.

## Core Features

- Decrypt a file to stdout without touching it on disk
- Encrypt a file in place
- Generate and insert a `_public_key` when a file has none, after asking
- Edit the decrypted content in `$EDITOR` and save it back encrypted
- Report how much of a file is still plaintext

## Architecture

- `runner`: Subprocess invocation records and the `Runner` seam
- `document`: The JSON document model and `_public_key` handling
- `ops`: Key generation, encrypt, decrypt, edit and status operations
- `workflow`: The save/load state machine around a buffer
- `prompt`: Yes/no confirmation
- `editor`: External editor launching
- `cli`, `config`, `errors`, `constants`: The ambient plumbing

## Usage Example

```rust,no_run
use ejflow::prompt::TerminalPrompt;
use ejflow::runner::Ejson;
use ejflow::workflow::{Buffer, Workflow};
use ejflow::Config;
use std::path::Path;

fn main() -> ejflow::AppResult<()> {
    let config = Config::load()?;
    let workflow = Workflow::new(&config, Ejson::from_config(&config), TerminalPrompt);

    let mut buffer = Buffer::load(Path::new("config/secrets.ejson"))?;
    buffer.set_text("{\"database_password\": \"hunter2\"}\n");
    workflow.save(&mut buffer)?;
    Ok(())
}
```
*/

/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Application constants
pub mod constants;
/// The secret document model
pub mod document;
/// External editor launching
pub mod editor;
/// Error types and utilities for error handling
pub mod errors;
/// User-facing operations
pub mod ops;
/// Yes/no confirmation
pub mod prompt;
/// Subprocess execution
pub mod runner;
/// The save/load state machine
pub mod workflow;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use document::Document;
pub use errors::{AppError, AppResult};
pub use workflow::{Buffer, BufferState, Workflow};
