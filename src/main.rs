/*!
# ejflow - Keep EJSON secret files encrypted

This file contains the main application flow: it initializes logging, loads the
configuration, and dispatches the subcommand to the workflow and operations.

## Usage

```
ejflow [OPTIONS] <COMMAND>

Commands:
  decrypt     Print the decrypted content of a file without modifying it
  encrypt     Encrypt a file in place and print the refreshed content
  ensure-key  Generate and insert a _public_key if the file has none
  keygen      Generate a keypair and print the public key
  edit        Edit the decrypted content and save it back encrypted
  status      Show whether a file has a key and how much of it is encrypted
```

## Configuration

- `EJFLOW_BINARY`: The encryption binary (defaults to "ejson")
- `EJSON_KEYDIR`: Keystore directory handed to the binary
- `EJFLOW_AUTO_ENCRYPT`: Encrypt after saving (defaults to true)
- `EJFLOW_ON_DECLINE`: `save` or `abort` when key generation is declined
- `EJFLOW_EDITOR` or `EDITOR`: Editor for `ejflow edit` (defaults to "vi")
- `EJFLOW_LOG_FORMAT`: `text` or `json`; `RUST_LOG` overrides the level
*/

use ejflow::cli::{CliArgs, Commands};
use ejflow::config::Config;
use ejflow::constants::{LOG_FORMAT_JSON, TRACING_ROOT_SPAN_NAME};
use ejflow::editor::SystemEditor;
use ejflow::errors::{AppError, AppResult};
use ejflow::ops::{self, EditOutcome, EnsureKeyOutcome};
use ejflow::prompt::{Confirm, FixedAnswer, TerminalPrompt};
use ejflow::runner::Ejson;
use ejflow::workflow::{Buffer, Workflow};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. Logs go to stderr; stdout carries command output.
fn init_tracing(format: &str, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == LOG_FORMAT_JSON {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_writer(io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_writer(io::stderr),
            )
            .init();
    }
}

/// Writes `text` to `out`, adding a final newline if it lacks one.
fn write_text<W: Write>(out: &mut W, text: &str) -> AppResult<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn run(args: &CliArgs) -> AppResult<()> {
    let config = Config::load()?.with_overrides(args.overrides())?;
    config.validate()?;
    debug!(config = ?config, "Configuration loaded");

    let fixed;
    let terminal = TerminalPrompt;
    let confirm: &dyn Confirm = match args.prompt_answer() {
        Some(answer) => {
            fixed = FixedAnswer(answer);
            &fixed
        }
        None => &terminal,
    };

    let workflow = Workflow::new(&config, Ejson::from_config(&config), confirm);
    let mut stdout = io::stdout().lock();

    match &args.command {
        Commands::Decrypt { file } => {
            let mut buffer = Buffer::load(file)?;
            workflow.manual_decrypt(&mut buffer)?;
            write_text(&mut stdout, buffer.text())?;
        }
        Commands::Encrypt { file, quiet } => {
            let mut buffer = Buffer::load(file)?;
            workflow.manual_encrypt(&mut buffer)?;
            if !quiet {
                write_text(&mut stdout, buffer.text())?;
            }
        }
        Commands::EnsureKey { file } => match ops::ensure_key(workflow.ejson(), &confirm, file)? {
            EnsureKeyOutcome::AlreadyPresent(key) | EnsureKeyOutcome::Generated(key) => {
                writeln!(stdout, "{}", key)?;
            }
            EnsureKeyOutcome::Declined => {
                warn!(path = %file.display(), "No key added");
            }
        },
        Commands::Keygen => {
            let key = ops::generate_key(workflow.ejson())?;
            writeln!(stdout, "{}", key)?;
        }
        Commands::Edit { file } => {
            config.validate_editor()?;
            let editor = SystemEditor {
                editor_cmd: config.editor.clone(),
            };
            match ops::edit_file(&workflow, &editor, file)? {
                EditOutcome::Unchanged => info!(path = %file.display(), "Nothing to save"),
                EditOutcome::Saved(outcome) if outcome.encrypted => {
                    info!(path = %file.display(), "Saved and encrypted")
                }
                EditOutcome::Saved(_) => {
                    warn!(path = %file.display(), "Saved without encryption")
                }
            }
        }
        Commands::Status { file, json } => {
            let report = ops::file_status(file)?;
            if *json {
                let json =
                    serde_json::to_string_pretty(&report).map_err(AppError::Serialization)?;
                write_text(&mut stdout, &json)?;
            } else {
                write_text(&mut stdout, &report.to_string())?;
            }
        }
    }

    Ok(())
}

/// The main entry point for the ejflow application.
///
/// Errors are reported once here, on stderr, and turn into a failing exit code.
fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args.log_format, args.effective_log_level());

    let span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        correlation_id = %uuid::Uuid::new_v4()
    );
    let _guard = span.enter();

    debug!(command = ?args.command, "Starting ejflow");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
