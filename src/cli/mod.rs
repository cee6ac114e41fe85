use crate::config::{ConfigOverrides, DeclinePolicy};
use crate::constants::{DEFAULT_LOG_LEVEL, ENV_VAR_EJFLOW_LOG_FORMAT, LOG_FORMAT_JSON, LOG_FORMAT_TEXT};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keep EJSON secret files encrypted across edit and save cycles
#[derive(Parser, Debug)]
#[clap(name = "ejflow", about = "Keep EJSON secret files encrypted across edit and save cycles")]
#[clap(author, version, long_about = None)]
pub struct CliArgs {
    /// Encryption binary to run instead of `ejson`
    #[clap(long, global = true, value_name = "PATH")]
    pub binary: Option<String>,

    /// Keystore directory passed to the binary as EJSON_KEYDIR
    #[clap(long, global = true, value_name = "DIR")]
    pub keydir: Option<PathBuf>,

    /// Do not encrypt after saving
    #[clap(long, global = true)]
    pub no_auto_encrypt: bool,

    /// Answer yes to the key generation prompt
    #[clap(short = 'y', long, global = true, conflicts_with = "no")]
    pub yes: bool,

    /// Answer no to the key generation prompt
    #[clap(long, global = true)]
    pub no: bool,

    /// What to do when key generation is declined during a save
    #[clap(long, global = true, value_enum, value_name = "POLICY")]
    pub on_decline: Option<DeclinePolicy>,

    /// Log output format
    #[clap(
        long,
        global = true,
        env = ENV_VAR_EJFLOW_LOG_FORMAT,
        default_value = LOG_FORMAT_TEXT,
        value_parser = [LOG_FORMAT_TEXT, LOG_FORMAT_JSON]
    )]
    pub log_format: String,

    /// Log level used when RUST_LOG is not set
    #[clap(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Print verbose output
    #[clap(short = 'v', long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Print the decrypted content of a file without modifying it
    Decrypt {
        /// The secret file
        file: PathBuf,
    },

    /// Encrypt a file in place and print the refreshed content
    Encrypt {
        /// The secret file
        file: PathBuf,

        /// Do not print the encrypted content
        #[clap(short = 'q', long)]
        quiet: bool,
    },

    /// Generate and insert a _public_key if the file has none
    EnsureKey {
        /// The secret file
        file: PathBuf,
    },

    /// Generate a keypair and print the public key
    Keygen,

    /// Edit the decrypted content and save it back encrypted
    Edit {
        /// The secret file, created if missing
        file: PathBuf,
    },

    /// Show whether a file has a key and how much of it is encrypted
    Status {
        /// The secret file
        file: PathBuf,

        /// Print the report as JSON
        #[clap(long)]
        json: bool,
    },
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        CliArgs::parse_from(std::env::args())
    }

    /// Configuration values given on the command line.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            binary: self.binary.clone(),
            keydir: self.keydir.clone(),
            auto_encrypt: self.no_auto_encrypt.then_some(false),
            on_decline: self.on_decline,
        }
    }

    /// The fixed answer to the key prompt, if one was given.
    pub fn prompt_answer(&self) -> Option<bool> {
        match (self.yes, self.no) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Effective log level, raised to debug by `--verbose`.
    pub fn effective_log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}
