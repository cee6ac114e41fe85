//! Subprocess execution for the external encryption binary.
//!
//! Every call to the binary is described by an [`Invocation`] record and executed by
//! a [`Runner`]. The keystore directory is attached to the invocation itself and set
//! only on the child process, so two [`Ejson`] clients with different keystores never
//! interfere with each other.
//!
//! Tests replace [`SystemRunner`] with their own `Runner` to avoid needing the real
//! binary.

use crate::config::Config;
use crate::constants::{DEFAULT_BINARY_COMMAND, ENV_VAR_KEYDIR};
use crate::errors::{AppResult, SubprocessError};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// A single planned call of the external binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to launch, a bare name or a path.
    pub program: String,
    /// Subcommand passed as the first argument (`keygen`, `encrypt`, `decrypt`).
    pub subcommand: String,
    /// Remaining arguments.
    pub args: Vec<OsString>,
    /// Environment variables set on the child only.
    pub env: Vec<(String, OsString)>,
}

/// Captured result of a finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub status_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl InvocationOutput {
    /// Returns true if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    /// Stdout and stderr joined, trimmed, for error reporting.
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Executes invocations.
///
/// Implementations must block until the process exits. A launch failure is an
/// `Err`; a process that ran and failed is an `Ok` output with a non-zero status.
pub trait Runner {
    /// Runs `invocation` to completion and captures its output.
    fn execute(&self, invocation: &Invocation) -> AppResult<InvocationOutput>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn execute(&self, invocation: &Invocation) -> AppResult<InvocationOutput> {
        (**self).execute(invocation)
    }
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn execute(&self, invocation: &Invocation) -> AppResult<InvocationOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .arg(&invocation.subcommand)
            .args(&invocation.args)
            .stdin(Stdio::null());
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        debug!(
            program = %invocation.program,
            subcommand = %invocation.subcommand,
            arg_count = invocation.args.len(),
            env_overrides = invocation.env.len(),
            "Launching subprocess"
        );

        let output = command.output().map_err(|e| {
            let command = invocation.program.clone();
            match e.kind() {
                std::io::ErrorKind::NotFound => SubprocessError::CommandNotFound { command, source: e },
                std::io::ErrorKind::PermissionDenied => {
                    SubprocessError::PermissionDenied { command, source: e }
                }
                _ => SubprocessError::LaunchFailed { command, source: e },
            }
        })?;

        debug!(
            subcommand = %invocation.subcommand,
            status = ?output.status.code(),
            "Subprocess finished"
        );

        Ok(InvocationOutput {
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Client for the external encryption binary.
///
/// Holds the resolved program and keystore, and turns subcommands into
/// [`Invocation`]s for its [`Runner`].
///
/// # Examples
///
/// ```no_run
/// use ejflow::runner::Ejson;
/// use ejflow::Config;
///
/// let ejson = Ejson::from_config(&Config::default());
/// let public_key = ejson.run("keygen", &["-w"])?;
/// println!("{}", public_key);
/// # Ok::<(), ejflow::AppError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Ejson<R = SystemRunner> {
    program: String,
    keydir: Option<PathBuf>,
    runner: R,
}

impl Ejson<SystemRunner> {
    /// Creates a client that launches real processes.
    pub fn from_config(config: &Config) -> Self {
        Ejson::with_runner(config, SystemRunner)
    }
}

impl<R: Runner> Ejson<R> {
    /// Creates a client with a custom runner.
    pub fn with_runner(config: &Config, runner: R) -> Self {
        let program = if config.binary.is_empty() {
            DEFAULT_BINARY_COMMAND.to_string()
        } else {
            config.binary.clone()
        };
        Ejson {
            program,
            keydir: config.keydir.clone(),
            runner,
        }
    }

    /// The program this client launches.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The runner executing this client's invocations.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Builds the invocation record for `subcommand`.
    pub fn invocation<S: AsRef<std::ffi::OsStr>>(&self, subcommand: &str, args: &[S]) -> Invocation {
        let env = self
            .keydir
            .iter()
            .map(|dir| (ENV_VAR_KEYDIR.to_string(), dir.clone().into_os_string()))
            .collect();

        Invocation {
            program: self.program.clone(),
            subcommand: subcommand.to_string(),
            args: args.iter().map(|a| a.as_ref().to_os_string()).collect(),
            env,
        }
    }

    /// Runs `subcommand` and returns its stdout without the trailing newline.
    ///
    /// # Errors
    ///
    /// - `SubprocessError::CommandNotFound`, `PermissionDenied` or `LaunchFailed`
    ///   when the process cannot be started
    /// - `SubprocessError::NonZeroExit` carrying the captured output when it fails
    pub fn run<S: AsRef<std::ffi::OsStr>>(&self, subcommand: &str, args: &[S]) -> AppResult<String> {
        let invocation = self.invocation(subcommand, args);
        let output = self.runner.execute(&invocation)?;

        if !output.success() {
            return Err(SubprocessError::NonZeroExit {
                command: invocation.program,
                subcommand: invocation.subcommand,
                status_code: output.status_code.unwrap_or(-1),
                output: output.combined_output(),
            }
            .into());
        }

        let mut stdout = output.stdout;
        let trimmed_len = stdout.trim_end_matches(['\n', '\r']).len();
        stdout.truncate(trimmed_len);
        Ok(stdout)
    }
}
