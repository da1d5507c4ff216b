//! Error taxonomy for the provisioning pipeline.
//!
//! Every fatal condition a step can raise is one of these variants. Warnings
//! (partial successes) never become errors; they are logged where they occur.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code used when the pipeline is stopped by SIGINT/SIGTERM.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum SetupError {
    /// The platform identifier is neither macOS nor Linux.
    #[error("unsupported platform '{0}': only macOS and Linux are supported")]
    UnsupportedPlatform(String),

    /// An external command ran and exited non-zero (or was killed).
    #[error("`{command}` failed with {}{}", describe_code(.code), stderr_tail(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("could not start `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Something expected on disk or on PATH is missing.
    #[error("{0} not found")]
    NotFound(String),

    /// The readiness poll gave up waiting for an installer's side effect.
    #[error("{what} did not become ready after {attempts} attempts")]
    NotReady { what: String, attempts: u32 },

    /// Both login-shell change mechanisms failed.
    #[error("could not change the login shell to {}:\n{instructions}", .shell.display())]
    ShellChange { shell: PathBuf, instructions: String },

    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required environment value (user name, home directory) is unavailable.
    #[error("cannot determine {0}")]
    MissingEnvironment(&'static str),

    #[error("interrupted")]
    Interrupted,
}

impl SetupError {
    /// Builds an `Io` error from a failed filesystem action on `path`.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// `true` for failures a soft-warn step may downgrade to a warning: an
    /// external command that ran and failed, or the login-shell change itself.
    /// Missing programs, local I/O and environment problems are always fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CommandFailed { .. }
                | Self::CommandSpawn { .. }
                | Self::NotReady { .. }
                | Self::ShellChange { .. }
        )
    }

    /// Maps the error to the process exit code.
    ///
    /// A failing external installer propagates its own exit code, the way a
    /// `set -e` shell script would; everything raised by the tool itself is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            Self::CommandSpawn { .. } => 127,
            Self::Interrupted => EXIT_INTERRUPTED,
            _ => 1,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn stderr_tail(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Friendly result alias.
pub type Result<T, E = SetupError> = std::result::Result<T, E>;
