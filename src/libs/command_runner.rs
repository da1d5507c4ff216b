//! Execution of external programs.
//!
//! Every installer, package manager, `sudo` and `git` invocation goes through
//! the [`CommandRunner`] trait so that the pipeline can be exercised against a
//! recording fake in tests while production spawns real processes.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use colored::Colorize;

use crate::errors::{Result, SetupError};
use crate::libs::utilities::path_helpers::find_on_path;
use crate::log_debug;

/// How the child's stdout/stderr are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stream straight to the terminal. Used for long-running installers.
    Inherit,
    /// Collect into [`CommandOutput`]. Used for checks and short commands.
    Capture,
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
            output: OutputMode::Capture,
        }
    }

    /// A command line interpreted by `sh -c`, used for `curl | sh` installers.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// `sudo <program> <args...>`.
    pub fn sudo<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("sudo").args(args)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.output = OutputMode::Inherit;
        self
    }

    /// Renders the command the way it would be typed, for logs and errors.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a command that was started successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam between the pipeline and the operating system's process table.
pub trait CommandRunner {
    /// Runs the command to completion. A non-zero exit is *not* an error here;
    /// only failing to start the program is.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Looks `program` up on the search path, like `command -v`.
    fn find_program(&self, program: &str) -> Option<PathBuf>;

    /// Runs the command and turns a non-zero exit into [`SetupError::CommandFailed`].
    /// This is the fail-fast path used by every installer invocation.
    fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(spec)?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(SetupError::CommandFailed {
                command: spec.command_line(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

/// Production runner backed by `std::process::Command`.
pub struct SystemRunner {
    search_path: Option<OsString>,
}

impl SystemRunner {
    /// Captures the current `PATH` for program lookups.
    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        log_debug!("[Runner] Executing: {}", spec.command_line().cyan());

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        for (key, value) in &spec.env {
            command.env(key, value);
        }
        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        match spec.output {
            OutputMode::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Capture => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let spawn_error = |source| SetupError::CommandSpawn {
            program: spec.program.clone(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;

        if let Some(input) = &spec.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes()).map_err(spawn_error)?;
                // Dropping the pipe closes it so `tee` and friends see EOF.
            }
        }

        let output = child.wait_with_output().map_err(spawn_error)?;
        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        log_debug!(
            "[Runner] `{}` exited with {:?}",
            spec.command_line().dimmed(),
            result.code
        );
        if !result.stdout.trim().is_empty() {
            log_debug!("[Runner] stdout: {}", result.stdout.trim());
        }
        Ok(result)
    }

    fn find_program(&self, program: &str) -> Option<PathBuf> {
        find_on_path(program, self.search_path.as_deref())
    }
}
