// This module is the hub of the provisioning steps. Each submodule ensures one
// component of the workstation is installed and configured, and all of them
// share the same "check presence, install only when absent" core defined here.

use std::path::PathBuf;

use colored::Colorize;

use crate::errors::Result;
use crate::libs::command_runner::CommandSpec;
use crate::libs::context::Context;
use crate::{log_debug, log_info};

/// Homebrew: the system package manager on macOS, and on Linux for parity.
pub(crate) mod brew;
/// Resource-file finalizer: convenience alias and reload.
pub(crate) mod finalize;
/// Oh My Zsh, including zsh itself as a prerequisite.
pub(crate) mod oh_my_zsh;
/// The two git-hosted zsh plugins and the `plugins=(...)` line.
pub(crate) mod plugins;
/// Starship prompt, its theme file and its init line.
pub(crate) mod starship;
/// uv, the Python tool installer, and its environment line.
pub(crate) mod uv;

/// How a component's presence is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// A command on the search path, or an executable at one of the fallbacks.
    Program {
        name: &'static str,
        fallbacks: Vec<PathBuf>,
    },
    /// A directory on disk.
    Directory(PathBuf),
}

impl Presence {
    pub fn is_satisfied(&self, ctx: &Context) -> bool {
        match self {
            Self::Program { name, fallbacks } => ctx.locate_program(name, fallbacks).is_some(),
            Self::Directory(path) => path.is_dir(),
        }
    }
}

/// Outcome of [`ensure_installed`], logged distinctly by the caller's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyPresent,
    Installed,
}

/// The idempotent installer core.
///
/// Runs `install` only when `presence` is not satisfied. A failing install is
/// not caught: its error propagates and, under a hard-fail step, stops the run.
///
/// # Arguments
/// * `ctx`: Pipeline context used for the presence check.
/// * `label`: Component name for logs, e.g. `Homebrew`.
/// * `presence`: The check that decides whether to install.
/// * `install`: The install action.
pub fn ensure_installed<F>(
    ctx: &Context,
    label: &str,
    presence: &Presence,
    install: F,
) -> Result<InstallOutcome>
where
    F: FnOnce() -> Result<()>,
{
    if presence.is_satisfied(ctx) {
        log_info!("[{}] Already installed, skipping", label.green());
        return Ok(InstallOutcome::AlreadyPresent);
    }

    log_info!("[{}] Not found, installing...", label.yellow());
    log_debug!("[{}] Presence check was {:?}", label, presence);
    install()?;
    log_info!("[{}] Installed successfully", label.bold().green());
    Ok(InstallOutcome::Installed)
}

/// `curl -fsSL <url> | <interpreter> [-s -- <args...>]`, streamed to the terminal.
pub fn remote_script(url: &str, interpreter: &str, args: &[&str]) -> CommandSpec {
    let mut script = format!("curl -fsSL {url} | {interpreter}");
    if !args.is_empty() {
        script.push_str(" -s -- ");
        script.push_str(&args.join(" "));
    }
    CommandSpec::shell(script).inherit_output()
}
