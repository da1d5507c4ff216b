//! # Homebrew Installer Module
//!
//! Ensures Homebrew is present and wired into the shell resource files.
//!
//! ## Installation Workflow
//!
//! 1. **Presence Check** - `brew` on PATH, or an executable at one of the
//!    standard prefixes (Apple Silicon, Intel macOS, Linuxbrew system/user).
//! 2. **Prerequisites (Linux only)** - compiler toolchain, `git`, `curl`,
//!    `file` and `procps` through the detected system package manager.
//! 3. **Remote Installer** - the official `install.sh` run with
//!    `NONINTERACTIVE=1`.
//! 4. **Readiness** - the presence check is polled until `brew` appears.
//! 5. **Shell Environment** - `eval "$(<brew> shellenv)"` is ensured in the
//!    secondary resource file.
//!
//! The interactive file gets the same line from the Oh My Zsh step through
//! [`ensure_shellenv`], once the framework installer has put its own template
//! in place of any earlier `~/.zshrc`.
//!
//! Later steps call `brew` by absolute path, since the freshly installed
//! prefix is not on this process's PATH.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::errors::{Result, SetupError};
use crate::installers::{Presence, ensure_installed, remote_script};
use crate::libs::command_runner::CommandSpec;
use crate::libs::context::Context;
use crate::libs::platform::{Platform, SystemPackageManager};
use crate::libs::rc_editor::{append_if_absent, contains_pattern};
use crate::libs::readiness::wait_until_ready;
use crate::{log_debug, log_info};

const LABEL: &str = "Homebrew";

/// `<prefix>/bin/brew` for every configured prefix, in the order Homebrew prefers them.
pub fn brew_fallbacks(ctx: &Context) -> Vec<PathBuf> {
    ctx.config
        .system
        .brew_prefixes
        .iter()
        .map(|prefix| ctx.resolve(prefix).join("bin").join("brew"))
        .collect()
}

pub fn presence(ctx: &Context) -> Presence {
    Presence::Program {
        name: "brew",
        fallbacks: brew_fallbacks(ctx),
    }
}

/// Absolute path of the `brew` executable, if installed.
pub fn locate_brew(ctx: &Context) -> Option<PathBuf> {
    ctx.locate_program("brew", &brew_fallbacks(ctx))
}

/// Pipeline step: ensure Homebrew is installed and on the shell's PATH.
pub fn run(ctx: &Context) -> Result<()> {
    let presence = presence(ctx);
    ensure_installed(ctx, LABEL, &presence, || install(ctx))?;

    wait_until_ready("brew", &ctx.config.readiness, || presence.is_satisfied(ctx))?;
    let brew = locate_brew(ctx).ok_or_else(|| SetupError::NotFound("brew".to_string()))?;
    log_debug!("[{}] Using {}", LABEL, brew.display());

    append_shellenv(&brew, &ctx.secondary_rc())
}

/// Ensures the `shellenv` line in `rc` when Homebrew is installed.
pub fn ensure_shellenv(ctx: &Context, rc: &Path) -> Result<()> {
    match locate_brew(ctx) {
        Some(brew) => append_shellenv(&brew, rc),
        None => {
            log_debug!("[{}] brew not found; no shellenv line for {}", LABEL, rc.display());
            Ok(())
        }
    }
}

fn shellenv_line(brew: &Path) -> String {
    format!("eval \"$({} shellenv)\"", brew.display())
}

fn append_shellenv(brew: &Path, rc: &Path) -> Result<()> {
    append_if_absent(rc, &contains_pattern("brew shellenv"), &shellenv_line(brew))?;
    Ok(())
}

fn install(ctx: &Context) -> Result<()> {
    if ctx.platform == Platform::Linux {
        let manager = SystemPackageManager::detect(ctx.runner)?;
        manager.install(ctx.runner, manager.homebrew_prerequisites())?;
    }

    log_info!(
        "[{}] Running the official installer from {}",
        LABEL,
        ctx.config.installers.homebrew_url.cyan()
    );
    let installer =
        remote_script(&ctx.config.installers.homebrew_url, "bash", &[]).env("NONINTERACTIVE", "1");
    ctx.runner.run_checked(&installer)?;
    Ok(())
}

/// `brew install <formula>` using the located executable.
pub fn install_formula(ctx: &Context, formula: &str) -> Result<()> {
    let brew = locate_brew(ctx).ok_or_else(|| SetupError::NotFound("brew".to_string()))?;
    log_info!("[{}] brew install {}", LABEL, formula.bold());
    ctx.runner.run_checked(
        &CommandSpec::new(brew.to_string_lossy())
            .args(["install", formula])
            .inherit_output(),
    )?;
    Ok(())
}
