//! # Oh My Zsh Installer Module
//!
//! Installs zsh (when missing) and then the Oh My Zsh framework.
//!
//! zsh comes from Homebrew on macOS and from the native package manager on
//! Linux. The framework installer runs unattended with `RUNZSH=no` and
//! `CHSH=no`: changing the login shell is a separate, later step, and the
//! installer must not drop into an interactive zsh in the middle of the run.
//!
//! The installer writes `~/.oh-my-zsh/oh-my-zsh.sh` slightly after its process
//! may be considered done on slow filesystems, so the step polls for it before
//! the plugin steps start writing into the framework's tree.
//!
//! The framework installer moves an existing `~/.zshrc` aside to
//! `~/.zshrc.pre-oh-my-zsh` and writes its template, so the Homebrew
//! `shellenv` line is ensured in the interactive file only after it.

use colored::Colorize;

use crate::errors::Result;
use crate::installers::{Presence, brew, ensure_installed, remote_script};
use crate::libs::context::Context;
use crate::libs::platform::{Platform, SystemPackageManager};
use crate::libs::readiness::wait_until_ready;
use crate::libs::shell_changer::zsh_candidates;
use crate::log_info;

const LABEL: &str = "Oh My Zsh";

/// Pipeline step: ensure zsh, then the framework.
pub fn run(ctx: &Context) -> Result<()> {
    ensure_zsh(ctx)?;

    let framework = ctx.framework_dir();
    ensure_installed(ctx, LABEL, &Presence::Directory(framework.clone()), || {
        install_framework(ctx)
    })?;

    let entrypoint = framework.join("oh-my-zsh.sh");
    wait_until_ready("oh-my-zsh.sh", &ctx.config.readiness, || entrypoint.is_file())?;

    brew::ensure_shellenv(ctx, &ctx.interactive_rc())
}

fn ensure_zsh(ctx: &Context) -> Result<()> {
    let presence = Presence::Program {
        name: "zsh",
        fallbacks: zsh_candidates(ctx),
    };
    ensure_installed(ctx, "zsh", &presence, || match ctx.platform {
        Platform::MacOs => brew::install_formula(ctx, "zsh"),
        Platform::Linux => SystemPackageManager::detect(ctx.runner)?.install(ctx.runner, &["zsh"]),
    })?;
    Ok(())
}

fn install_framework(ctx: &Context) -> Result<()> {
    log_info!(
        "[{}] Running the unattended installer from {}",
        LABEL,
        ctx.config.installers.oh_my_zsh_url.cyan()
    );
    let installer = remote_script(&ctx.config.installers.oh_my_zsh_url, "sh", &["--unattended"])
        .env("RUNZSH", "no")
        .env("CHSH", "no");
    ctx.runner.run_checked(&installer)?;
    Ok(())
}
