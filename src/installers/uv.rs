//! # uv Installer Module
//!
//! Installs [uv](https://docs.astral.sh/uv/) with its standalone installer
//! and makes its environment script part of every new shell.
//!
//! The standalone installer puts `uv` in `~/.local/bin` and writes
//! `~/.local/bin/env`, a small script that adds that directory to PATH.
//! Sourcing it from both resource files keeps `uv` reachable from zsh as
//! well as from bash scripts.

use std::path::PathBuf;

use colored::Colorize;

use crate::errors::Result;
use crate::installers::{Presence, ensure_installed, remote_script};
use crate::libs::context::Context;
use crate::libs::rc_editor::{append_if_absent, contains_pattern};
use crate::{log_debug, log_info};

const LABEL: &str = "uv";

pub const ENV_LINE: &str = r#". "$HOME/.local/bin/env""#;

fn fallbacks(ctx: &Context) -> Vec<PathBuf> {
    vec![ctx.home().join(".local/bin/uv")]
}

fn presence(ctx: &Context) -> Presence {
    Presence::Program {
        name: "uv",
        fallbacks: fallbacks(ctx),
    }
}

pub fn locate_uv(ctx: &Context) -> Option<PathBuf> {
    ctx.locate_program("uv", &fallbacks(ctx))
}

/// Pipeline step: ensure uv and its environment line.
pub fn run(ctx: &Context) -> Result<()> {
    ensure_installed(ctx, LABEL, &presence(ctx), || {
        log_info!(
            "[{}] Running the standalone installer from {}",
            LABEL,
            ctx.config.installers.uv_url.cyan()
        );
        ctx.runner
            .run_checked(&remote_script(&ctx.config.installers.uv_url, "sh", &[]))?;
        Ok(())
    })?;
    if let Some(uv) = locate_uv(ctx) {
        log_debug!("[{}] Using {}", LABEL, uv.display());
    }

    let detect = contains_pattern(".local/bin/env");
    for rc in [ctx.interactive_rc(), ctx.secondary_rc()] {
        append_if_absent(&rc, &detect, ENV_LINE)?;
    }
    Ok(())
}
