//! # Starship Prompt
//!
//! - **Prompt** step: installs `starship` (Homebrew on macOS, the official
//!   script on Linux) and ensures `eval "$(starship init zsh)"` is in the
//!   interactive resource file.
//! - **Theme** step: regenerates the prompt configuration from a named preset
//!   with `starship preset <name> -o <path>`.
//!
//! The theme file is rewritten on every run so a changed preset in the
//! configuration takes effect. A failing `starship preset` is a step error and
//! is handled by the theme step's policy (hard-fail unless configured
//! otherwise). A missing `starship` binary or a generated file that is not
//! valid TOML only logs a warning.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::errors::{Result, SetupError};
use crate::installers::{Presence, brew, ensure_installed, remote_script};
use crate::libs::command_runner::CommandSpec;
use crate::libs::context::Context;
use crate::libs::platform::Platform;
use crate::libs::rc_editor::{append_if_absent, contains_pattern};
use crate::{log_debug, log_info, log_warn};

const LABEL: &str = "Starship";

pub const INIT_LINE: &str = r#"eval "$(starship init zsh)""#;

fn fallbacks(ctx: &Context) -> Vec<PathBuf> {
    vec![ctx.home().join(".local/bin/starship")]
}

pub fn locate_starship(ctx: &Context) -> Option<PathBuf> {
    ctx.locate_program("starship", &fallbacks(ctx))
}

/// Pipeline step: ensure the prompt binary and its init line.
pub fn run(ctx: &Context) -> Result<()> {
    let presence = Presence::Program {
        name: "starship",
        fallbacks: fallbacks(ctx),
    };
    ensure_installed(ctx, LABEL, &presence, || match ctx.platform {
        Platform::MacOs => brew::install_formula(ctx, "starship"),
        Platform::Linux => {
            log_info!(
                "[{}] Running the official installer from {}",
                LABEL,
                ctx.config.installers.starship_url.cyan()
            );
            ctx.runner
                .run_checked(&remote_script(&ctx.config.installers.starship_url, "sh", &["-y"]))?;
            Ok(())
        }
    })?;

    append_if_absent(&ctx.interactive_rc(), &contains_pattern("starship init zsh"), INIT_LINE)?;
    Ok(())
}

/// Pipeline step: write the configured preset to the theme file.
pub fn apply_theme(ctx: &Context) -> Result<()> {
    let Some(starship) = locate_starship(ctx) else {
        log_warn!("[{}] starship not found; skipping the prompt theme", LABEL);
        return Ok(());
    };

    let theme = ctx.theme_path();
    if let Some(parent) = theme.parent() {
        fs::create_dir_all(parent).map_err(|e| SetupError::io("creating", parent, e))?;
    }

    let preset = &ctx.config.prompt.preset;
    log_info!(
        "[{}] Applying preset {} to {}",
        LABEL,
        preset.bold(),
        theme.display().to_string().cyan()
    );
    ctx.runner.run_checked(
        &CommandSpec::new(starship.to_string_lossy())
            .args(["preset", preset.as_str(), "-o"])
            .arg(theme.to_string_lossy()),
    )?;

    validate_theme(&theme);
    Ok(())
}

/// Logs a warning when the generated theme is missing or not valid TOML.
fn validate_theme(theme: &Path) {
    match fs::read_to_string(theme) {
        Ok(raw) => match raw.parse::<toml::Table>() {
            Ok(table) => log_debug!("[{}] Theme has {} top-level keys", LABEL, table.len()),
            Err(e) => log_warn!("[{}] {} is not valid TOML: {}", LABEL, theme.display(), e),
        },
        Err(e) => log_warn!("[{}] Could not read {}: {}", LABEL, theme.display(), e),
    }
}
