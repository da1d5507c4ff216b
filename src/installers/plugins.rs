//! # zsh Plugins
//!
//! Two pipeline steps live here:
//!
//! - **Plugins** clones every configured plugin repository into the
//!   framework's custom plugin directory (`$ZSH_CUSTOM/plugins/<name>`),
//!   skipping plugins whose directory already exists.
//! - **Plugin configuration** rewrites the `plugins=(...)` line of the
//!   interactive resource file so it lists the bundled plugins followed by
//!   the cloned ones. The rewrite goes through the replace-or-append editor,
//!   which backs the file up before changing it.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::Result;
use crate::installers::{Presence, ensure_installed};
use crate::libs::command_runner::CommandSpec;
use crate::libs::context::Context;
use crate::libs::rc_editor::replace_or_append;
use crate::schemas::setup_config::PluginEntry;

static PLUGINS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*plugins=\(").expect("plugins line pattern"));

/// Pipeline step: clone every missing plugin.
pub fn run(ctx: &Context) -> Result<()> {
    for plugin in &ctx.config.plugins {
        ctx.check_interrupted()?;
        clone_plugin(ctx, plugin)?;
    }
    Ok(())
}

fn clone_plugin(ctx: &Context, plugin: &PluginEntry) -> Result<()> {
    let dest = ctx.plugin_dir(&plugin.name);
    let label = format!("Plugin {}", plugin.name);
    ensure_installed(ctx, &label, &Presence::Directory(dest.clone()), || {
        ctx.runner.run_checked(
            &CommandSpec::new("git")
                .args(["clone", "--depth", "1", plugin.repo.as_str()])
                .arg(dest.to_string_lossy())
                .inherit_output(),
        )?;
        Ok(())
    })?;
    Ok(())
}

/// The `plugins=(...)` line for the configured plugin set.
pub fn plugins_line(ctx: &Context) -> String {
    format!("plugins=({})", ctx.config.plugin_names().join(" "))
}

/// Pipeline step: make the interactive resource file enable every plugin.
pub fn configure(ctx: &Context) -> Result<()> {
    replace_or_append(&ctx.interactive_rc(), &PLUGINS_LINE, &plugins_line(ctx))?;
    Ok(())
}
