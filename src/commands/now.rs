// This file contains the primary logic for the `setup-shell now` command.
// It captures the environment, loads the configuration, detects the platform,
// and then runs the provisioning pipeline inside a temporary sudo grant.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context as _;
use colored::Colorize;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::flag;

use crate::errors::Result;
use crate::installers::{brew, finalize, oh_my_zsh, plugins, starship, uv};
use crate::libs::command_runner::SystemRunner;
use crate::libs::context::Context;
use crate::libs::pipeline::{PipelineReport, Step, StepId, run_steps};
use crate::libs::platform::detect_platform;
use crate::libs::{privilege, shell_changer};
use crate::schemas::environment::Environment;
use crate::schemas::setup_config::load_config;
use crate::{log_debug, log_info, log_warn};

/// The provisioning pipeline, in execution order.
pub const STEPS: [Step; 9] = [
    Step::new(StepId::Homebrew, "Homebrew", brew::run),
    Step::new(StepId::OhMyZsh, "zsh and Oh My Zsh", oh_my_zsh::run),
    Step::new(StepId::Plugins, "zsh plugins", plugins::run),
    Step::new(StepId::PluginConfig, "Plugin configuration", plugins::configure),
    Step::new(StepId::Prompt, "Starship prompt", starship::run),
    Step::new(StepId::Theme, "Starship theme", starship::apply_theme),
    Step::new(StepId::Uv, "uv", uv::run),
    Step::new(StepId::DefaultShell, "Default shell", shell_changer::run),
    Step::new(StepId::Finalize, "Finalize resource file", finalize::run),
];

/// Main entry point for the `now` command.
///
/// # Arguments
/// * `config_path`: Optional path to a YAML configuration overriding the defaults.
pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    log_debug!("Entered now::run() function.");

    let env = Environment::from_process().context("reading the process environment")?;
    let config = load_config(config_path.as_deref(), &env.home)?;
    if let Ok(rendered) = serde_json::to_string_pretty(&config) {
        log_debug!("[Config] Effective configuration:\n{}", rendered);
    }

    let platform = detect_platform(&env.platform_id)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    flag::register(SIGINT, Arc::clone(&interrupted)).context("registering SIGINT handler")?;
    flag::register(SIGTERM, Arc::clone(&interrupted)).context("registering SIGTERM handler")?;

    let runner = SystemRunner::from_env();
    let ctx = Context::new(&env, &config, platform, &runner, interrupted);
    let report = provision(&ctx, &STEPS)?;

    summarize(&report);
    log_debug!("Exited now::run() function.");
    Ok(())
}

/// Runs `steps` while holding the temporary sudo grant.
///
/// The grant is revoked explicitly after the last step; on any early return
/// the guard's `Drop` revokes it instead.
pub fn provision(ctx: &Context, steps: &[Step]) -> Result<PipelineReport> {
    let grant = privilege::grant(ctx.runner, &ctx.sudoers_dir(), &ctx.env.user)?;
    let report = run_steps(ctx, steps)?;
    grant.revoke()?;
    Ok(report)
}

fn summarize(report: &PipelineReport) {
    let warnings: Vec<_> = report.warnings().collect();
    if warnings.is_empty() {
        log_info!(
            "'setup-shell now' completed: {} steps, {}",
            report.outcomes.len(),
            "no warnings".green()
        );
        return;
    }

    log_info!(
        "'setup-shell now' completed: {} steps, {} with warnings",
        report.outcomes.len(),
        warnings.len().to_string().yellow()
    );
    for (step, message) in warnings {
        log_warn!("  {}: {}", step.to_string().bold(), message);
    }
}
