//! Ordered step execution with declarative per-step failure policies.
//!
//! Steps run strictly in sequence. Each one carries a [`StepPolicy`]:
//! `HardFail` steps abort the pipeline on error, `SoftWarn` steps log the
//! error as a warning and let the pipeline continue. Soft-warn only covers
//! recoverable errors (see [`is_recoverable`]); a missing program
//! aborts under either policy. The pipeline also checks the interrupt flag
//! before each step.
//!
//! [`is_recoverable`]: crate::errors::SetupError::is_recoverable

use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::libs::context::Context;
use crate::{log_info, log_warn};

/// Identifier of a configurable pipeline step (also its key under `policies:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Homebrew,
    OhMyZsh,
    Plugins,
    PluginConfig,
    Prompt,
    Theme,
    Uv,
    DefaultShell,
    Finalize,
}

impl StepId {
    /// Only the login-shell change tolerates failure out of the box.
    pub fn default_policy(self) -> StepPolicy {
        match self {
            Self::DefaultShell => StepPolicy::SoftWarn,
            _ => StepPolicy::HardFail,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Homebrew => "homebrew",
            Self::OhMyZsh => "oh-my-zsh",
            Self::Plugins => "plugins",
            Self::PluginConfig => "plugin-config",
            Self::Prompt => "prompt",
            Self::Theme => "theme",
            Self::Uv => "uv",
            Self::DefaultShell => "default-shell",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepPolicy {
    HardFail,
    SoftWarn,
}

pub type StepAction = fn(&Context) -> Result<()>;

/// One entry of the pipeline table.
pub struct Step {
    pub id: StepId,
    pub title: &'static str,
    pub action: StepAction,
}

impl Step {
    pub const fn new(id: StepId, title: &'static str, action: StepAction) -> Self {
        Self { id, title, action }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// A soft-warn step failed; carries the rendered error.
    Warned(String),
}

/// What happened to each step of a completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub outcomes: Vec<(StepId, StepOutcome)>,
}

impl PipelineReport {
    pub fn warnings(&self) -> impl Iterator<Item = (&StepId, &String)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            StepOutcome::Warned(message) => Some((id, message)),
            StepOutcome::Completed => None,
        })
    }
}

/// Runs `steps` in order under `ctx`.
///
/// # Returns
/// * `Ok(PipelineReport)` when every hard-fail step succeeded.
/// * `Err(SetupError)` from the first hard-fail step that failed, the first
///   soft-warn step whose error is not recoverable, or `Interrupted` if a
///   signal arrived between steps.
pub fn run_steps(ctx: &Context, steps: &[Step]) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();
    let total = steps.len();

    for (index, step) in steps.iter().enumerate() {
        ctx.check_interrupted()?;

        let policy = ctx.config.policy_for(step.id);
        eprintln!();
        log_info!(
            "{} {}",
            format!("[{}/{}]", index + 1, total).bright_blue(),
            step.title.bold()
        );

        let result = (step.action)(ctx);
        // A signal also reaches the installer child, which then fails; report
        // the interrupt rather than the child's exit status.
        ctx.check_interrupted()?;

        match (result, policy) {
            (Ok(()), _) => report.outcomes.push((step.id, StepOutcome::Completed)),
            (Err(err), StepPolicy::SoftWarn) if err.is_recoverable() => {
                log_warn!(
                    "[Pipeline] Step '{}' failed but is configured as soft-warn; continuing: {}",
                    step.id.to_string().yellow(),
                    err
                );
                report.outcomes.push((step.id, StepOutcome::Warned(err.to_string())));
            }
            (Err(err), _) => return Err(err),
        }
    }

    Ok(report)
}
