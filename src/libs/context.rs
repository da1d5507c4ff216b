// The shared, read-only view every pipeline step receives.
//
// Beyond the detected platform and the captured environment, the only state
// steps share is on disk (resource files, installed directories), so the
// context carries no mutable fields apart from the interrupt flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{Result, SetupError};
use crate::libs::command_runner::CommandRunner;
use crate::libs::platform::Platform;
use crate::libs::utilities::path_helpers::{expand_path, first_executable};
use crate::schemas::environment::Environment;
use crate::schemas::setup_config::SetupConfig;

pub struct Context<'a> {
    pub env: &'a Environment,
    pub config: &'a SetupConfig,
    pub platform: Platform,
    pub runner: &'a dyn CommandRunner,
    interrupted: Arc<AtomicBool>,
}

impl<'a> Context<'a> {
    pub fn new(
        env: &'a Environment,
        config: &'a SetupConfig,
        platform: Platform,
        runner: &'a dyn CommandRunner,
        interrupted: Arc<AtomicBool>,
    ) -> Self {
        Self {
            env,
            config,
            platform,
            runner,
            interrupted,
        }
    }

    /// Expands a configured path against the invoking user's home.
    pub fn resolve(&self, configured: &str) -> PathBuf {
        expand_path(configured, &self.env.home)
    }

    pub fn interactive_rc(&self) -> PathBuf {
        self.resolve(&self.config.shell_files.interactive)
    }

    pub fn secondary_rc(&self) -> PathBuf {
        self.resolve(&self.config.shell_files.secondary)
    }

    /// `~/.oh-my-zsh`, the framework's install directory.
    pub fn framework_dir(&self) -> PathBuf {
        self.env.home.join(".oh-my-zsh")
    }

    /// `$ZSH_CUSTOM`, defaulting to `~/.oh-my-zsh/custom`.
    pub fn framework_custom_dir(&self) -> PathBuf {
        self.env
            .zsh_custom
            .clone()
            .unwrap_or_else(|| self.framework_dir().join("custom"))
    }

    pub fn plugin_dir(&self, name: &str) -> PathBuf {
        self.framework_custom_dir().join("plugins").join(name)
    }

    pub fn theme_path(&self) -> PathBuf {
        self.resolve(&self.config.prompt.config_path)
    }

    pub fn sudoers_dir(&self) -> PathBuf {
        self.resolve(&self.config.system.sudoers_dir)
    }

    pub fn shells_file(&self) -> PathBuf {
        self.resolve(&self.config.system.shells_file)
    }

    /// Finds `program` on the search path, then at the given well-known locations.
    /// Installers that drop binaries outside PATH (Homebrew on Linux, uv) are
    /// still found by their fallbacks within the same run.
    pub fn locate_program(&self, program: &str, fallbacks: &[PathBuf]) -> Option<PathBuf> {
        self.runner
            .find_program(program)
            .or_else(|| first_executable(fallbacks))
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Fails with [`SetupError::Interrupted`] once SIGINT/SIGTERM was received.
    pub fn check_interrupted(&self) -> Result<()> {
        if self.is_interrupted() {
            Err(SetupError::Interrupted)
        } else {
            Ok(())
        }
    }

    pub fn home(&self) -> &Path {
        &self.env.home
    }
}
