// Configuration schema for `setup-shell`.
//
// Every field has a default that reproduces the stock workstation setup, so the
// YAML file is optional and may override any subset of it. Paths are kept as
// written (with `~`/`$VAR`) and resolved later against the runtime home.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SetupError};
use crate::libs::pipeline::{StepId, StepPolicy};
use crate::{log_debug, log_info};

/// Top-level configuration, mirroring `~/.setup-shell/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub shell_files: ShellFiles,
    /// Git-hosted plugins cloned into the framework's custom plugin directory.
    pub plugins: Vec<PluginEntry>,
    /// Plugins bundled with the framework, listed first on the `plugins=(...)` line.
    pub builtin_plugins: Vec<String>,
    pub prompt: PromptConfig,
    pub alias: AliasEntry,
    pub readiness: ReadinessConfig,
    /// Per-step overrides of the default hard-fail / soft-warn policy.
    pub policies: BTreeMap<StepId, StepPolicy>,
    pub system: SystemPaths,
    pub installers: InstallerUrls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellFiles {
    /// Interactive shell resource file (zsh).
    pub interactive: String,
    /// Secondary resource file (bash), which also receives environment lines.
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    pub repo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Name passed to `starship preset`.
    pub preset: String,
    pub config_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub name: String,
    pub value: String,
}

/// Bounded exponential backoff used after installers with asynchronous side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPaths {
    pub sudoers_dir: String,
    pub shells_file: String,
    /// Homebrew prefixes searched when `brew` is not on PATH.
    pub brew_prefixes: Vec<String>,
    /// Fixed zsh locations searched after the PATH lookup, in order.
    pub zsh_candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerUrls {
    pub homebrew_url: String,
    pub oh_my_zsh_url: String,
    pub starship_url: String,
    pub uv_url: String,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            shell_files: ShellFiles::default(),
            plugins: vec![
                PluginEntry {
                    name: "zsh-autosuggestions".to_string(),
                    repo: "https://github.com/zsh-users/zsh-autosuggestions".to_string(),
                },
                PluginEntry {
                    name: "zsh-syntax-highlighting".to_string(),
                    repo: "https://github.com/zsh-users/zsh-syntax-highlighting.git".to_string(),
                },
            ],
            builtin_plugins: vec!["git".to_string()],
            prompt: PromptConfig::default(),
            alias: AliasEntry::default(),
            readiness: ReadinessConfig::default(),
            policies: BTreeMap::new(),
            system: SystemPaths::default(),
            installers: InstallerUrls::default(),
        }
    }
}

impl Default for ShellFiles {
    fn default() -> Self {
        Self {
            interactive: "~/.zshrc".to_string(),
            secondary: "~/.bashrc".to_string(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            preset: "gruvbox-rainbow".to_string(),
            config_path: "~/.config/starship.toml".to_string(),
        }
    }
}

impl Default for AliasEntry {
    fn default() -> Self {
        Self {
            name: "zshconfig".to_string(),
            value: "${EDITOR:-vi} ~/.zshrc".to_string(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: 6,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self {
            sudoers_dir: "/etc/sudoers.d".to_string(),
            shells_file: "/etc/shells".to_string(),
            brew_prefixes: [
                "/opt/homebrew",
                "/usr/local",
                "/home/linuxbrew/.linuxbrew",
                "~/.linuxbrew",
            ]
            .map(String::from)
            .to_vec(),
            zsh_candidates: [
                "/bin/zsh",
                "/usr/bin/zsh",
                "/usr/local/bin/zsh",
                "/opt/homebrew/bin/zsh",
                "/home/linuxbrew/.linuxbrew/bin/zsh",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl Default for InstallerUrls {
    fn default() -> Self {
        Self {
            homebrew_url: "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh"
                .to_string(),
            oh_my_zsh_url: "https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh"
                .to_string(),
            starship_url: "https://starship.rs/install.sh".to_string(),
            uv_url: "https://astral.sh/uv/install.sh".to_string(),
        }
    }
}

impl SetupConfig {
    /// Effective policy for a step: the configured override, else the step's default.
    pub fn policy_for(&self, step: StepId) -> StepPolicy {
        self.policies
            .get(&step)
            .copied()
            .unwrap_or_else(|| step.default_policy())
    }

    /// The full `plugins=(...)` list: bundled plugins first, then cloned ones.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.builtin_plugins
            .iter()
            .map(String::as_str)
            .chain(self.plugins.iter().map(|plugin| plugin.name.as_str()))
            .collect()
    }
}

/// Default location of the configuration file under the user's home.
pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(".setup-shell").join("config.yaml")
}

/// Loads the configuration.
///
/// # Arguments
/// * `explicit`: Path given with `--config`; it must exist.
/// * `home`: The user's home, used to find the default file, which may be absent.
///
/// # Returns
/// * `Ok(SetupConfig)`: Parsed file merged over defaults, or pure defaults.
/// * `Err(SetupError)`: Unreadable explicit file or invalid YAML.
pub fn load_config(explicit: Option<&Path>, home: &Path) -> Result<SetupConfig> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path(home), false),
    };

    if !required && !path.exists() {
        log_debug!(
            "[Config] No configuration at {}; using built-in defaults",
            path.display()
        );
        return Ok(SetupConfig::default());
    }

    let raw = fs::read_to_string(&path).map_err(|e| SetupError::io("reading", &path, e))?;
    let config = parse_config(&raw).map_err(|source| SetupError::Config {
        path: path.clone(),
        source,
    })?;
    log_info!("[Config] Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parses YAML text into a configuration. An empty document yields the defaults.
pub fn parse_config(raw: &str) -> std::result::Result<SetupConfig, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(SetupConfig::default());
    }
    serde_yaml::from_str(raw)
}
