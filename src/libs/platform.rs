// OS detection and Linux package-manager dispatch.
//
// The platform tag is decided once, before anything is installed, and every
// platform-branching step reads it from the pipeline context afterwards.

use std::fmt;

use colored::Colorize;

use crate::errors::{Result, SetupError};
use crate::libs::command_runner::{CommandRunner, CommandSpec};
use crate::{log_debug, log_info};

/// The two supported platform tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => f.write_str("macOS"),
            Self::Linux => f.write_str("Linux"),
        }
    }
}

/// Maps a platform identifier to a supported tag.
///
/// Accepts both shell-style `$OSTYPE` values (`darwin23.0`, `linux-gnu`,
/// `linux-musl`) and `uname -s`/Rust target names (`Darwin`, `macos`, `Linux`).
/// Anything else is fatal: nothing in the pipeline knows how to provision it.
///
/// # Arguments
/// * `identifier`: The raw platform identifier.
///
/// # Returns
/// * `Ok(Platform)`: The detected tag.
/// * `Err(SetupError::UnsupportedPlatform)`: For any other identifier.
pub fn detect_platform(identifier: &str) -> Result<Platform> {
    let lowered = identifier.trim().to_lowercase();
    let platform = if lowered.starts_with("darwin") || lowered == "macos" {
        Platform::MacOs
    } else if lowered.starts_with("linux") {
        Platform::Linux
    } else {
        return Err(SetupError::UnsupportedPlatform(identifier.to_string()));
    };

    log_info!(
        "[Platform] Detected {} (from '{}')",
        platform.to_string().bold(),
        identifier.dimmed()
    );
    Ok(platform)
}

/// Native package managers the Linux branch knows how to drive, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPackageManager {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Zypper,
    Apk,
}

impl SystemPackageManager {
    const PROBE_ORDER: [Self; 6] = [
        Self::Apt,
        Self::Dnf,
        Self::Yum,
        Self::Pacman,
        Self::Zypper,
        Self::Apk,
    ];

    /// The executable whose presence identifies this manager.
    pub fn program(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
            Self::Apk => "apk",
        }
    }

    /// Returns the first manager found on the search path.
    pub fn detect(runner: &dyn CommandRunner) -> Result<Self> {
        let manager = Self::PROBE_ORDER
            .into_iter()
            .find(|manager| runner.find_program(manager.program()).is_some())
            .ok_or_else(|| {
                SetupError::NotFound(
                    "a supported package manager (apt-get, dnf, yum, pacman, zypper, apk)"
                        .to_string(),
                )
            })?;
        log_debug!("[Platform] Using system package manager '{}'", manager.program());
        Ok(manager)
    }

    /// Packages Homebrew needs on Linux before its installer will run.
    pub fn homebrew_prerequisites(self) -> &'static [&'static str] {
        match self {
            Self::Apt => &["build-essential", "procps", "curl", "file", "git"],
            Self::Dnf | Self::Yum => &["gcc", "gcc-c++", "make", "procps-ng", "curl", "file", "git"],
            Self::Pacman => &["base-devel", "procps-ng", "curl", "file", "git"],
            Self::Zypper => &["gcc", "gcc-c++", "make", "procps", "curl", "file", "git"],
            Self::Apk => &["build-base", "procps", "curl", "file", "git", "bash"],
        }
    }

    /// Builds the privileged command sequence installing `packages` non-interactively.
    pub fn install_commands(self, packages: &[&str]) -> Vec<CommandSpec> {
        let install = |base: &[&str]| {
            CommandSpec::sudo(base.iter().copied())
                .args(packages.iter().copied())
                .inherit_output()
        };
        match self {
            Self::Apt => vec![
                CommandSpec::sudo(["apt-get", "update"]).inherit_output(),
                install(&["apt-get", "install", "-y"]),
            ],
            Self::Dnf => vec![install(&["dnf", "install", "-y"])],
            Self::Yum => vec![install(&["yum", "install", "-y"])],
            Self::Pacman => vec![install(&["pacman", "-Sy", "--noconfirm", "--needed"])],
            Self::Zypper => vec![install(&["zypper", "--non-interactive", "install"])],
            Self::Apk => vec![install(&["apk", "add", "--no-cache"])],
        }
    }

    /// Installs `packages`, aborting on the first failing command.
    pub fn install(self, runner: &dyn CommandRunner, packages: &[&str]) -> Result<()> {
        log_info!(
            "[Platform] Installing {} with {}",
            packages.join(" ").cyan(),
            self.program().bold()
        );
        for command in self.install_commands(packages) {
            runner.run_checked(&command)?;
        }
        Ok(())
    }
}
