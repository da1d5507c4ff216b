//! Switches the invoking user's login shell to zsh.
//!
//! 1. No-op when `$SHELL` already names zsh.
//! 2. Locate zsh: PATH first, then the configured fixed locations; the first
//!    existing executable wins.
//! 3. Register the path in the login-shells file (`/etc/shells`) unless the
//!    exact line is already there.
//! 4. `sudo chsh -s <zsh> <user>`; on Linux, `sudo usermod -s` when chsh fails.
//!
//! When every mechanism fails the error carries the command the user can run
//! by hand. Whether that aborts the run is decided by the step's policy. A
//! missing zsh is a `NotFound` error and aborts the run under either policy.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::errors::{Result, SetupError};
use crate::libs::command_runner::CommandSpec;
use crate::libs::context::Context;
use crate::libs::platform::Platform;
use crate::schemas::environment::Environment;
use crate::{log_debug, log_info, log_warn};

/// Configured fixed zsh locations, tried after PATH.
pub fn zsh_candidates(ctx: &Context) -> Vec<PathBuf> {
    ctx.config
        .system
        .zsh_candidates
        .iter()
        .map(|candidate| ctx.resolve(candidate))
        .collect()
}

/// Absolute path of the zsh binary, if any candidate matches.
pub fn locate_zsh(ctx: &Context) -> Option<PathBuf> {
    ctx.locate_program("zsh", &zsh_candidates(ctx))
}

/// `true` when the login shell recorded in the environment is zsh.
pub fn login_shell_is_zsh(env: &Environment) -> bool {
    env.login_shell
        .as_deref()
        .and_then(|shell| Path::new(shell).file_name())
        .is_some_and(|name| name == "zsh")
}

/// Pipeline step: make zsh the login shell.
pub fn run(ctx: &Context) -> Result<()> {
    if login_shell_is_zsh(ctx.env) {
        log_info!("[Shell] Login shell is already zsh, nothing to change");
        return Ok(());
    }

    let zsh = locate_zsh(ctx).ok_or_else(|| SetupError::NotFound("zsh".to_string()))?;
    log_debug!("[Shell] Using {}", zsh.display());

    register_login_shell(ctx, &zsh)?;
    change_login_shell(ctx, &zsh)
}

/// Appends `shell` to the login-shells file unless the exact path is listed.
fn register_login_shell(ctx: &Context, shell: &Path) -> Result<()> {
    let shells_file = ctx.shells_file();
    let existing = match fs::read_to_string(&shells_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(SetupError::io("reading", &shells_file, e)),
    };

    let entry = shell.to_string_lossy();
    if existing.lines().any(|line| line.trim() == entry) {
        log_debug!("[Shell] {} already lists {}", shells_file.display(), entry);
        return Ok(());
    }

    let mut line = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        line.push('\n');
    }
    line.push_str(&entry);
    line.push('\n');

    ctx.runner.run_checked(
        &CommandSpec::sudo(["tee", "-a"])
            .arg(shells_file.to_string_lossy())
            .stdin(line),
    )?;
    log_info!(
        "[Shell] Registered {} in {}",
        entry.cyan(),
        shells_file.display()
    );
    Ok(())
}

fn change_login_shell(ctx: &Context, shell: &Path) -> Result<()> {
    let user = ctx.env.user.as_str();
    let path = shell.to_string_lossy();

    let chsh = CommandSpec::sudo(["chsh", "-s", &*path, user]);
    let output = ctx.runner.run(&chsh)?;
    if output.is_success() {
        log_info!("[Shell] Login shell for {} is now {}", user.bold(), path.green());
        return Ok(());
    }
    log_warn!("[Shell] chsh failed: {}", output.stderr.trim());

    if ctx.platform == Platform::Linux {
        let usermod = CommandSpec::sudo(["usermod", "-s", &*path, user]);
        let output = ctx.runner.run(&usermod)?;
        if output.is_success() {
            log_info!(
                "[Shell] Login shell for {} is now {} (via usermod)",
                user.bold(),
                path.green()
            );
            return Ok(());
        }
        log_warn!("[Shell] usermod failed: {}", output.stderr.trim());
    }

    Err(SetupError::ShellChange {
        shell: shell.to_path_buf(),
        instructions: format!("Run `chsh -s {path}` yourself, then log out and back in."),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::context::fixtures;
    use crate::test_support::FakeRunner;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn zsh_login_shell_is_a_pure_no_op() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let mut env = fixtures::environment(home.path());
        env.login_shell = Some("/usr/local/bin/zsh".into());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));

        run(&ctx)?;

        assert!(runner.calls().is_empty());
        assert!(!ctx.shells_file().exists());
        Ok(())
    }

    #[test]
    fn registers_the_shell_then_changes_it_with_chsh() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        runner.add_program("zsh", "/usr/bin/zsh");
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));
        fs::write(ctx.shells_file(), "/bin/sh\n/bin/bash")?;

        run(&ctx)?;
        run(&ctx)?;

        assert_eq!(fs::read_to_string(ctx.shells_file())?, "/bin/sh\n/bin/bash\n/usr/bin/zsh\n");
        assert_eq!(runner.count_matching("tee -a"), 1);
        assert_eq!(runner.count_matching("sudo chsh -s /usr/bin/zsh dev"), 2);
        assert_eq!(runner.count_matching("usermod"), 0);
        Ok(())
    }

    #[test]
    fn linux_falls_back_to_usermod() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        runner.add_program("zsh", "/usr/bin/zsh");
        runner.fail_when("chsh", 1);
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));

        run(&ctx)?;
        assert_eq!(runner.count_matching("sudo usermod -s /usr/bin/zsh dev"), 1);
        Ok(())
    }

    #[test]
    fn macos_has_no_fallback_and_reports_manual_steps() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        runner.add_program("zsh", "/opt/homebrew/bin/zsh");
        runner.fail_when("chsh", 1);
        let ctx = Context::new(&env, &config, Platform::MacOs, &runner, Arc::new(AtomicBool::new(false)));

        let err = run(&ctx).unwrap_err();
        assert!(matches!(err, SetupError::ShellChange { .. }));
        assert!(err.to_string().contains("chsh -s /opt/homebrew/bin/zsh"));
        assert_eq!(runner.count_matching("usermod"), 0);
        Ok(())
    }

    #[test]
    fn missing_zsh_is_not_found() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));

        assert!(matches!(run(&ctx), Err(SetupError::NotFound(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn first_existing_candidate_wins() -> anyhow::Result<()> {
        use crate::libs::utilities::path_helpers::make_executable;

        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let mut config = fixtures::config(home.path());
        let second = home.path().join("b/zsh");
        let third = home.path().join("c/zsh");
        for path in [&second, &third] {
            fs::create_dir_all(path.parent().expect("has parent"))?;
            fs::write(path, "#!/bin/sh\n")?;
            make_executable(path)?;
        }
        config.system.zsh_candidates = vec!["~/a/zsh".into(), "~/b/zsh".into(), "~/c/zsh".into()];
        let runner = FakeRunner::new();
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));

        assert_eq!(locate_zsh(&ctx), Some(second));
        Ok(())
    }
}
