// Last pipeline step: add the convenience alias and reload the interactive
// resource file once, so configuration errors introduced by earlier edits
// surface now rather than in the user's next terminal.

use regex::Regex;

use colored::Colorize;

use crate::errors::Result;
use crate::libs::command_runner::CommandSpec;
use crate::libs::context::Context;
use crate::libs::rc_editor::append_if_absent;
use crate::libs::shell_changer::locate_zsh;
use crate::schemas::setup_config::AliasEntry;
use crate::{log_debug, log_info, log_warn};

/// `alias <name>='<value>'`, with embedded single quotes escaped for sh.
pub fn alias_line(alias: &AliasEntry) -> String {
    format!("alias {}='{}'", alias.name, alias.value.replace('\'', r"'\''"))
}

fn alias_pattern(name: &str) -> Regex {
    Regex::new(&format!(r"^\s*alias\s+{}=", regex::escape(name)))
        .expect("escaped alias name is a valid regex")
}

pub fn run(ctx: &Context) -> Result<()> {
    let rc = ctx.interactive_rc();
    let alias = &ctx.config.alias;
    append_if_absent(&rc, &alias_pattern(&alias.name), &alias_line(alias))?;

    let Some(zsh) = locate_zsh(ctx) else {
        log_warn!("[Finalize] zsh not found; open a new terminal to load {}", rc.display());
        return Ok(());
    };

    // The path is passed as `$1` rather than spliced into the script.
    let reload = CommandSpec::new(zsh.to_string_lossy())
        .args(["-c", r#"source "$1""#, "zsh"])
        .arg(rc.to_string_lossy());
    match ctx.runner.run(&reload) {
        Ok(output) if output.is_success() => {
            log_debug!("[Finalize] {} sourced cleanly", rc.display());
        }
        Ok(output) => log_warn!(
            "[Finalize] Reloading {} exited with {:?}: {}",
            rc.display(),
            output.code,
            output.stderr.trim()
        ),
        Err(e) => log_warn!("[Finalize] Could not reload {}: {}", rc.display(), e),
    }

    log_info!(
        "[Finalize] {} Open a new terminal to start using zsh.",
        "Setup complete.".bold().green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::context::fixtures;
    use crate::libs::platform::Platform;
    use crate::test_support::FakeRunner;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn alias_is_added_once_and_the_file_is_sourced() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        runner.add_program("zsh", "/usr/bin/zsh");
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));

        run(&ctx)?;
        run(&ctx)?;

        let zshrc = home.path().join(".zshrc");
        assert_eq!(
            fs::read_to_string(&zshrc)?,
            "alias zshconfig='${EDITOR:-vi} ~/.zshrc'\n"
        );
        assert_eq!(
            runner.command_lines()[0],
            format!("/usr/bin/zsh -c source \"$1\" zsh {}", zshrc.display())
        );
        Ok(())
    }

    #[test]
    fn home_with_spaces_is_sourced_as_one_argument() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let home = root.path().join("Jane Doe");
        fs::create_dir_all(&home)?;
        let env = fixtures::environment(&home);
        let config = fixtures::config(&home);
        let runner = FakeRunner::new();
        runner.add_program("zsh", "/usr/bin/zsh");
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));

        run(&ctx)?;

        let reload = &runner.calls()[0];
        assert_eq!(reload.args[..3], ["-c", r#"source "$1""#, "zsh"]);
        assert_eq!(reload.args[3], home.join(".zshrc").to_string_lossy());
        Ok(())
    }

    #[test]
    fn an_existing_definition_of_the_alias_is_kept() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));
        let zshrc = home.path().join(".zshrc");
        fs::write(&zshrc, "  alias zshconfig=\"code ~/.zshrc\"\n")?;

        run(&ctx)?;
        assert_eq!(fs::read_to_string(&zshrc)?, "  alias zshconfig=\"code ~/.zshrc\"\n");
        Ok(())
    }

    #[test]
    fn failed_reload_is_only_a_warning() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let env = fixtures::environment(home.path());
        let config = fixtures::config(home.path());
        let runner = FakeRunner::new();
        runner.add_program("zsh", "/usr/bin/zsh");
        runner.fail_when("-c source", 1);
        let ctx = Context::new(&env, &config, Platform::Linux, &runner, Arc::new(AtomicBool::new(false)));

        run(&ctx)?;
        Ok(())
    }

    #[test]
    fn single_quotes_in_the_value_are_escaped() {
        let alias = AliasEntry {
            name: "greet".into(),
            value: "echo 'hi'".into(),
        };
        assert_eq!(alias_line(&alias), r"alias greet='echo '\''hi'\'''");
    }
}
