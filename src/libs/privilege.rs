// Temporary password-less sudo for the duration of a run.
//
// Several steps need root (package installs, /etc/shells, chsh) and some
// remote installers call sudo themselves. Rather than prompting repeatedly,
// a single-purpose sudoers fragment is installed at the start and removed at
// the end. The grant is a guard value: `revoke` removes it on the success
// path and `Drop` removes it on every other path, including error returns
// out of a failing step and unwinding panics.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::errors::Result;
use crate::libs::command_runner::{CommandRunner, CommandSpec};
use crate::{log_debug, log_info, log_warn};

/// Prefix of the fragment file name inside the sudoers drop-in directory.
const FRAGMENT_PREFIX: &str = "setup-shell-";

/// An active elevated-privilege grant. Dropping it revokes the grant.
#[must_use = "dropping the grant immediately revokes it"]
pub struct PrivilegeGrant<'a> {
    runner: &'a dyn CommandRunner,
    fragment: PathBuf,
    active: bool,
}

/// Path of the fragment for `user`.
///
/// sudo silently ignores drop-in files whose names contain a `.` or end in
/// `~`, so anything outside `[A-Za-z0-9_-]` is replaced with `_`.
pub fn fragment_path(sudoers_dir: &Path, user: &str) -> PathBuf {
    let safe: String = user
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    sudoers_dir.join(format!("{FRAGMENT_PREFIX}{safe}"))
}

/// Grants `user` password-less sudo by installing a validated sudoers fragment.
///
/// The first `sudo` here is the only password prompt of the whole run.
///
/// # Arguments
/// * `runner`: Executes the privileged commands.
/// * `sudoers_dir`: The drop-in directory, normally `/etc/sudoers.d`.
/// * `user`: The invoking user.
///
/// # Returns
/// * `Ok(PrivilegeGrant)`: The fragment is installed, 0440 and accepted by `visudo`.
/// * `Err(SetupError)`: Writing, chmod or validation failed. Whatever was
///   written is removed before returning.
pub fn grant<'a>(
    runner: &'a dyn CommandRunner,
    sudoers_dir: &Path,
    user: &str,
) -> Result<PrivilegeGrant<'a>> {
    let fragment = fragment_path(sudoers_dir, user);
    let fragment_str = fragment.to_string_lossy().into_owned();
    log_info!(
        "[Privilege] Granting temporary password-less sudo to {} via {}",
        user.bold(),
        fragment.display().to_string().cyan()
    );

    runner.run_checked(
        &CommandSpec::sudo(["tee", fragment_str.as_str()])
            .stdin(format!("{user} ALL=(ALL) NOPASSWD: ALL\n")),
    )?;

    // From here on the guard owns the fragment; any early return revokes it.
    let grant = PrivilegeGrant {
        runner,
        fragment,
        active: true,
    };

    runner.run_checked(&CommandSpec::sudo(["chmod", "0440", fragment_str.as_str()]))?;
    runner.run_checked(&CommandSpec::sudo(["visudo", "-cf", fragment_str.as_str()]))?;

    let check = runner.run(&CommandSpec::sudo(["-n", "true"]))?;
    if check.is_success() {
        log_debug!("[Privilege] `sudo -n true` succeeded; grant is effective");
    } else {
        log_warn!(
            "[Privilege] Fragment installed but `sudo -n true` still fails; later steps may prompt for a password"
        );
    }

    Ok(grant)
}

impl PrivilegeGrant<'_> {
    pub fn fragment(&self) -> &Path {
        &self.fragment
    }

    /// Removes the fragment. Consumes the grant so it cannot be revoked twice.
    pub fn revoke(mut self) -> Result<()> {
        self.active = false;
        remove_fragment(self.runner, &self.fragment)?;
        log_info!("[Privilege] Temporary sudo grant revoked ({})", self.fragment().display());
        Ok(())
    }
}

impl Drop for PrivilegeGrant<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        log_warn!("[Privilege] Run ended early; revoking temporary sudo grant");
        if let Err(err) = remove_fragment(self.runner, &self.fragment) {
            log_warn!(
                "[Privilege] Could not remove {}: {}. Remove it manually with `sudo rm -f {}`",
                self.fragment.display().to_string().red(),
                err,
                self.fragment.display()
            );
        }
    }
}

fn remove_fragment(runner: &dyn CommandRunner, fragment: &Path) -> Result<()> {
    let fragment = fragment.to_string_lossy();
    runner.run_checked(&CommandSpec::sudo(["rm", "-f", &*fragment]))?;
    Ok(())
}
