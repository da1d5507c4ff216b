// Path helpers shared by the installers: `~`/`$VAR` expansion against the
// invoking user's home, PATH lookups, and the "is this an executable file" test
// that both the Homebrew locator and the login-shell candidate lookup rely on.

use crate::log_debug;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Resolves a configured path that may start with `~` or contain `$VAR`.
///
/// Unlike `shellexpand::full`, the home directory is the one captured in the
/// runtime environment, so a test (or a `sudo -E` run) sees a consistent home.
/// Unknown variables are left as written rather than failing the whole run.
///
/// # Arguments
/// * `path`: The path as written in the configuration, e.g. `~/.zshrc`.
/// * `home`: The invoking user's home directory.
///
/// # Returns
/// * `PathBuf`: The expanded path.
pub fn expand_path(path: &str, home: &Path) -> PathBuf {
    let home_str = home.to_string_lossy().into_owned();
    let expanded = shellexpand::full_with_context(
        path,
        || Some(home_str.clone()),
        |var: &str| -> Result<Option<String>, std::env::VarError> {
            if var == "HOME" {
                return Ok(Some(home_str.clone()));
            }
            Ok(std::env::var(var).ok())
        },
    )
    .map(|cow| cow.into_owned())
    .unwrap_or_else(|_| path.to_string());

    log_debug!("[Paths] Expanded '{}' to '{}'", path, expanded);
    PathBuf::from(expanded)
}

/// Returns `true` when `path` is a regular file with at least one execute bit set.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Searches a PATH-style list of directories for an executable named `program`.
/// The first directory holding a matching executable wins, like `command -v`.
///
/// # Arguments
/// * `program`: The bare command name (e.g. `brew`).
/// * `search_path`: The PATH value to search; `None` means nothing is found.
pub fn find_on_path(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

/// Picks the first existing executable out of an ordered candidate list.
pub fn first_executable<'a, I>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    candidates
        .into_iter()
        .find(|candidate| is_executable(candidate))
        .cloned()
}

/// Makes a file executable for its owner, group and others (0755).
/// Only used by tests to stage fake binaries today.
#[cfg(all(test, unix))]
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}
