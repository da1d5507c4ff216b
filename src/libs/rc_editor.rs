//! Idempotent, pattern-scoped editing of shell resource files.
//!
//! A resource file is treated as an ordered sequence of opaque lines; nothing
//! here parses shell syntax. Two edit modes are offered:
//!
//! * [`append_if_absent`]: add a line (or block) unless some line already
//!   matches the detection pattern.
//! * [`replace_or_append`]: replace the line matching a pattern with new
//!   content, or append it when nothing matches. A timestamped backup of the
//!   previous file is written next to it before any mutation.
//!
//! Both are safe to run on every pipeline run: repeating a call with the same
//! arguments leaves the file untouched. Edits keep the file's line terminator
//! (LF or CRLF). Appends only add bytes at the end; replacements go through a
//! temporary sibling that is renamed into place.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;
use regex::Regex;

use crate::errors::{Result, SetupError};
use crate::libs::utilities::timestamps::backup_path_for;
use crate::{log_debug, log_info};

/// What an edit did to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The file already satisfied the request.
    Unchanged,
    Appended,
    /// A matching line was rewritten; `backup` holds the pre-edit copy.
    Replaced { backup: PathBuf },
    /// Nothing matched, so the content was appended; `backup` is present
    /// when there was a previous file to preserve.
    AppendedWithBackup { backup: Option<PathBuf> },
}

fn split_lines(content: Option<&str>) -> Vec<String> {
    content
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// A missing file reads as `None`.
fn read_content(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SetupError::io("reading", path, e)),
    }
}

/// The terminator an existing file uses: CRLF if any line has one, else LF.
fn line_ending(content: Option<&str>) -> &'static str {
    match content {
        Some(content) if content.contains("\r\n") => "\r\n",
        _ => "\n",
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SetupError::io("creating", parent, e))?;
        }
    }
    Ok(())
}

/// Replaces the file with `lines`, each ending in `ending`.
///
/// The new content goes to a sibling temporary file that is renamed over the
/// target, so an interrupted write never leaves a truncated resource file.
/// A symlinked file is rewritten at its target and the link is kept.
fn write_lines(path: &Path, lines: &[String], ending: &str) -> Result<()> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    create_parent(&target)?;

    let mut content = lines.join(ending);
    if !content.is_empty() {
        content.push_str(ending);
    }

    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = target.with_file_name(format!("{file_name}.setup-shell.tmp"));
    fs::write(&tmp, content).map_err(|e| SetupError::io("writing", &tmp, e))?;
    if let Ok(metadata) = fs::metadata(&target) {
        fs::set_permissions(&tmp, metadata.permissions())
            .map_err(|e| SetupError::io("setting permissions on", &tmp, e))?;
    }
    fs::rename(&tmp, &target).map_err(|e| SetupError::io("replacing", &target, e))
}

/// Adds `content` to the end of the file without rewriting what is there.
fn append_block(path: &Path, existing: Option<&str>, content: &str) -> Result<()> {
    create_parent(path)?;
    let ending = line_ending(existing);

    let mut block = String::new();
    if existing.is_some_and(|text| !text.is_empty() && !text.ends_with('\n')) {
        block.push_str(ending);
    }
    for line in content.lines() {
        block.push_str(line);
        block.push_str(ending);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SetupError::io("opening", path, e))?;
    file.write_all(block.as_bytes())
        .map_err(|e| SetupError::io("appending to", path, e))
}

/// Builds a pattern matching any line that contains `fragment` literally.
pub fn contains_pattern(fragment: &str) -> Regex {
    Regex::new(&regex::escape(fragment)).expect("escaped literal is a valid regex")
}

/// Returns `true` when any line of `lines` matches `pattern`.
pub fn any_line_matches(lines: &[String], pattern: &Regex) -> bool {
    lines.iter().any(|line| pattern.is_match(line))
}

/// Appends `content` unless a line already matches `detect`.
///
/// # Arguments
/// * `path`: The resource file; created if missing.
/// * `detect`: Pattern that recognises content already present.
/// * `content`: One line or a multi-line block to append.
pub fn append_if_absent(path: &Path, detect: &Regex, content: &str) -> Result<EditOutcome> {
    let existing = read_content(path)?;
    let lines = split_lines(existing.as_deref());
    if any_line_matches(&lines, detect) {
        log_debug!(
            "[RC Editor] {} already matches /{}/; leaving it alone",
            path.display(),
            detect.as_str()
        );
        return Ok(EditOutcome::Unchanged);
    }

    append_block(path, existing.as_deref(), content)?;
    log_info!(
        "[RC Editor] Appended to {}: {}",
        path.display().to_string().cyan(),
        first_line(content).green()
    );
    Ok(EditOutcome::Appended)
}

/// Replaces the line matching `pattern` with `content`, or appends `content`.
///
/// Afterwards exactly one line matches `pattern` (assuming `content` does):
/// the first match is rewritten in place and any later duplicates are dropped.
/// If the file is already in that state nothing is written and no backup is
/// taken, which keeps repeated runs free of backup clutter.
pub fn replace_or_append(path: &Path, pattern: &Regex, content: &str) -> Result<EditOutcome> {
    let existing = read_content(path)?;
    let ending = line_ending(existing.as_deref());
    let lines = split_lines(existing.as_deref());
    let matching: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(i, _)| i)
        .collect();

    if matching.len() == 1 && lines[matching[0]] == content {
        log_debug!("[RC Editor] {} already has '{}'", path.display(), content);
        return Ok(EditOutcome::Unchanged);
    }

    let backup = backup_existing(path)?;

    let outcome = match matching.first() {
        Some(&first) => {
            let mut updated = Vec::with_capacity(lines.len());
            for (i, line) in lines.into_iter().enumerate() {
                if i == first {
                    updated.push(content.to_string());
                } else if !matching.contains(&i) {
                    updated.push(line);
                }
            }
            write_lines(path, &updated, ending)?;
            log_info!(
                "[RC Editor] Replaced line in {} with: {}",
                path.display().to_string().cyan(),
                content.green()
            );
            EditOutcome::Replaced {
                backup: backup.unwrap_or_default(),
            }
        }
        None => {
            let mut updated = lines;
            updated.push(content.to_string());
            write_lines(path, &updated, ending)?;
            log_info!(
                "[RC Editor] Appended to {}: {}",
                path.display().to_string().cyan(),
                content.green()
            );
            EditOutcome::AppendedWithBackup { backup }
        }
    };
    Ok(outcome)
}

/// Copies `path` to a timestamped sibling. Returns `None` when there is no file yet.
fn backup_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = backup_path_for(path, &Local::now());
    fs::copy(path, &backup).map_err(|e| SetupError::io("backing up", path, e))?;
    log_info!(
        "[RC Editor] Backed up {} to {}",
        path.display(),
        backup.display().to_string().yellow()
    );
    Ok(Some(backup))
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn plugins_pattern() -> Regex {
        Regex::new(r"^\s*plugins=\(").expect("valid regex")
    }

    fn backups_in(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .expect("readable dir")
            .map(|entry| entry.expect("dir entry").path())
            .filter(|path| path.to_string_lossy().contains(".backup."))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn append_if_absent_writes_once_across_many_calls() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        fs::write(&rc, "export EDITOR=vim\n")?;

        let line = r#"eval "$(starship init zsh)""#;
        let detect = Regex::new("starship init zsh")?;
        assert_eq!(append_if_absent(&rc, &detect, line)?, EditOutcome::Appended);
        for _ in 0..4 {
            assert_eq!(append_if_absent(&rc, &detect, line)?, EditOutcome::Unchanged);
        }

        let content = fs::read_to_string(&rc)?;
        assert_eq!(content.matches("starship init zsh").count(), 1);
        assert_eq!(content, "export EDITOR=vim\neval \"$(starship init zsh)\"\n");
        Ok(())
    }

    #[test]
    fn append_creates_missing_file_and_parents() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join("nested/.bashrc");
        let line = ". \"$HOME/.local/bin/env\"";
        assert_eq!(
            append_if_absent(&rc, &contains_pattern(".local/bin/env"), line)?,
            EditOutcome::Appended
        );
        assert_eq!(fs::read_to_string(&rc)?, ". \"$HOME/.local/bin/env\"\n");
        Ok(())
    }

    #[test]
    fn multi_line_block_is_appended_whole() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        let block = "# homebrew\neval \"$(brew shellenv)\"";
        append_if_absent(&rc, &Regex::new("brew shellenv")?, block)?;
        append_if_absent(&rc, &Regex::new("brew shellenv")?, block)?;
        assert_eq!(fs::read_to_string(&rc)?, "# homebrew\neval \"$(brew shellenv)\"\n");
        Ok(())
    }

    #[test]
    fn replace_rewrites_matching_line_and_keeps_a_backup() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        let original = indoc! {r#"
            export ZSH="$HOME/.oh-my-zsh"
            plugins=(git)
            source $ZSH/oh-my-zsh.sh
        "#};
        fs::write(&rc, original)?;

        let new_line = "plugins=(git zsh-autosuggestions zsh-syntax-highlighting)";
        let outcome = replace_or_append(&rc, &plugins_pattern(), new_line)?;

        let backups = backups_in(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(outcome, EditOutcome::Replaced { backup: backups[0].clone() });
        assert_eq!(fs::read_to_string(&backups[0])?, original);

        let lines = split_lines(Some(&fs::read_to_string(&rc)?));
        let matching: Vec<&String> = lines.iter().filter(|l| plugins_pattern().is_match(l)).collect();
        assert_eq!(matching, vec![new_line]);
        assert_eq!(
            lines,
            vec![
                r#"export ZSH="$HOME/.oh-my-zsh""#.to_string(),
                new_line.to_string(),
                "source $ZSH/oh-my-zsh.sh".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn replace_collapses_duplicate_matches() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        fs::write(&rc, "plugins=(git)\necho hi\nplugins=(docker)\n")?;

        replace_or_append(&rc, &plugins_pattern(), "plugins=(git fzf)")?;
        assert_eq!(fs::read_to_string(&rc)?, "plugins=(git fzf)\necho hi\n");
        Ok(())
    }

    #[test]
    fn replace_appends_when_nothing_matches() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        fs::write(&rc, "echo hi\n")?;

        let outcome = replace_or_append(&rc, &plugins_pattern(), "plugins=(git)")?;
        assert!(matches!(outcome, EditOutcome::AppendedWithBackup { backup: Some(_) }));
        assert_eq!(fs::read_to_string(&rc)?, "echo hi\nplugins=(git)\n");
        Ok(())
    }

    #[test]
    fn replace_on_missing_file_creates_it_without_backup() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        let outcome = replace_or_append(&rc, &plugins_pattern(), "plugins=(git)")?;
        assert_eq!(outcome, EditOutcome::AppendedWithBackup { backup: None });
        assert!(backups_in(dir.path()).is_empty());
        Ok(())
    }

    #[test]
    fn crlf_files_keep_their_line_endings() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        fs::write(&rc, "export ZSH=~/.oh-my-zsh\r\nplugins=(git)\r\n")?;

        append_if_absent(&rc, &contains_pattern("starship init"), r#"eval "$(starship init zsh)""#)?;
        replace_or_append(&rc, &plugins_pattern(), "plugins=(git fzf)")?;

        assert_eq!(
            fs::read_to_string(&rc)?,
            "export ZSH=~/.oh-my-zsh\r\nplugins=(git fzf)\r\neval \"$(starship init zsh)\"\r\n"
        );
        Ok(())
    }

    #[test]
    fn append_leaves_existing_bytes_alone() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "export A=1\n\n\n# no newline at end")?;

        append_if_absent(&rc, &contains_pattern(".local/bin/env"), ". \"$HOME/.local/bin/env\"")?;

        assert_eq!(
            fs::read_to_string(&rc)?,
            "export A=1\n\n\n# no newline at end\n. \"$HOME/.local/bin/env\"\n"
        );
        Ok(())
    }

    #[test]
    fn replace_leaves_no_temporary_file_behind() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        fs::write(&rc, "plugins=(git)\n")?;

        replace_or_append(&rc, &plugins_pattern(), "plugins=(git fzf)")?;

        let names: Vec<String> = fs::read_dir(dir.path())?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<_>>()?;
        assert!(names.iter().all(|name| !name.ends_with(".tmp")), "{names:?}");
        assert_eq!(fs::read_to_string(&rc)?, "plugins=(git fzf)\n");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn replace_writes_through_a_symlinked_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("dotfiles/zshrc");
        fs::create_dir_all(target.parent().expect("parent"))?;
        fs::write(&target, "plugins=(git)\n")?;
        let rc = dir.path().join(".zshrc");
        std::os::unix::fs::symlink(&target, &rc)?;

        replace_or_append(&rc, &plugins_pattern(), "plugins=(git fzf)")?;

        assert!(fs::symlink_metadata(&rc)?.file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target)?, "plugins=(git fzf)\n");
        Ok(())
    }

    #[test]
    fn replace_is_a_no_op_when_line_already_current() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rc = dir.path().join(".zshrc");
        fs::write(&rc, "plugins=(git)\n")?;

        assert_eq!(
            replace_or_append(&rc, &plugins_pattern(), "plugins=(git)")?,
            EditOutcome::Unchanged
        );
        assert!(backups_in(dir.path()).is_empty());
        Ok(())
    }
}
