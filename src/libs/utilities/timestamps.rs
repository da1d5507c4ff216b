use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};

/// Format of the suffix appended to backup copies: `20261017_093015`.
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Renders a timestamp the way backup file names carry it.
///
/// # Examples
/// ```ignore
/// use chrono::Local;
/// use crate::libs::utilities::timestamps::backup_stamp;
///
/// let stamp = backup_stamp(&Local::now());
/// assert_eq!(stamp.len(), 15); // e.g. "20261017_093015"
/// ```
pub fn backup_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(BACKUP_STAMP_FORMAT).to_string()
}

/// Computes a free backup path next to `original`: `<name>.backup.<stamp>`.
///
/// Two edits inside the same second would collide on the plain name, so a
/// `-<n>` counter is appended until the name is unused.
pub fn backup_path_for(original: &Path, at: &DateTime<Local>) -> PathBuf {
    let file_name = original
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rc".to_string());
    let base = format!("{file_name}.backup.{}", backup_stamp(at));

    let mut candidate = original.with_file_name(&base);
    let mut counter = 1;
    while candidate.exists() {
        candidate = original.with_file_name(format!("{base}-{counter}"));
        counter += 1;
    }
    candidate
}
