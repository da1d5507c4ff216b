// This file handles the `setup-shell version` command.
// The version is baked in at compile time from `Cargo.toml`.

use colored::Colorize;

use crate::log_debug;

/// Name and version of this build, e.g. `setup-shell 0.3.1`.
pub fn version_string() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Prints the version to stdout.
pub fn run() {
    log_debug!("Entered version::run() function.");
    println!("{}", version_string().bold());
}
