// Small, dependency-light helpers shared across `libs` and `installers`.

// `~`/`$VAR` expansion, PATH lookups and executable checks.
pub mod path_helpers;
// Timestamped backup names for rewritten resource files.
pub mod timestamps;
