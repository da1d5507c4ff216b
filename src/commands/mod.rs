// Register application subcommands.
// Each module corresponds to a specific `setup-shell` command-line action.

// Runs the provisioning pipeline (also the default when no subcommand is given).
pub mod now;
// Displays the version of setup-shell.
pub mod version;
