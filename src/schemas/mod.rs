// Data shapes shared across the pipeline.

// Runtime snapshot of the consumed environment variables.
pub mod environment;
// YAML configuration schema with built-in defaults.
pub mod setup_config;
