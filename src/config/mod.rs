//! Environment-sourced configuration.
mod env_vars;

pub use env_vars::{log_level_from_env, parse_capture_duration, YarderConfig};
