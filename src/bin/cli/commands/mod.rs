//! Command implementations for the sonargate CLI.

pub mod check;
pub mod config;

pub use check::check_command;
pub use config::{init_config, print_default_config, validate_config};
