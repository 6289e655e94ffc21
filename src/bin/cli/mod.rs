//! CLI Module Organization
//!
//! - args: CLI argument structures and their `PLUGIN_*` environment bindings
//! - commands: command execution
//! - config_layer: configuration layer management and merging
//! - output: terminal display

pub mod args;
pub mod commands;
pub mod config_layer;
pub mod output;

pub use args::*;
pub use commands::*;
