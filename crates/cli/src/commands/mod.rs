//! Subcommand implementations.

pub mod config_cmd;
pub mod context;
pub mod parse;
pub mod roles;
