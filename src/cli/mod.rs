//! Command-line interface for rescache.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{ClearArgs, Cli, Commands, FetchArgs, InvalidateArgs, ListArgs, ShowArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
