//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which opens the cache
//! once from the resolved configuration and routes CLI subcommands to their
//! implementations.

pub mod clear;
pub mod dispatcher;
pub mod display;
pub mod fetch;
pub mod invalidate;
pub mod list;
pub mod show;
pub mod stats;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
