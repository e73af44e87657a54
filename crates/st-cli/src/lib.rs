//! Spacetime CLI library.
//!
//! This crate provides the CLI interface for per-workspace time tracking.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
