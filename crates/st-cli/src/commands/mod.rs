//! CLI subcommand implementations.

pub mod export;
pub mod report;
pub mod track;
pub mod util;
