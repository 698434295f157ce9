//! CLI commands module.

mod config;
mod describe;
mod identity;
mod util;

pub use config::ConfigCommand;
pub use describe::DescribeCommand;
pub use identity::{CountCommand, RecognizeCommand, RegisterCommand, SearchCommand};

// Re-export utils for use in commands
pub(crate) use util::*;
