//! CLI utilities for facekeep.
//!
//! This crate provides the configuration file, embedding input loading and
//! output formatting shared by command-line front ends.

pub mod config;
pub mod embedding;
pub mod output;

pub use config::{load_config, save_config, Config};
pub use embedding::{load_embedding, parse_embedding, EmbeddingError};
pub use output::{Output, OutputFormat, print_verbose};
