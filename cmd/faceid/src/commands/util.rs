//! Utility functions for CLI commands.

use std::sync::Arc;

use facekeep_cli::{load_config, Config, Output, OutputFormat};
use facekeep_faceid::{IdentityService, RedbDescriptions};
use facekeep_vecstore::{EmbeddingIndex, LoadOutcome};
use tracing::debug;

use crate::Cli;

pub const APP_NAME: &str = "faceid";

/// Gets the validated configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    let cfg = load_config(APP_NAME, cli.config.as_deref())?;
    cfg.validate()?;
    Ok(cfg)
}

/// Opens the index and description store named by the configuration.
pub fn open_service(cli: &Cli) -> anyhow::Result<IdentityService> {
    let cfg = get_config(cli)?;
    debug!(
        index = %cfg.index_path().display(),
        descriptions = %cfg.descriptions_file().display(),
        "opening identity service"
    );

    let index = EmbeddingIndex::open(cfg.index_path(), cfg.dim);
    match index.load_outcome() {
        LoadOutcome::Recovered { reason } => print_warning(&format!(
            "index at {} could not be loaded, starting empty: {}",
            index.path().display(),
            reason
        )),
        outcome => print_verbose(
            cli,
            &format!("index {}: {}", index.path().display(), outcome),
        ),
    }

    let descriptions = RedbDescriptions::open(cfg.descriptions_file())?;
    let svc = IdentityService::new(
        Arc::new(index),
        Arc::new(descriptions),
        cfg.service_config(),
    )?;
    Ok(svc)
}

/// Builds the output writer from global flags.
pub fn output(cli: &Cli) -> Output {
    Output::new(OutputFormat::from_json_flag(cli.json), cli.output.clone())
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    facekeep_cli::print_verbose(cli.verbose, msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}
