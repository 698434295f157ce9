//! Configuration commands.

use clap::{Args, Subcommand};

use facekeep_cli::{save_config, Config};

use super::{get_config, output, print_success, APP_NAME};
use crate::Cli;

/// Manage CLI configuration.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Overwrite the config file with defaults
    Init,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                output(cli).write(&cfg)
            }
            ConfigSubcommand::Path => {
                let cfg = get_config(cli)?;
                println!("{}", cfg.path().display());
                Ok(())
            }
            ConfigSubcommand::Init => {
                let path = save_config(APP_NAME, &Config::default(), cli.config.as_deref())?;
                print_success(&format!("wrote defaults to {}", path.display()));
                Ok(())
            }
        }
    }
}
