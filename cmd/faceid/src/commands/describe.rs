//! Description lookup and update.

use clap::Args;
use serde::Serialize;

use super::{open_service, output, print_success};
use crate::Cli;

/// Show or change the description of an identity.
#[derive(Args)]
pub struct DescribeCommand {
    /// Identity ID
    id: u64,

    /// Replace the stored description
    #[arg(long)]
    set: Option<String>,
}

#[derive(Serialize)]
struct Description {
    id: u64,
    description: Option<String>,
}

impl DescribeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_service(cli)?;
        let store = svc.descriptions();

        if let Some(text) = &self.set {
            if !store.update(self.id, text)? {
                anyhow::bail!("identity {} has no description to update", self.id);
            }
            print_success(&format!("description of {} updated", self.id));
        }

        let description = Description {
            id: self.id,
            description: store.get(self.id)?,
        };
        output(cli).write(&description)
    }
}
