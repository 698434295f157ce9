//! Recognition and registration commands.

use clap::Args;
use facekeep_cli::load_embedding;
use serde::Serialize;

use super::{open_service, output, print_success, print_verbose};
use crate::Cli;

/// Identify the person an embedding belongs to.
#[derive(Args)]
pub struct RecognizeCommand {
    /// Embedding file (YAML or JSON, `-` for stdin)
    #[arg(short = 'f', long = "file")]
    input: String,
}

impl RecognizeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let embedding = load_embedding(&self.input)?;
        print_verbose(cli, &format!("loaded {}-d embedding", embedding.len()));

        let svc = open_service(cli)?;
        let person = svc.recognize(embedding).await?;
        output(cli).write(&person)
    }
}

/// Register a new person unless the face is already known.
#[derive(Args)]
pub struct RegisterCommand {
    /// Embedding file (YAML or JSON, `-` for stdin)
    #[arg(short = 'f', long = "file")]
    input: String,

    /// Description of the person
    #[arg(short = 'd', long)]
    description: String,
}

impl RegisterCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let embedding = load_embedding(&self.input)?;
        let svc = open_service(cli)?;
        let person = svc.register(embedding, self.description.clone()).await?;
        if let Some(id) = person.id {
            print_success(&format!("{} ({})", person.status, id));
        }
        output(cli).write(&person)
    }
}

/// List accepted nearest identities.
#[derive(Args)]
pub struct SearchCommand {
    /// Embedding file (YAML or JSON, `-` for stdin)
    #[arg(short = 'f', long = "file")]
    input: String,

    /// Number of neighbors to consult
    #[arg(short = 'k', long, default_value_t = 5)]
    k: usize,
}

#[derive(Serialize)]
struct SearchHit {
    id: u64,
    distance: f32,
    confidence: f32,
}

impl SearchCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let embedding = load_embedding(&self.input)?;
        let svc = open_service(cli)?;
        let hits: Vec<SearchHit> = svc
            .search(embedding, self.k)
            .await?
            .into_iter()
            .map(|c| SearchHit {
                id: c.id,
                distance: c.distance,
                confidence: c.confidence,
            })
            .collect();
        output(cli).write(&hits)
    }
}

/// Print the number of stored embeddings.
#[derive(Args)]
pub struct CountCommand {}

#[derive(Serialize)]
struct CountReport {
    total: usize,
    next_id: u64,
}

impl CountCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let svc = open_service(cli)?;
        let report = CountReport {
            total: svc.total_count(),
            next_id: svc.index().next_id(),
        };
        output(cli).write(&report)
    }
}
