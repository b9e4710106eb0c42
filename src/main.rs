use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kb_gateway::{Query, SearchEngine, load_store};

#[derive(Parser)]
#[command(name = "kb-gateway")]
#[command(about = "Query the knowledge base served by the gateway", long_about = None)]
struct Cli {
    /// YAML or JSON corpus file; the built-in sample is used when omitted
    #[arg(short, long, value_name = "FILE")]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank documents against a free-text query
    Search {
        query: String,

        #[arg(long, default_value_t = kb_gateway::DEFAULT_MAX_RESULTS)]
        limit: usize,
    },
    /// Print a single document as JSON
    Fetch { id: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = load_store(cli.corpus.as_deref()).context("failed to load corpus")?;

    match cli.command {
        Commands::Search { query, limit } => {
            let engine = SearchEngine::new(Arc::new(store)).with_max_results(limit);
            let results = engine.search(&Query::new(query));
            if results.is_empty() {
                println!("no matches");
            }
            for (rank, hit) in results.iter().enumerate() {
                println!("{}. [{}] {} (score {})", rank + 1, hit.id, hit.title, hit.score);
                println!("   {}", hit.snippet);
            }
        }
        Commands::Fetch { id } => {
            let doc = store.get(&id)?;
            println!("{}", serde_json::to_string_pretty(doc)?);
        }
    }

    Ok(())
}
