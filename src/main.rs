use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use code_sync_rag::mcp_server::CodeSyncMcpServer;
use code_sync_rag::{CodeSyncClient, Config, SearchRequest, UpdateRequest};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "code-sync-rag")]
#[command(about = "Index a web codebase, search it, and edit chunks in place")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "CODE_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder to index, overriding the config
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio
    Serve,
    /// Rebuild the index from the root folder
    Index,
    /// Semantic search over the index
    Search {
        query: String,
        /// Defaults to `search.default_top_k` from the config
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Replace one chunk in its file and in the index
    Update {
        chunk_id: u64,
        /// File holding the new code; reads stdin when omitted
        #[arg(long)]
        code_file: Option<PathBuf>,
    },
    /// Chunk counts per language
    Stats,
    /// Index and rebuild status
    Health,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_new_code(code_file: Option<PathBuf>) -> Result<String> {
    match code_file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries MCP frames and command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.indexing.root_path = root;
    }

    let client = CodeSyncClient::new(config).await?;

    match cli.command {
        Commands::Serve => {
            CodeSyncMcpServer::with_client(Arc::new(client))
                .run_stdio()
                .await?
        }
        Commands::Index => {
            let cancel_token = CancellationToken::new();
            let ctrl_c_token = cancel_token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, cancelling rebuild");
                    ctrl_c_token.cancel();
                }
            });
            print_json(&client.rebuild(cancel_token).await?)?;
        }
        Commands::Search { query, top_k } => {
            print_json(&client.search(SearchRequest { query, top_k }).await?)?;
        }
        Commands::Update {
            chunk_id,
            code_file,
        } => {
            let new_code = read_new_code(code_file)?;
            let response = client.update(UpdateRequest { chunk_id, new_code }).await?;
            print_json(&response)?;
            if !response.success {
                std::process::exit(1);
            }
        }
        Commands::Stats => print_json(&client.statistics().await?)?,
        Commands::Health => print_json(&client.health().await?)?,
    }

    Ok(())
}
