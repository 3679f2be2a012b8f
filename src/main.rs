use anyhow::Context;
use clap::Parser;
use shard_search::cli::{Cli, Commands};
use shard_search::{QueryEngine, Server, ServerConfig, shell};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shard_search::tracing::init();

    match Cli::parse().command {
        Commands::Serve(args) => {
            let config = ServerConfig::from_args(args)?;
            tracing::info!(
                "Starting shard-search on port {} (static files: {}, {} shards)",
                config.port,
                config.static_root.display(),
                config.shards.len()
            );

            let engine = QueryEngine::open(&config.shards)
                .await
                .context("Failed to open index shards")?;
            let server = Server::bind(&config, Arc::new(engine))?;
            server.run().await?;

            tracing::info!("Server completed, exiting");
        }
        Commands::Shell { indices } => {
            let engine = QueryEngine::open(&indices)
                .await
                .context("Failed to open index shards")?;

            tokio::task::block_in_place(|| {
                shell::run(&engine, std::io::stdin().lock(), std::io::stdout().lock())
            })?;
        }
    }

    Ok(())
}
