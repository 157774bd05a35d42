//! `spfe`: serve the partial store, upload files in chunks, merge results.

mod commands;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "spfe")]
#[command(about = "Chunked file upload with fault-tolerant partial storage")]
#[command(version)]
struct Cli {
    /// Config file path (default: ~/.config/spfe/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server until Ctrl-C
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Durable primary directory (overrides config)
        #[arg(long)]
        primary_dir: Option<PathBuf>,

        /// Fallback directory (overrides config)
        #[arg(long)]
        fallback_dir: Option<PathBuf>,
    },
    /// Upload a file in chunks
    Upload {
        /// File to upload
        path: PathBuf,

        /// File identifier (default: the file name)
        #[arg(long)]
        file_id: Option<String>,

        /// Chunk size in bytes (overrides config)
        #[arg(long)]
        chunk_size: Option<u64>,

        /// Concurrent uploads (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Retry rounds for failed chunks
        #[arg(long, default_value_t = 2)]
        retries: u32,

        /// Server URL (overrides config)
        #[arg(long)]
        server: Option<String>,
    },
    /// Print the aggregate manifest of a file
    Merge {
        file_id: String,

        /// Server URL (overrides config)
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,spfe=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            bind,
            primary_dir,
            fallback_dir,
        } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if primary_dir.is_some() {
                config.primary_dir = primary_dir;
            }
            if fallback_dir.is_some() {
                config.fallback_dir = fallback_dir;
            }
            config.validate()?;
            commands::serve(&config).await
        }
        Commands::Upload {
            path,
            file_id,
            chunk_size,
            concurrency,
            retries,
            server,
        } => {
            if let Some(size) = chunk_size {
                config.chunk_size = size;
            }
            if let Some(n) = concurrency {
                config.concurrency = n;
            }
            if let Some(url) = server {
                config.server_url = url;
            }
            config.validate()?;
            commands::upload(&config, &path, file_id, retries).await
        }
        Commands::Merge { file_id, server } => {
            if let Some(url) = server {
                config.server_url = url;
            }
            commands::merge(&config, &file_id).await
        }
    }
}
