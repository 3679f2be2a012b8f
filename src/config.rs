//! Server-wide configuration, fixed at startup and shared read-only by every worker.

use crate::cli::ServeArgs;
use crate::error::Result;
use crate::net::AddressFamily;
use anyhow::{Context, bail};
use std::path::PathBuf;

/// Worker count when none is given.
pub const DEFAULT_WORKERS: usize = 100;

/// Prefix the crawler puts on local document names.
pub const DEFAULT_CRAWL_ROOT: &str = "./test_tree/";

/// What to do with a request that carries `Connection: close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ClosePolicy {
    /// Close immediately; the request carrying the header gets no response.
    #[default]
    DropFinal,
    /// Answer the request, then close.
    RespondThenClose,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub family: AddressFamily,
    pub reverse_dns: bool,
    pub workers: usize,
    /// Directory served under `/static/`.
    pub static_root: PathBuf,
    /// Shard files, searched in this order.
    pub shards: Vec<PathBuf>,
    pub crawl_root: String,
    pub close_policy: ClosePolicy,
}

impl ServerConfig {
    /// A config with defaults for everything but the static root and shards.
    pub fn new(static_root: impl Into<PathBuf>, shards: Vec<PathBuf>) -> Self {
        Self {
            port: 0,
            family: AddressFamily::default(),
            reverse_dns: true,
            workers: DEFAULT_WORKERS,
            static_root: static_root.into(),
            shards,
            crawl_root: DEFAULT_CRAWL_ROOT.to_string(),
            close_policy: ClosePolicy::default(),
        }
    }

    /// Validate command-line arguments into a config.
    ///
    /// The static directory must exist. Index arguments that are not regular files are
    /// skipped with a warning, but at least one must remain.
    pub fn from_args(args: ServeArgs) -> Result<Self> {
        let metadata = std::fs::metadata(&args.static_dir).with_context(|| {
            format!("Cannot read static directory {}", args.static_dir.display())
        })?;
        if !metadata.is_dir() {
            bail!("{} is not a directory", args.static_dir.display());
        }
        if args.workers == 0 {
            bail!("Worker count must be at least 1");
        }

        let shards: Vec<PathBuf> = args
            .indices
            .into_iter()
            .filter(|path| {
                let is_file = path.is_file();
                if !is_file {
                    tracing::warn!("Skipping index {}: not a readable file", path.display());
                }
                is_file
            })
            .collect();
        if shards.is_empty() {
            bail!("No usable index files given");
        }

        Ok(Self {
            port: args.port,
            family: args.family,
            reverse_dns: !args.no_reverse_dns,
            workers: args.workers,
            static_root: args.static_dir,
            shards,
            crawl_root: args.crawl_root,
            close_policy: args.close_policy,
        })
    }
}
