use crate::config::{ClosePolicy, DEFAULT_CRAWL_ROOT, DEFAULT_WORKERS};
use crate::net::AddressFamily;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "shard-search")]
#[command(about = "Multi-shard search engine with a pipelined HTTP front end", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve static files and queries over HTTP.
    Serve(ServeArgs),
    /// Run queries interactively from stdin.
    Shell {
        #[arg(required = true)]
        indices: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(value_parser = clap::value_parser!(u16).range(1024..))]
    pub port: u16,
    /// Directory served under /static/.
    pub static_dir: PathBuf,
    /// Shard files, searched in order.
    #[arg(required = true)]
    pub indices: Vec<PathBuf>,
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
    #[arg(long, value_enum, default_value_t = AddressFamily::Unspecified)]
    pub family: AddressFamily,
    /// Prefix stripped from local document names before linking under /static/.
    #[arg(long, default_value = DEFAULT_CRAWL_ROOT)]
    pub crawl_root: String,
    #[arg(long, value_enum, default_value_t = ClosePolicy::DropFinal)]
    pub close_policy: ClosePolicy,
    #[arg(long)]
    pub no_reverse_dns: bool,
}
