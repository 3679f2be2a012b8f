//! Multi-shard search engine with a concurrent, pipelined HTTP front end.
//!
//! - **`shard`**: read-only term and document tables, one per index shard.
//! - **`query`**: AND queries across shards, ranked by summed term frequency.
//! - **`net`**: listening socket with explicit address-family selection.
//! - **`http`**: request-head framing over persistent connections.
//! - **`server`**: accept loop, worker pool and request routing.
//! - **`shell`**: interactive queries from stdin.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod query;
pub mod server;
pub mod shard;
pub mod shell;
pub mod tracing;

pub use config::{ClosePolicy, ServerConfig};
pub use query::{DocumentSource, QueryEngine, QueryResult};
pub use server::Server;
pub use shard::{DocId, Posting, ShardIndex, ShardReader};
