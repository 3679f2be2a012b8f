//! Index shards: the read-only term and document tables a query runs against.
//!
//! Shards are built offline by the crawler and are only ever read here. Each shard
//! is self-contained: its doc ids mean nothing outside the shard that issued them.

pub(crate) mod index;

pub use index::ShardIndex;

use serde::{Deserialize, Serialize};

/// Shard-local document handle.
pub type DocId = u64;

/// One document's entry in a term's posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Number of occurrences of the term in the document.
    pub frequency: u32,
}

impl Posting {
    pub const fn new(doc_id: DocId, frequency: u32) -> Self {
        Self { doc_id, frequency }
    }
}

/// Read access to one shard's term and document tables.
///
/// Implementations must be safe to read from many workers at once; the query engine
/// holds them behind a shared reference for the life of the process.
pub trait ShardReader: Send + Sync {
    /// Postings for `term`, or `None` when the shard has never seen it.
    fn lookup_word(&self, term: &str) -> Option<&[Posting]>;

    /// The document name for `doc_id`, if the shard knows it.
    fn lookup_doc_id(&self, doc_id: DocId) -> Option<&str>;
}
