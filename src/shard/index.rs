//! In-memory shard tables loaded from a postcard-encoded shard file.

use super::{DocId, Posting, ShardReader};
use crate::error::ShardError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fully loaded shard: term → postings and doc id → document name.
///
/// Once loaded the tables are never mutated, so a `ShardIndex` can be read from any
/// number of workers without locking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShardIndex {
    terms: AHashMap<String, Vec<Posting>>,
    docs: AHashMap<DocId, String>,
}

impl ShardIndex {
    /// Create a shard from already-built tables.
    pub fn new(
        terms: impl IntoIterator<Item = (String, Vec<Posting>)>,
        docs: impl IntoIterator<Item = (DocId, String)>,
    ) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            docs: docs.into_iter().collect(),
        }
    }

    /// Load a shard file from disk.
    ///
    /// Decoding happens in `spawn_blocking` since shard files can be large.
    pub async fn open(path: &Path) -> Result<Self, ShardError> {
        let owned = path.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || Self::open_blocking(&owned)).await;

        match loaded {
            Ok(result) => result,
            Err(_) => Err(ShardError::Interrupted {
                path: path.to_path_buf(),
            }),
        }
    }

    fn open_blocking(path: &Path) -> Result<Self, ShardError> {
        let bytes = std::fs::read(path).map_err(|source| ShardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index: Self = postcard::from_bytes(&bytes).map_err(|source| ShardError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            "Loaded shard {} ({} terms, {} docs)",
            path.display(),
            index.term_count(),
            index.document_count()
        );
        Ok(index)
    }

    /// Number of distinct terms in the shard.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Number of documents in the shard's doc table.
    pub fn document_count(&self) -> usize {
        self.docs.len()
    }
}

impl ShardReader for ShardIndex {
    fn lookup_word(&self, term: &str) -> Option<&[Posting]> {
        self.terms.get(term).map(Vec::as_slice)
    }

    fn lookup_doc_id(&self, doc_id: DocId) -> Option<&str> {
        self.docs.get(&doc_id).map(String::as_str)
    }
}
