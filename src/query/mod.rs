//! Multi-shard AND query processing.
//!
//! A query is a list of already-normalized terms. Every shard is searched on its own:
//! a document matches only when its shard has postings for *every* term, and its
//! rank is the sum of those postings' frequencies. Per-shard matches are resolved
//! to document names, merged, and sorted by name then rank.
//!
//! Nothing here knows about HTTP; the web router and the interactive shell share
//! the same [`QueryEngine`].

pub(crate) mod matches;

pub use matches::{CursorMut, MatchList};

use crate::error::ShardError;
use crate::shard::{DocId, Posting, ShardIndex, ShardReader};
use ahash::{AHashMap, AHashSet};
use std::path::PathBuf;

const WEB_PREFIX: &str = "http://";

/// Where a matched document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentSource {
    /// Crawled from the local filesystem; served from the static root.
    Local,
    /// An absolute `http://` URL.
    Web,
}

impl DocumentSource {
    fn of(document_name: &str) -> Self {
        if document_name.starts_with(WEB_PREFIX) {
            Self::Web
        } else {
            Self::Local
        }
    }
}

/// A matched document and its rank.
///
/// Ordered by `document_name`, then `rank`. `source` is derived from the name, so it
/// never changes the ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryResult {
    pub document_name: String,
    pub rank: u64,
    pub source: DocumentSource,
}

impl QueryResult {
    pub fn new(document_name: impl Into<String>, rank: u64) -> Self {
        let document_name = document_name.into();
        let source = DocumentSource::of(&document_name);
        Self {
            document_name,
            rank,
            source,
        }
    }
}

/// A running per-shard match: a doc id and its accumulated rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShardMatch {
    doc_id: DocId,
    rank: u64,
}

/// Runs AND queries across a fixed, ordered set of shards.
pub struct QueryEngine {
    shards: Vec<Box<dyn ShardReader>>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("shard_count", &self.shards.len())
            .finish()
    }
}

impl QueryEngine {
    /// Open every shard file, in order.
    ///
    /// Fails on the first shard that cannot be opened; there is no partially loaded
    /// engine.
    ///
    /// # Panics
    /// If `paths` is empty.
    pub async fn open(paths: &[PathBuf]) -> Result<Self, ShardError> {
        assert!(!paths.is_empty(), "QueryEngine needs at least one shard");

        let mut shards: Vec<Box<dyn ShardReader>> = Vec::with_capacity(paths.len());
        for path in paths {
            let shard = ShardIndex::open(path).await?;
            tracing::info!(
                "Opened shard {} ({} terms, {} docs)",
                path.display(),
                shard.term_count(),
                shard.document_count()
            );
            shards.push(Box::new(shard));
        }

        Ok(Self { shards })
    }

    /// Build an engine over readers that are already open.
    ///
    /// # Panics
    /// If `shards` is empty.
    pub fn from_readers(shards: Vec<Box<dyn ShardReader>>) -> Self {
        assert!(!shards.is_empty(), "QueryEngine needs at least one shard");
        Self { shards }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Find the documents containing every term, across all shards.
    ///
    /// An empty result means nothing matched.
    ///
    /// # Panics
    /// If `terms` is empty.
    pub fn process_query<S: AsRef<str>>(&self, terms: &[S]) -> Vec<QueryResult> {
        assert!(!terms.is_empty(), "process_query called with no terms");

        let mut results = Vec::new();
        for shard in &self.shards {
            let matches = intersect_terms(shard.as_ref(), terms);
            resolve_names(shard.as_ref(), matches, &mut results);
        }

        results.sort();
        results
    }
}

/// Intersect the posting lists of all `terms` within one shard.
fn intersect_terms<S: AsRef<str>>(shard: &dyn ShardReader, terms: &[S]) -> MatchList<ShardMatch> {
    let Some(first) = shard.lookup_word(terms[0].as_ref()) else {
        return MatchList::new();
    };

    let mut matches: MatchList<ShardMatch> = first_occurrences(first)
        .into_iter()
        .map(|(doc_id, frequency)| ShardMatch {
            doc_id,
            rank: u64::from(frequency),
        })
        .collect();

    for term in &terms[1..] {
        let Some(postings) = shard.lookup_word(term.as_ref()) else {
            matches.clear();
            break;
        };

        let frequencies: AHashMap<DocId, u32> = first_occurrences(postings).into_iter().collect();
        let mut cursor = matches.cursor_mut();
        let mut emptied = false;
        while let Some(current) = cursor.current_mut() {
            if let Some(&frequency) = frequencies.get(&current.doc_id) {
                current.rank += u64::from(frequency);
                cursor.move_next();
            } else if let Some((_, now_empty)) = cursor.remove_current() {
                emptied = now_empty;
            }
        }

        if emptied {
            break;
        }
    }

    matches
}

/// The postings in list order, keeping only the first entry for each doc id.
fn first_occurrences(postings: &[Posting]) -> Vec<(DocId, u32)> {
    let mut seen = AHashSet::with_capacity(postings.len());
    postings
        .iter()
        .filter(|posting| seen.insert(posting.doc_id))
        .map(|posting| (posting.doc_id, posting.frequency))
        .collect()
}

fn resolve_names(
    shard: &dyn ShardReader,
    matches: MatchList<ShardMatch>,
    results: &mut Vec<QueryResult>,
) {
    for found in matches {
        match shard.lookup_doc_id(found.doc_id) {
            Some(name) => results.push(QueryResult::new(name, found.rank)),
            None => tracing::debug!("Dropping doc id {} with no name", found.doc_id),
        }
    }
}
