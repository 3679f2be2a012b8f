//! Shared fixtures for integration tests.
//!
//! [`SearchSite`] lays out a temporary static root and two shard files, opens a
//! [`QueryEngine`] over them, and can start a real server on an ephemeral port.

use rstest::fixture;
use shard_search::net::AddressFamily;
use shard_search::{ClosePolicy, Posting, QueryEngine, Server, ServerConfig, ShardIndex};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Encode a shard file from `(term, [(doc_id, freq)])` and `(doc_id, name)` tables.
pub fn write_shard(
    dir: &Path,
    file_name: &str,
    terms: &[(&str, &[(u64, u32)])],
    docs: &[(u64, &str)],
) -> PathBuf {
    let terms = terms
        .iter()
        .map(|(term, postings)| {
            let postings = postings
                .iter()
                .map(|&(doc_id, frequency)| Posting::new(doc_id, frequency))
                .collect::<Vec<_>>();
            ((*term).to_string(), postings)
        })
        .collect::<HashMap<_, _>>();
    let docs = docs
        .iter()
        .map(|&(doc_id, name)| (doc_id, name.to_string()))
        .collect::<HashMap<_, _>>();

    let path = dir.join(file_name);
    let bytes = postcard::to_stdvec(&ShardIndex::new(terms, docs)).expect("encode shard");
    std::fs::write(&path, bytes).expect("write shard");
    path
}

/// A static root plus two shards in a temp directory.
pub struct SearchSite {
    _temp: TempDir,
    pub static_root: PathBuf,
    pub shards: Vec<PathBuf>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl SearchSite {
    pub async fn engine(&self) -> QueryEngine {
        QueryEngine::open(&self.shards).await.expect("open shards")
    }

    pub fn config(&self, close_policy: ClosePolicy) -> ServerConfig {
        let mut config = ServerConfig::new(&self.static_root, self.shards.clone());
        config.family = AddressFamily::V4;
        config.reverse_dns = false;
        config.workers = 8;
        config.close_policy = close_policy;
        config
    }

    /// Bind a server on an ephemeral port and run it in the background.
    pub async fn start(&self, close_policy: ClosePolicy) -> SocketAddr {
        let config = self.config(close_policy);
        let engine = Arc::new(self.engine().await);
        let server = Server::bind(&config, engine).expect("bind server");
        let port = server.local_addr().expect("bound address").port();

        tokio::spawn(server.run());
        SocketAddr::from(([127, 0, 0, 1], port))
    }
}

#[fixture]
pub fn search_site() -> SearchSite {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let static_root = temp.path().join("static");
    std::fs::create_dir_all(static_root.join("docs")).unwrap();
    std::fs::write(static_root.join("docs/intro.txt"), "the quick brown fox").unwrap();
    std::fs::write(static_root.join("index.html"), "<h1>home</h1>").unwrap();

    let shard_one = write_shard(
        temp.path(),
        "one.idx",
        &[
            ("fox", &[(1, 3), (2, 1), (1, 3)]),
            ("brown", &[(1, 1)]),
            ("lazy", &[(2, 4)]),
        ],
        &[(1, "./test_tree/docs/intro.txt"), (2, "./test_tree/docs/dog.txt")],
    );
    let shard_two = write_shard(
        temp.path(),
        "two.idx",
        &[("fox", &[(7, 2)]), ("brown", &[(7, 5)])],
        &[(7, "http://example.com/fox.html")],
    );

    SearchSite {
        _temp: temp,
        static_root,
        shards: vec![shard_one, shard_two],
    }
}

/// Send raw bytes, half-close, and collect everything the server writes back.
#[allow(dead_code)]
pub async fn round_trip(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(request).await.expect("send");
    stream.shutdown().await.expect("half-close");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.expect("receive");
    String::from_utf8_lossy(&response).into_owned()
}
