//! Maps a request to static-file or search handling.

use super::files::{FileReader, content_type};
use crate::http::{Request, Response, Status, escape_html};
use crate::query::{DocumentSource, QueryEngine, QueryResult};
use percent_encoding::percent_decode_str;
use std::fmt::Write as _;
use std::sync::Arc;
use url::Url;

/// Paths under this prefix are served from the static root.
pub const STATIC_PREFIX: &str = "/static/";

const QUERY_PATH: &str = "/query";
const TERMS_PARAM: &str = "terms";

/// Used only to resolve request paths; the host is never contacted.
const BASE_URL: &str = "http://localhost/";

const LANDING_PAGE: &str = "<html><head><title>shard-search</title></head>\n\
<body>\n\
<center style=\"font-size:500%;\">\n\
<span style=\"color:steelblue;\">shard</span><span style=\"color:darkorange;\">search</span>\n\
</center>\n\
<p>\n\
<div style=\"height:20px;\"></div>\n\
<center>\n\
<form action=\"/query\" method=\"get\">\n\
<input type=\"text\" size=30 name=\"terms\" />\n\
<input type=\"submit\" value=\"Search\" />\n\
</form>\n\
</center><p>\n";

const PAGE_END: &str = "</body>\r\n</html>\r\n";

/// Builds the response for each request. Shared read-only by all workers.
#[derive(Debug)]
pub struct RequestRouter {
    files: FileReader,
    engine: Arc<QueryEngine>,
    crawl_root: String,
}

impl RequestRouter {
    pub fn new(files: FileReader, engine: Arc<QueryEngine>, crawl_root: impl Into<String>) -> Self {
        Self {
            files,
            engine,
            crawl_root: crawl_root.into(),
        }
    }

    pub async fn route(&self, request: &Request) -> Response {
        let target = resolve(request.path());

        if request.path().starts_with(STATIC_PREFIX) {
            let file_name = target
                .as_ref()
                .and_then(|url| url.path().strip_prefix(STATIC_PREFIX))
                .map(|encoded| percent_decode_str(encoded).decode_utf8_lossy().into_owned())
                .unwrap_or_default();
            return self.file_response(&file_name).await;
        }

        let terms = target.as_ref().and_then(search_terms);
        self.search_response(terms.as_deref()).await
    }

    async fn file_response(&self, file_name: &str) -> Response {
        if let Some(contents) = self.files.read_file(file_name).await {
            tracing::debug!("Serving static file {}", file_name);
            let mut response = Response::new(Status::Ok).with_content_type(content_type(file_name));
            response.append_to_body(contents);
            return response;
        }

        tracing::debug!("Static file not found: {}", file_name);
        let mut response = Response::new(Status::NotFound);
        response.append_to_body(format!(
            "<html><body>Couldn't find file \"{}\"</body></html>\n",
            escape_html(file_name)
        ));
        response
    }

    async fn search_response(&self, terms: Option<&str>) -> Response {
        let mut response = Response::new(Status::Ok);
        response.append_to_body(LANDING_PAGE);

        if let Some(raw) = terms {
            let terms = raw.trim().to_lowercase();
            let words: Vec<String> = terms.split_whitespace().map(str::to_owned).collect();
            let results = if words.is_empty() {
                Vec::new()
            } else {
                self.run_query(words).await
            };
            tracing::debug!("Query {:?} matched {} documents", terms, results.len());
            response.append_to_body(self.render_results(&terms, &results));
        }

        response.append_to_body(PAGE_END);
        response
    }

    /// Intersection and sorting run on the blocking pool, off the worker's thread.
    async fn run_query(&self, words: Vec<String>) -> Vec<QueryResult> {
        let engine = Arc::clone(&self.engine);
        match tokio::task::spawn_blocking(move || engine.process_query(&words)).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("Query task failed: {}", e);
                Vec::new()
            }
        }
    }

    fn render_results(&self, terms: &str, results: &[QueryResult]) -> String {
        let terms = escape_html(terms);
        if results.is_empty() {
            return format!("<p><br>\r\nNo results found for <b>{terms}</b><p>\r\n\r\n");
        }

        let plural = if results.len() > 1 { "s" } else { "" };
        let mut html = format!(
            "<p><br>\r\n{} result{} found for <b>{}</b><p>\r\n\r\n<ul>\r\n",
            results.len(),
            plural,
            terms
        );

        for result in results {
            let (href, label) = match result.source {
                DocumentSource::Web => (result.document_name.clone(), result.document_name.as_str()),
                DocumentSource::Local => {
                    let relative = result
                        .document_name
                        .strip_prefix(self.crawl_root.as_str())
                        .unwrap_or(&result.document_name);
                    (format!("{STATIC_PREFIX}{relative}"), relative)
                }
            };
            let _ = write!(
                html,
                "<li>\n<a href=\"{}\">{}</a> [{}]<br>\n</li>\n",
                escape_html(&href),
                escape_html(label),
                result.rank
            );
        }

        html.push_str("</ul>\r\n");
        html
    }
}

fn resolve(path: &str) -> Option<Url> {
    Url::parse(BASE_URL).ok()?.join(path).ok()
}

/// The `terms` parameter of a `/query` request, if present.
fn search_terms(url: &Url) -> Option<String> {
    if url.path() != QUERY_PATH {
        return None;
    }
    url.query_pairs()
        .find(|(name, _)| name == TERMS_PARAM)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::{DocId, Posting, ShardIndex, ShardReader};
    use assert2::check;
    use rstest::{fixture, rstest};
    use std::collections::HashMap;
    use std::sync::{Mutex, mpsc};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Site {
        _dir: TempDir,
        router: RequestRouter,
    }

    #[fixture]
    fn site() -> Site {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("page.html"), b"<p>hi</p>").unwrap();
        std::fs::write(dir.path().join("my file.txt"), b"spaced").unwrap();

        let terms = HashMap::from([
            ("rust".to_string(), vec![Posting::new(1, 2), Posting::new(2, 7)]),
            ("crab".to_string(), vec![Posting::new(2, 1)]),
        ]);
        let docs = HashMap::from([
            (1, "./test_tree/book/ch1.txt".to_string()),
            (2, "http://example.com/<crab>".to_string()),
        ]);
        let shard: Box<dyn ShardReader> = Box::new(ShardIndex::new(terms, docs));
        let engine = Arc::new(QueryEngine::from_readers(vec![shard]));

        let router = RequestRouter::new(FileReader::new(dir.path()).unwrap(), engine, "./test_tree/");
        Site { _dir: dir, router }
    }

    async fn route(site: &Site, path: &str) -> Response {
        site.router.route(&Request::new(path)).await
    }

    #[rstest]
    #[tokio::test]
    async fn static_file_is_served_with_type(site: Site) {
        let response = route(&site, "/static/page.html").await;
        check!(response.status() == Status::Ok);
        check!(response.content_type() == "text/html");
        check!(response.body() == b"<p>hi</p>");
    }

    #[rstest]
    #[tokio::test]
    async fn static_path_is_percent_decoded(site: Site) {
        let response = route(&site, "/static/my%20file.txt").await;
        check!(response.status() == Status::Ok);
        check!(response.content_type() == "text/plain");
    }

    #[rstest]
    #[tokio::test]
    async fn missing_static_file_is_404_with_escaped_name(site: Site) {
        let response = route(&site, "/static/<nope>.html").await;
        check!(response.status() == Status::NotFound);
        check!(response.body_text().contains("&lt;nope&gt;.html"));
        check!(!response.body_text().contains("<nope>"));
    }

    #[rstest]
    #[case("/")]
    #[case("/anything")]
    #[case("/query")]
    #[case("/x/query?terms=rust")]
    #[tokio::test]
    async fn non_query_paths_show_landing_only(site: Site, #[case] path: &str) {
        let response = route(&site, path).await;
        check!(response.status() == Status::Ok);
        check!(response.body_text().contains("<form action=\"/query\""));
        check!(!response.body_text().contains("found for"));
    }

    #[rstest]
    #[tokio::test]
    async fn query_lists_results_with_links(site: Site) {
        let response = route(&site, "/query?terms=+RUST++").await;
        let body = response.body_text();
        check!(response.status() == Status::Ok);
        check!(body.contains("2 results found for <b>rust</b>"));
        check!(body.contains("<a href=\"/static/book/ch1.txt\">book/ch1.txt</a> [2]"));
        check!(body.contains(
            "<a href=\"http://example.com/&lt;crab&gt;\">http://example.com/&lt;crab&gt;</a> [7]"
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn multi_term_query_sums_ranks(site: Site) {
        let body = route(&site, "/query?terms=rust%20crab").await.body_text().into_owned();
        check!(body.contains("1 result found for <b>rust crab</b>"));
        check!(body.contains("[8]"));
    }

    #[rstest]
    #[case("/query?terms=zebra")]
    #[case("/query?terms=")]
    #[case("/query?terms=%20%20")]
    #[tokio::test]
    async fn no_match_shows_notice(site: Site, #[case] path: &str) {
        let response = route(&site, path).await;
        check!(response.status() == Status::Ok);
        check!(response.body_text().contains("No results found for"));
    }

    /// Yields its postings only once another task has opened the gate.
    struct GatedShard {
        gate: Mutex<mpsc::Receiver<()>>,
        postings: Vec<Posting>,
    }

    impl ShardReader for GatedShard {
        fn lookup_word(&self, _term: &str) -> Option<&[Posting]> {
            let gate = self.gate.lock().ok()?;
            gate.recv_timeout(Duration::from_secs(2)).ok()?;
            Some(&self.postings)
        }

        fn lookup_doc_id(&self, _doc_id: DocId) -> Option<&str> {
            Some("gated.txt")
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn query_leaves_the_runtime_thread_free() {
        let dir = TempDir::new().unwrap();
        let (open, gate) = mpsc::channel();
        let shard: Box<dyn ShardReader> = Box::new(GatedShard {
            gate: Mutex::new(gate),
            postings: vec![Posting::new(1, 3)],
        });
        let engine = Arc::new(QueryEngine::from_readers(vec![shard]));
        let router = RequestRouter::new(FileReader::new(dir.path()).unwrap(), engine, "./test_tree/");

        // Only runs if the query yields the single runtime thread.
        let opener = tokio::spawn(async move { open.send(()).unwrap() });
        let response = router.route(&Request::new("/query?terms=anything")).await;
        opener.await.unwrap();

        check!(response.body_text().contains("1 result found for <b>anything</b>"));
        check!(response.body_text().contains("gated.txt</a> [3]"));
    }
}
