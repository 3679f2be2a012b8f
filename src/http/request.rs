//! Request-head parsing.
//!
//! Parsing is best effort: a malformed request line falls back to `/` and malformed
//! header lines are skipped. Nothing here returns an error.

use std::collections::HashMap;

const DEFAULT_PATH: &str = "/";

/// A parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    path: String,
    /// Lowercased, trimmed header names mapped to trimmed values.
    headers: HashMap<String, String>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(DEFAULT_PATH)
    }
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            headers: HashMap::new(),
        }
    }

    /// Parse a request head (request line plus header lines).
    pub fn parse(head: &str) -> Self {
        let mut lines = head.split(['\r', '\n']);

        let path = lines
            .next()
            .and_then(|request_line| request_line.split(' ').nth(1))
            .unwrap_or(DEFAULT_PATH);
        let mut request = Self::new(path);

        for line in lines {
            let Some(colon) = line.find(':') else {
                continue;
            };
            if colon == 0 || colon == line.len() - 1 {
                continue;
            }

            let (name, value) = line.split_at(colon);
            request.add_header(name, &value[1..]);
        }

        request
    }

    /// Insert a header, normalizing its name. A repeated name overwrites the earlier value.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.trim().to_lowercase(), value.trim().to_string());
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value of a header by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// Whether the client asked to close the connection after this request.
    pub fn wants_close(&self) -> bool {
        self.header("connection") == Some("close")
    }
}
