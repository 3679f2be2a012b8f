//! Interactive query shell over the same engine the server uses.

use crate::query::QueryEngine;
use std::io::{self, BufRead, Write};

const PROMPT: &str = "Enter query:";

/// Lowercase a line and split it into query terms.
pub fn parse_query(line: &str) -> Vec<String> {
    line.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Prompt, read a query, print its results; repeat until `input` ends.
///
/// Blank lines are skipped rather than run as empty queries.
pub fn run<R: BufRead, W: Write>(engine: &QueryEngine, input: R, mut output: W) -> io::Result<()> {
    let mut lines = input.lines();
    loop {
        writeln!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let terms = parse_query(&line?);
        if terms.is_empty() {
            continue;
        }

        let results = engine.process_query(&terms);
        if results.is_empty() {
            writeln!(output, " [no results]")?;
        }
        for result in &results {
            writeln!(output, " {} ({})", result.document_name, result.rank)?;
        }
    }
    Ok(())
}
