//! Readers for opening tables.
//!
//! Two layouts are understood: the tab-separated `eco` / `name` / `pgn`
//! files published with public opening datasets, and a JSON array of
//! [`OpeningRecord`] objects.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::pgn::parse_pgn;
use crate::engine::types::ChessError;

use super::OpeningTrie;

/// One row of an opening table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRecord {
    /// SAN tokens from the initial position.
    pub moves: Vec<String>,
    pub opening_name: String,
    #[serde(default)]
    pub variation_name: String,
}

impl OpeningRecord {
    pub fn new<S: AsRef<str>>(moves: &[S], opening_name: &str, variation_name: &str) -> Self {
        OpeningRecord {
            moves: moves.iter().map(|m| m.as_ref().to_string()).collect(),
            opening_name: opening_name.to_string(),
            variation_name: variation_name.to_string(),
        }
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> ChessError {
    ChessError::MalformedOpeningData {
        line,
        reason: reason.into(),
    }
}

fn csv_error(e: csv::Error) -> ChessError {
    let line = e.position().map_or(0, |p| p.line() as usize);
    malformed(line, e.to_string())
}

fn table_reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

/// Parse a tab-separated table with a header naming at least the `name`
/// and `pgn` columns. Names of the form `Opening: Variation` are split on
/// the first `": "`. Line numbers in errors are 1-based.
pub fn parse_opening_table(text: &str) -> Result<Vec<OpeningRecord>, ChessError> {
    let mut reader = table_reader(text);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let header_line = headers.position().map_or(1, |p| p.line() as usize);
    if headers.is_empty() {
        return Err(malformed(header_line, "empty table"));
    }
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| malformed(header_line, format!("missing '{name}' column")))
    };
    let name_col = column("name")?;
    let pgn_col = column("pgn")?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let line_no = row.position().map_or(0, |p| p.line() as usize);
        let field = |index: usize, label: &str| {
            row.get(index)
                .filter(|f| !f.is_empty())
                .ok_or_else(|| malformed(line_no, format!("missing {label}")))
        };
        let name = field(name_col, "name")?;
        let movetext = field(pgn_col, "pgn")?;

        let moves = parse_pgn(movetext)
            .map_err(|e| malformed(line_no, e.to_string()))?
            .moves;
        if moves.is_empty() {
            return Err(malformed(line_no, "no moves"));
        }
        let (opening_name, variation_name) = name.split_once(": ").unwrap_or((name, ""));
        records.push(OpeningRecord {
            moves,
            opening_name: opening_name.trim().to_string(),
            variation_name: variation_name.trim().to_string(),
        });
    }
    Ok(records)
}

/// Parse a JSON array of records.
pub fn parse_opening_json(text: &str) -> Result<Vec<OpeningRecord>, ChessError> {
    serde_json::from_str(text).map_err(|e| malformed(e.line(), e.to_string()))
}

/// Read an opening file and build its trie. `.json` files are read as JSON,
/// anything else as a tab-separated table.
pub fn load_opening_file(path: impl AsRef<Path>) -> Result<OpeningTrie, ChessError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| malformed(0, format!("cannot read {}: {e}", path.display())))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let records = if is_json {
        parse_opening_json(&text)?
    } else {
        parse_opening_table(&text)?
    };
    debug!(path = %path.display(), records = records.len(), "opening table read");
    OpeningTrie::from_records(records)
}
