//! Opening classification.
//!
//! An [`OpeningTrie`] maps sequences of canonical SAN tokens to named
//! openings. It is built once from a table of records (see [`loader`]) and
//! is read-only afterwards; [`install`] publishes one trie for the whole
//! process.

pub mod loader;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::san::canonical_san;
use crate::engine::types::ChessError;

pub use loader::{OpeningRecord, load_opening_file, parse_opening_json, parse_opening_table};

// =========================================================================
// Labels
// =========================================================================

/// Name attached to a node of the trie.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opening {
    pub opening_name: String,
    #[serde(default)]
    pub variation_name: String,
}

impl Opening {
    pub fn new(opening_name: impl Into<String>, variation_name: impl Into<String>) -> Self {
        Opening {
            opening_name: opening_name.into(),
            variation_name: variation_name.into(),
        }
    }
}

impl fmt::Display for Opening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variation_name.is_empty() {
            f.write_str(&self.opening_name)
        } else {
            write!(f, "{}: {}", self.opening_name, self.variation_name)
        }
    }
}

/// Where a move sequence stands relative to the book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpeningMatch<'a> {
    /// The sequence ends exactly on a labelled node.
    Named(&'a Opening),
    /// Inside the book, between labels; lists the openings reachable from here.
    BookMove { candidates: Vec<&'a str> },
    /// The sequence left the book.
    OutOfBook,
}

/// A book reply from some node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Continuation<'a> {
    pub san: &'a str,
    /// Label of the reply's node, if it has one.
    pub opening: Option<&'a Opening>,
    /// Opening names reachable through the reply.
    pub leads_to: Vec<&'a str>,
}

// =========================================================================
// Trie
// =========================================================================

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<String, Node>,
    opening: Option<Opening>,
    passing: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct OpeningTrie {
    root: Node,
    len: usize,
}

fn canonical_tokens<S: AsRef<str>>(moves: &[S]) -> Vec<String> {
    moves
        .iter()
        .map(|m| canonical_san(m.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}

impl OpeningTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trie from records, failing on the first conflicting label.
    pub fn from_records(
        records: impl IntoIterator<Item = OpeningRecord>,
    ) -> Result<Self, ChessError> {
        let mut trie = OpeningTrie::new();
        for record in records {
            trie.insert(&record.moves, &record.opening_name, &record.variation_name)?;
        }
        Ok(trie)
    }

    /// Number of labelled nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Label the node reached by `moves`.
    ///
    /// Registering the same label twice is a no-op. A different label at an
    /// already labelled node leaves the trie untouched and returns
    /// [`ChessError::OpeningDataConflict`].
    pub fn insert<S: AsRef<str>>(
        &mut self,
        moves: &[S],
        opening_name: &str,
        variation_name: &str,
    ) -> Result<(), ChessError> {
        let tokens = canonical_tokens(moves);
        if tokens.is_empty() {
            return Err(ChessError::MalformedOpeningData {
                line: 0,
                reason: format!("'{opening_name}' has no moves"),
            });
        }
        let opening = Opening::new(opening_name, variation_name);

        if let Some(existing) = self.node(&tokens).and_then(|n| n.opening.as_ref()) {
            if *existing == opening {
                return Ok(());
            }
            let path = tokens.join(" ");
            warn!(%path, existing = %existing, rejected = %opening, "conflicting opening label");
            return Err(ChessError::OpeningDataConflict {
                path,
                existing: existing.to_string(),
                rejected: opening.to_string(),
            });
        }

        let mut node = &mut self.root;
        for token in tokens {
            node = node.children.entry(token).or_default();
            node.passing.insert(opening.opening_name.clone());
        }
        node.opening = Some(opening);
        self.len += 1;
        Ok(())
    }

    /// Label of the deepest labelled node along the longest matching prefix
    /// of `moves`.
    pub fn lookup<S: AsRef<str>>(&self, moves: &[S]) -> Option<&Opening> {
        let mut node = &self.root;
        let mut best = None;
        for token in canonical_tokens(moves) {
            match node.children.get(&token) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(opening) = &node.opening {
                best = Some(opening);
            }
        }
        best
    }

    pub fn classify<S: AsRef<str>>(&self, moves: &[S]) -> OpeningMatch<'_> {
        match self.node(&canonical_tokens(moves)) {
            None => OpeningMatch::OutOfBook,
            Some(node) => match &node.opening {
                Some(opening) => OpeningMatch::Named(opening),
                None => OpeningMatch::BookMove {
                    candidates: node.passing_names(),
                },
            },
        }
    }

    /// Book replies after `moves`, in SAN order. Empty when out of book.
    pub fn continuations<S: AsRef<str>>(&self, moves: &[S]) -> Vec<Continuation<'_>> {
        let Some(node) = self.node(&canonical_tokens(moves)) else {
            return Vec::new();
        };
        node.children
            .iter()
            .map(|(san, child)| Continuation {
                san: san.as_str(),
                opening: child.opening.as_ref(),
                leads_to: child.passing_names(),
            })
            .collect()
    }

    fn node(&self, tokens: &[String]) -> Option<&Node> {
        tokens
            .iter()
            .try_fold(&self.root, |node, token| node.children.get(token))
    }
}

impl Node {
    fn passing_names(&self) -> Vec<&str> {
        if self.passing.is_empty() {
            // Root: everything in the book passes through it.
            let mut names: BTreeSet<&str> = BTreeSet::new();
            for child in self.children.values() {
                names.extend(child.passing.iter().map(String::as_str));
            }
            return names.into_iter().collect();
        }
        self.passing.iter().map(String::as_str).collect()
    }
}

// =========================================================================
// Registry
// =========================================================================

static REGISTRY: OnceLock<OpeningTrie> = OnceLock::new();

/// Publish `trie` as the process-wide opening book. Only the first call
/// succeeds.
pub fn install(trie: OpeningTrie) -> Result<&'static OpeningTrie, ChessError> {
    let openings = trie.len();
    REGISTRY
        .set(trie)
        .map_err(|_| ChessError::RegistryInitialised)?;
    info!(openings, "opening registry installed");
    REGISTRY.get().ok_or(ChessError::RegistryInitialised)
}

/// The installed opening book, if any.
pub fn global() -> Option<&'static OpeningTrie> {
    REGISTRY.get()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OpeningTrie {
        let mut trie = OpeningTrie::new();
        trie.insert(&["e4", "e5", "Nf3", "Nc6", "Bb5"], "Ruy Lopez", "")
            .unwrap();
        trie.insert(&["e4", "e5", "Nf3", "Nc6", "Bc4"], "Italian Game", "")
            .unwrap();
        trie.insert(
            &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"],
            "Italian Game",
            "Giuoco Piano",
        )
        .unwrap();
        trie.insert(&["e4", "c5"], "Sicilian Defense", "").unwrap();
        trie
    }

    #[test]
    fn exact_lookup() {
        let trie = book();
        assert_eq!(trie.len(), 4);
        let opening = trie.lookup(&["e4", "c5"]).unwrap();
        assert_eq!(opening.opening_name, "Sicilian Defense");
        assert_eq!(opening.to_string(), "Sicilian Defense");
    }

    #[test]
    fn longest_prefix_wins() {
        let trie = book();
        let played = ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3", "Nf6"];
        let opening = trie.lookup(&played).unwrap();
        assert_eq!(opening.to_string(), "Italian Game: Giuoco Piano");

        let partial = ["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6"];
        assert_eq!(trie.lookup(&partial).unwrap().to_string(), "Italian Game");
    }

    #[test]
    fn no_label_reached() {
        let trie = book();
        assert_eq!(trie.lookup(&["e4", "e5"]), None);
        assert_eq!(trie.lookup(&["d4"]), None);
        assert_eq!(trie.lookup::<&str>(&[]), None);
    }

    #[test]
    fn annotations_are_ignored() {
        let trie = book();
        assert!(trie.lookup(&["e4!", "c5?!"]).is_some());
    }

    #[test]
    fn conflicting_label_is_rejected() {
        let mut trie = book();
        let err = trie
            .insert(&["e4", "c5"], "Sicilian", "Wrong")
            .unwrap_err();
        assert_eq!(
            err,
            ChessError::OpeningDataConflict {
                path: "e4 c5".into(),
                existing: "Sicilian Defense".into(),
                rejected: "Sicilian: Wrong".into(),
            }
        );
        assert_eq!(trie.len(), 4);
        assert_eq!(
            trie.lookup(&["e4", "c5"]).unwrap().opening_name,
            "Sicilian Defense"
        );
        // The rejected name never entered the path.
        assert_eq!(
            trie.classify(&["e4"]),
            OpeningMatch::BookMove {
                candidates: vec!["Italian Game", "Ruy Lopez", "Sicilian Defense"]
            }
        );
    }

    #[test]
    fn identical_registration_is_noop() {
        let mut trie = book();
        trie.insert(&["e4", "c5"], "Sicilian Defense", "").unwrap();
        assert_eq!(trie.len(), 4);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let mut trie = OpeningTrie::new();
        assert!(matches!(
            trie.insert::<&str>(&[], "Nothing", ""),
            Err(ChessError::MalformedOpeningData { .. })
        ));
        assert!(trie.is_empty());
    }

    #[test]
    fn from_records_fails_on_conflict() {
        let records = vec![
            OpeningRecord::new(&["d4", "d5", "c4"], "Queen's Gambit", ""),
            OpeningRecord::new(&["d4", "d5", "c4"], "Queen's Gambit", "Accepted"),
        ];
        assert!(matches!(
            OpeningTrie::from_records(records),
            Err(ChessError::OpeningDataConflict { .. })
        ));
    }

    #[test]
    fn classify() {
        let trie = book();
        assert_eq!(
            trie.classify(&["e4", "e5", "Nf3", "Nc6", "Bb5"]),
            OpeningMatch::Named(&Opening::new("Ruy Lopez", ""))
        );
        assert_eq!(
            trie.classify(&["e4", "e5", "Nf3"]),
            OpeningMatch::BookMove {
                candidates: vec!["Italian Game", "Ruy Lopez"]
            }
        );
        assert_eq!(trie.classify(&["e4", "e6"]), OpeningMatch::OutOfBook);
    }

    #[test]
    fn continuations() {
        let trie = book();
        let replies = trie.continuations(&["e4", "e5", "Nf3", "Nc6"]);
        let sans: Vec<&str> = replies.iter().map(|c| c.san).collect();
        assert_eq!(sans, vec!["Bb5", "Bc4"]);
        assert_eq!(replies[1].opening.unwrap().opening_name, "Italian Game");
        assert_eq!(replies[1].leads_to, vec!["Italian Game"]);

        let first: Vec<&str> = trie.continuations::<&str>(&[]).iter().map(|c| c.san).collect();
        assert_eq!(first, vec!["e4"]);
        assert!(trie.continuations(&["h4"]).is_empty());
    }
}
