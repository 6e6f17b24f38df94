//! PGN (Portable Game Notation) export and import.
//!
//! Export writes the Seven Tag Roster (plus `SetUp`/`FEN` for games that did
//! not start from the initial position) and movetext wrapped at 80 columns.
//! Import reads tags and movetext, discarding comments, variations, NAGs,
//! move numbers and annotation glyphs, and replays the moves through
//! `Game::apply_san`.

use chrono::{NaiveDate, Utc};

use crate::config::RulesConfig;
use crate::engine::board::Position;
use crate::engine::game::Game;
use crate::engine::san::canonical_san;
use crate::engine::types::{ChessError, Color, GameStatus};

const LINE_WIDTH: usize = 80;
const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

// =========================================================================
// Tags
// =========================================================================

/// Game metadata written to the tag section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PgnTags {
    pub event: String,
    pub site: String,
    /// `None` is written as `????.??.??`.
    pub date: Option<NaiveDate>,
    pub round: String,
    pub white: String,
    pub black: String,
    /// Any further tags, in input order.
    pub extra: Vec<(String, String)>,
}

impl Default for PgnTags {
    fn default() -> Self {
        PgnTags {
            event: "Casual Game".into(),
            site: "?".into(),
            date: Some(Utc::now().date_naive()),
            round: "-".into(),
            white: "?".into(),
            black: "?".into(),
            extra: Vec::new(),
        }
    }
}

/// A PGN game split into its parts, before any move is checked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PgnGame {
    pub tags: Vec<(String, String)>,
    /// Canonical SAN tokens of the main line.
    pub moves: Vec<String>,
    /// Game termination marker from the movetext, if any.
    pub result: Option<String>,
}

impl PgnGame {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

// =========================================================================
// Export
// =========================================================================

impl Game {
    /// PGN result token for the current status.
    pub fn result_token(&self) -> &'static str {
        match self.status() {
            GameStatus::Checkmate => match self.side_to_move() {
                Color::White => "0-1",
                Color::Black => "1-0",
            },
            GameStatus::Stalemate | GameStatus::Draw(_) => "1/2-1/2",
            GameStatus::Active | GameStatus::Check => "*",
        }
    }

    /// Numbered move list on one line, e.g. `1. f3 e5 2. g4 Qh4#`.
    pub fn movetext(&self) -> String {
        movetext_units(self).join(" ")
    }

    /// Complete PGN with tag section, wrapped movetext and result.
    pub fn to_pgn(&self) -> String {
        let mut pgn = String::with_capacity(512);
        let tags = &self.tags;
        let result = self.result_token();
        let date = tags
            .date
            .map_or_else(|| "????.??.??".to_string(), |d| d.format("%Y.%m.%d").to_string());

        for (name, value) in [
            ("Event", tags.event.as_str()),
            ("Site", tags.site.as_str()),
            ("Date", date.as_str()),
            ("Round", tags.round.as_str()),
            ("White", tags.white.as_str()),
            ("Black", tags.black.as_str()),
            ("Result", result),
        ] {
            push_tag(&mut pgn, name, value);
        }
        if self.started_from_fen() {
            push_tag(&mut pgn, "SetUp", "1");
            push_tag(&mut pgn, "FEN", &self.starting_position().to_fen());
        }
        for (name, value) in &tags.extra {
            push_tag(&mut pgn, name, value);
        }
        pgn.push('\n');

        let mut units = movetext_units(self);
        units.push(result.to_string());
        let mut line_len = 0;
        for unit in units {
            if line_len > 0 && line_len + 1 + unit.len() > LINE_WIDTH {
                pgn.push('\n');
                line_len = 0;
            }
            if line_len > 0 {
                pgn.push(' ');
                line_len += 1;
            }
            line_len += unit.len();
            pgn.push_str(&unit);
        }
        pgn.push('\n');
        pgn
    }
}

fn push_tag(pgn: &mut String, name: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    pgn.push_str(&format!("[{name} \"{escaped}\"]\n"));
}

/// Moves with their numbers attached: `1. e4`, `e5`, `2. Nf3`. A game whose
/// first move is Black's opens with `N... move`.
fn movetext_units(game: &Game) -> Vec<String> {
    let start = game.starting_position();
    let mut number = start.fullmove_number();
    let mut color = start.side_to_move();
    let mut units = Vec::with_capacity(game.history().len());

    for (i, entry) in game.history().iter().enumerate() {
        let unit = match color {
            Color::White => format!("{number}. {}", entry.san),
            Color::Black if i == 0 => format!("{number}... {}", entry.san),
            Color::Black => entry.san.clone(),
        };
        units.push(unit);
        if color == Color::Black {
            number += 1;
        }
        color = !color;
    }
    units
}

// =========================================================================
// Import
// =========================================================================

fn malformed(ply: usize, reason: impl Into<String>) -> ChessError {
    ChessError::MalformedPgn {
        ply,
        reason: reason.into(),
    }
}

/// Split PGN text into tags, main-line SAN tokens and result.
pub fn parse_pgn(text: &str) -> Result<PgnGame, ChessError> {
    if text.trim().is_empty() {
        return Err(malformed(0, "empty PGN"));
    }

    let mut game = PgnGame::default();
    let mut movetext = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && movetext.trim().is_empty() {
            game.tags.push(parse_tag(trimmed)?);
        } else if !trimmed.starts_with('%') {
            movetext.push_str(line);
            movetext.push('\n');
        }
    }

    for token in strip_movetext(&movetext)?.split_whitespace() {
        if RESULTS.contains(&token) {
            game.result = Some(token.to_string());
            continue;
        }
        if token.starts_with('$') {
            continue;
        }
        let san = strip_move_number(token);
        if san.is_empty() {
            continue;
        }
        let san = canonical_san(san);
        if san.is_empty() {
            continue;
        }
        game.moves.push(san);
    }
    Ok(game)
}

/// `[Name "value"]` with `\"` and `\\` escapes.
fn parse_tag(line: &str) -> Result<(String, String), ChessError> {
    let bad = || malformed(0, format!("malformed tag '{line}'"));
    let inner = line
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(bad)?
        .trim();
    let (name, rest) = inner.split_once(char::is_whitespace).ok_or_else(bad)?;
    let quoted = rest
        .trim()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(bad)?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(bad());
    }

    let mut value = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            value.extend(chars.next());
        } else {
            value.push(c);
        }
    }
    Ok((name.to_string(), value))
}

/// Drop `{}` comments, `;` rest-of-line comments and (nested) `()`
/// variations.
fn strip_movetext(movetext: &str) -> Result<String, ChessError> {
    let mut out = String::with_capacity(movetext.len());
    let mut depth = 0usize;
    let mut chars = movetext.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if !chars.by_ref().any(|c| c == '}') {
                    return Err(malformed(0, "unterminated comment"));
                }
                out.push(' ');
            }
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                out.push(' ');
            }
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed(0, "unbalanced ')'"))?;
                out.push(' ');
            }
            _ if depth > 0 => {}
            _ => out.push(c),
        }
    }
    if depth > 0 {
        return Err(malformed(0, "unterminated variation"));
    }
    Ok(out)
}

/// `12.e4` → `e4`, `12...` → ``, `e4` → `e4`. Castling written with zeros
/// is left alone.
fn strip_move_number(token: &str) -> &str {
    if token.starts_with("0-0") {
        return token;
    }
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == token.len() {
        return token;
    }
    rest.trim_start_matches('.')
}

impl Game {
    /// Replay a PGN game from its `FEN` tag or the initial position under
    /// the default rules.
    pub fn from_pgn(text: &str) -> Result<Game, ChessError> {
        Self::from_pgn_with_config(text, RulesConfig::default())
    }

    /// Replay a PGN game with `config` in force from the first move, so a
    /// game that played on past a disabled draw rule still imports.
    pub fn from_pgn_with_config(text: &str, config: RulesConfig) -> Result<Game, ChessError> {
        let parsed = parse_pgn(text)?;

        let start = match parsed.tag("FEN") {
            Some(fen) => Position::from_fen(fen)
                .map_err(|e| malformed(0, format!("bad FEN tag: {e}")))?,
            None => Position::starting(),
        };
        let mut game = Game::from_position(start).with_config(config);

        for (i, san) in parsed.moves.iter().enumerate() {
            game.apply_san(san)
                .map_err(|e| malformed(i + 1, format!("{san}: {e}")))?;
        }

        let mut tags = PgnTags {
            date: None,
            ..PgnTags::default()
        };
        for (name, value) in &parsed.tags {
            match name.as_str() {
                "Event" => tags.event = value.clone(),
                "Site" => tags.site = value.clone(),
                "Date" => tags.date = NaiveDate::parse_from_str(value, "%Y.%m.%d").ok(),
                "Round" => tags.round = value.clone(),
                "White" => tags.white = value.clone(),
                "Black" => tags.black = value.clone(),
                "Result" | "SetUp" | "FEN" => {}
                _ => tags.extra.push((name.clone(), value.clone())),
            }
        }
        game.tags = tags;
        Ok(game)
    }
}

// =========================================================================
// Tests
// =========================================================================
