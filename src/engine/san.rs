//! Standard Algebraic Notation (SAN) generation and parsing.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`.

use crate::engine::board::Position;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Move, PieceKind, Square};

// =========================================================================
// SAN generation
// =========================================================================

/// SAN for a legal move in `pos`, including the `+` or `#` suffix.
pub fn move_to_san(pos: &Position, mv: Move) -> String {
    let legal = movegen::legal_moves(pos);
    let mut san = san_without_suffix(pos, mv, &legal);

    let mut after = pos.clone();
    after.make_move(mv);
    if after.is_in_check() {
        san.push(if movegen::has_legal_move(&after) { '+' } else { '#' });
    }
    san
}

/// SAN body without the check suffix. `legal` is the full legal move list of
/// `pos`, used for disambiguation.
pub(crate) fn san_without_suffix(pos: &Position, mv: Move, legal: &[Move]) -> String {
    if mv.is_castling() {
        return if mv.to.file() > mv.from.file() {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let Some(piece) = pos.piece_at(mv.from) else {
        return mv.to_string();
    };

    let mut san = String::with_capacity(8);
    if piece.kind == PieceKind::Pawn {
        if mv.is_capture() {
            san.push(mv.from.file_char());
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.letter());
        }
    } else {
        san.push(piece.kind.letter());
        san.push_str(&disambiguation(pos, mv, legal));
        if mv.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
    }
    san
}

/// File if that alone is unique, else rank if that alone is unique, else
/// both.
fn disambiguation(pos: &Position, mv: Move, legal: &[Move]) -> String {
    let piece = pos.piece_at(mv.from);
    let rivals: Vec<Square> = legal
        .iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && pos.piece_at(m.from) == piece)
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    let same_file = rivals.iter().any(|r| r.file() == mv.from.file());
    let same_rank = rivals.iter().any(|r| r.rank() == mv.from.rank());
    match (same_file, same_rank) {
        (false, _) => mv.from.file_char().to_string(),
        (true, false) => mv.from.rank_char().to_string(),
        (true, true) => mv.from.to_algebraic(),
    }
}

// =========================================================================
// SAN parsing
// =========================================================================

/// Strip annotations from a SAN token: check/mate marks, `!`/`?` glyphs,
/// and zero-style castling (`0-0` becomes `O-O`).
pub fn canonical_san(token: &str) -> String {
    let core = token.trim().trim_end_matches(['+', '#', '!', '?']);
    match core {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}

/// Resolve a SAN string to the unique legal move it names in `pos`.
///
/// Tolerates `+`, `#`, `!`, `?` suffixes, `0-0` castling and promotions
/// written without `=`.
pub fn parse_san(pos: &Position, san: &str) -> Result<Move, ChessError> {
    let invalid = |reason: &str| ChessError::InvalidSan {
        san: san.to_string(),
        reason: reason.to_string(),
    };

    let body = canonical_san(san);
    let legal = movegen::legal_moves(pos);

    if body == "O-O" || body == "O-O-O" {
        let kingside = body == "O-O";
        return legal
            .iter()
            .copied()
            .find(|m| m.is_castling() && (m.to.file() > m.from.file()) == kingside)
            .ok_or_else(|| invalid("castling is not legal here"));
    }

    let mut chars: Vec<char> = body.chars().collect();
    if chars.is_empty() {
        return Err(invalid("empty move"));
    }

    // Promotion suffix, with or without '='.
    let mut promotion = None;
    if let Some(&last) = chars.last()
        && last.is_ascii_alphabetic()
        && chars.len() >= 3
    {
        let kind = PieceKind::from_letter(last)
            .filter(|k| PieceKind::PROMOTIONS.contains(k))
            .ok_or_else(|| invalid("invalid promotion piece"))?;
        promotion = Some(kind);
        chars.pop();
        if chars.last() == Some(&'=') {
            chars.pop();
        }
    }

    let kind = match chars.first() {
        Some(&c) if c.is_ascii_uppercase() => {
            chars.remove(0);
            PieceKind::from_letter(c).ok_or_else(|| invalid("unknown piece letter"))?
        }
        _ => PieceKind::Pawn,
    };

    chars.retain(|&c| c != 'x' && c != ':');
    if chars.len() < 2 {
        return Err(invalid("missing destination square"));
    }
    let dest_str: String = chars[chars.len() - 2..].iter().collect();
    let dest = Square::from_algebraic(&dest_str).ok_or_else(|| invalid("bad destination square"))?;

    let hint = &chars[..chars.len() - 2];
    if hint.len() > 2 {
        return Err(invalid("too many disambiguation characters"));
    }
    let hint_file = hint
        .iter()
        .find(|c| ('a'..='h').contains(*c))
        .map(|&c| c as u8 - b'a');
    let hint_rank = hint
        .iter()
        .find(|c| ('1'..='8').contains(*c))
        .map(|&c| c as u8 - b'1');
    if hint.len() != hint_file.is_some() as usize + hint_rank.is_some() as usize {
        return Err(invalid("bad disambiguation"));
    }

    let us = pos.side_to_move();
    let candidates: Vec<Move> = legal
        .into_iter()
        .filter(|m| {
            m.to == dest
                && !m.is_castling()
                && pos
                    .piece_at(m.from)
                    .is_some_and(|p| p.color == us && p.kind == kind)
                && hint_file.is_none_or(|f| m.from.file() == f)
                && hint_rank.is_none_or(|r| m.from.rank() == r)
                && m.promotion == promotion
        })
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(invalid("no legal move matches")),
        _ => Err(invalid("ambiguous move")),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn find(p: &Position, from: &str, to: &str) -> Move {
        movegen::legal_moves(p)
            .into_iter()
            .find(|m| m.from == sq(from) && m.to == sq(to) && m.promotion.is_none_or(|k| k == PieceKind::Queen))
            .unwrap()
    }

    fn san(fen: &str, from: &str, to: &str) -> String {
        let p = pos(fen);
        move_to_san(&p, find(&p, from, to))
    }

    // ===================================================================
    // Generation
    // ===================================================================

    #[test]
    fn pawn_and_piece_moves() {
        let start = crate::engine::board::STARTING_FEN;
        assert_eq!(san(start, "e2", "e4"), "e4");
        assert_eq!(san(start, "g1", "f3"), "Nf3");
    }

    #[test]
    fn captures() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(san(fen, "e4", "d5"), "exd5");
        let fen = "4k3/8/8/3p4/8/8/8/3RK3 w - - 0 1";
        assert_eq!(san(fen, "d1", "d5"), "Rxd5");
    }

    #[test]
    fn en_passant_is_a_pawn_capture() {
        assert_eq!(san("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5", "d6"), "exd6");
    }

    #[test]
    fn castling() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(san(fen, "e1", "g1"), "O-O");
        assert_eq!(san(fen, "e1", "c1"), "O-O-O");
    }

    #[test]
    fn promotion_with_check() {
        assert_eq!(san("4k3/P7/8/8/8/8/8/4K3 w - - 0 1", "a7", "a8"), "a8=Q+");
    }

    #[test]
    fn disambiguation_by_file_rank_and_both() {
        // Knights on b1 and f1 both reach d2.
        assert_eq!(san("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1", "b1", "d2"), "Nbd2");
        // Rooks on a1 and a5 both reach a3.
        assert_eq!(san("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1", "a5", "a3"), "R5a3");
        // Queens on e4, h4 and h1 all reach e1; h4 shares a rank and a file.
        assert_eq!(san("1k6/8/8/8/4Q2Q/8/8/K6Q w - - 0 1", "h4", "e1"), "Qh4e1");
    }

    #[test]
    fn checkmate_suffix() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2";
        assert_eq!(san(fen, "d8", "h4"), "Qh4#");
    }

    // ===================================================================
    // Parsing
    // ===================================================================

    #[test]
    fn parse_basic() {
        let p = Position::starting();
        assert_eq!(parse_san(&p, "e4").unwrap(), find(&p, "e2", "e4"));
        assert_eq!(parse_san(&p, "Nf3").unwrap(), find(&p, "g1", "f3"));
        assert_eq!(parse_san(&p, "Nf3!?").unwrap(), find(&p, "g1", "f3"));
    }

    #[test]
    fn parse_castling_variants() {
        let p = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        for text in ["O-O", "0-0", "O-O+"] {
            assert_eq!(parse_san(&p, text).unwrap().to, sq("g1"));
        }
        assert_eq!(parse_san(&p, "0-0-0").unwrap().to, sq("c1"));
    }

    #[test]
    fn parse_promotion_forms() {
        let p = pos("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(parse_san(&p, "a8=Q+").unwrap().promotion, Some(PieceKind::Queen));
        assert_eq!(parse_san(&p, "a8N").unwrap().promotion, Some(PieceKind::Knight));
        assert!(parse_san(&p, "a8").is_err());
        assert!(parse_san(&p, "a8=K").is_err());
    }

    #[test]
    fn parse_disambiguated() {
        let p = pos("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        assert_eq!(parse_san(&p, "Nbd2").unwrap().from, sq("b1"));
        assert_eq!(parse_san(&p, "Nfd2").unwrap().from, sq("f1"));
        assert!(matches!(
            parse_san(&p, "Nd2"),
            Err(ChessError::InvalidSan { reason, .. }) if reason == "ambiguous move"
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        let p = Position::starting();
        for text in ["", "e5", "Ke2", "Zf3", "x", "Nf9", "O-O"] {
            assert!(
                matches!(parse_san(&p, text), Err(ChessError::InvalidSan { .. })),
                "'{text}' should be rejected"
            );
        }
    }

    #[test]
    fn canonical_tokens() {
        assert_eq!(canonical_san("Nf3+"), "Nf3");
        assert_eq!(canonical_san("Qh4#"), "Qh4");
        assert_eq!(canonical_san("e4!?"), "e4");
        assert_eq!(canonical_san("0-0"), "O-O");
        assert_eq!(canonical_san("0-0-0+"), "O-O-O");
    }

    #[test]
    fn generated_san_parses_back() {
        let p = pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        for mv in movegen::legal_moves(&p) {
            let text = move_to_san(&p, mv);
            assert_eq!(parse_san(&p, &text).unwrap(), mv, "{text}");
        }
    }
}
