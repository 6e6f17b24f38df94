//! FEN parsing and generation.
//!
//! Parsing goes field by field and reports the first offending field in
//! `ChessError::MalformedFen`. Beyond syntax it rejects positions the rules
//! could never reach: missing or extra kings, pawns on the back ranks, the
//! side not to move standing in check, and an en-passant target on the wrong
//! rank or without the pawn that created it.

use crate::engine::board::Position;
use crate::engine::types::{CastlingRights, ChessError, Color, FenField, Piece, PieceKind, Square};

impl Position {
    /// Parse a six-field FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::fen(
                FenField::FieldCount,
                format!("expected 6 fields, got {}", fields.len()),
            ));
        }

        let mut pos = Position::empty();
        parse_placement(&mut pos, fields[0])?;

        pos.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::fen(
                    FenField::SideToMove,
                    format!("expected 'w' or 'b', got '{other}'"),
                ));
            }
        };

        pos.castling_rights = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::fen(FenField::Castling, format!("invalid castling string '{}'", fields[2]))
        })?;

        pos.en_passant = parse_en_passant(&pos, fields[3])?;

        pos.halfmove_clock = fields[4].parse::<u32>().map_err(|_| {
            ChessError::fen(
                FenField::HalfmoveClock,
                format!("expected a non-negative integer, got '{}'", fields[4]),
            )
        })?;

        pos.fullmove_number = match fields[5].parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => {
                return Err(ChessError::fen(
                    FenField::FullmoveNumber,
                    format!("expected an integer >= 1, got '{}'", fields[5]),
                ));
            }
        };

        let idle = !pos.side_to_move;
        if pos.is_square_attacked(pos.king_square(idle), pos.side_to_move) {
            return Err(ChessError::fen(
                FenField::Placement,
                format!("{idle} is in check but it is not {idle}'s turn"),
            ));
        }

        pos.zobrist_hash = pos.compute_hash();
        Ok(pos)
    }

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8).rev() {
            let mut empty = 0u8;
            for file in 0..8 {
                match self.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = self
            .en_passant
            .map_or_else(|| "-".to_string(), |sq| sq.to_algebraic());
        fen.push_str(&format!(
            " {side} {} {ep} {} {}",
            self.castling_rights.to_fen(),
            self.halfmove_clock,
            self.fullmove_number
        ));
        fen
    }
}

fn placement_error(reason: impl Into<String>) -> ChessError {
    ChessError::fen(FenField::Placement, reason)
}

fn parse_placement(pos: &mut Position, field: &str) -> Result<(), ChessError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(placement_error(format!("expected 8 ranks, got {}", ranks.len())));
    }

    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_idx as u8;
        let mut file: u8 = 0;
        for ch in rank_str.chars() {
            if file > 7 {
                return Err(placement_error(format!("too many squares in rank {}", rank + 1)));
            }
            if let Some(digit) = ch.to_digit(10) {
                if !(1..=8).contains(&digit) {
                    return Err(placement_error(format!(
                        "invalid empty count '{ch}' in rank {}",
                        rank + 1
                    )));
                }
                file += digit as u8;
            } else if let Some(piece) = Piece::from_char(ch) {
                if piece.kind == PieceKind::Pawn && (rank == 0 || rank == 7) {
                    return Err(placement_error(format!("pawn on rank {}", rank + 1)));
                }
                pos.put_piece(Square::from_file_rank(file, rank), piece);
                file += 1;
            } else {
                return Err(placement_error(format!("invalid character '{ch}'")));
            }
        }
        if file != 8 {
            return Err(placement_error(format!(
                "rank {} has {file} squares instead of 8",
                rank + 1
            )));
        }
    }

    for color in [Color::White, Color::Black] {
        let kings = pos
            .board
            .squares_of(Piece::new(color, PieceKind::King))
            .len();
        if kings != 1 {
            return Err(placement_error(format!("{color} has {kings} kings (expected 1)")));
        }
    }
    Ok(())
}

fn parse_en_passant(pos: &Position, field: &str) -> Result<Option<Square>, ChessError> {
    if field == "-" {
        return Ok(None);
    }
    let err = |reason: String| ChessError::fen(FenField::EnPassant, reason);
    let sq = Square::from_algebraic(field).ok_or_else(|| err(format!("invalid square '{field}'")))?;

    // White to move means Black just double-pushed: the target is on rank 6.
    let mover = pos.side_to_move;
    let expected_rank = match mover {
        Color::White => 5,
        Color::Black => 2,
    };
    if sq.rank() != expected_rank {
        return Err(err(format!(
            "target {field} is not on rank {} with {mover} to move",
            expected_rank + 1
        )));
    }
    let pushed = Square::from_file_rank(sq.file(), (sq.rank() as i8 - mover.forward()) as u8);
    if pos.piece_at(pushed) != Some(Piece::new(!mover, PieceKind::Pawn)) {
        return Err(err(format!("no pawn on {pushed} to match target {field}")));
    }
    Ok(Some(sq))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
