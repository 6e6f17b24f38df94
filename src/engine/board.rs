//! Mailbox board and the full chess position.
//!
//! `Board` is a 64-slot arena of `Option<Piece>` indexed by square (LERF:
//! a1 = 0, b1 = 1, … h8 = 63). `Position` wraps it with the auxiliary state
//! the rules need: side to move, castling rights, en-passant target, move
//! counters and an incremental Zobrist hash.
//!
//! Everything here is read-only from outside the crate; positions change only
//! through `Game::apply_move` and friends.

use std::fmt;

use crate::engine::attacks;
use crate::engine::types::{CastlingRights, Color, Move, Piece, PieceKind, Square, SquareSet};
use crate::engine::zobrist;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Piece placement: one optional piece per square.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Board {
    pub fn empty() -> Self {
        Board {
            squares: [None; 64],
        }
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// All occupied squares.
    pub fn occupancy(&self) -> SquareSet {
        self.pieces().map(|(sq, _)| sq).collect()
    }

    /// Squares holding a piece of `color`.
    pub fn occupancy_of(&self, color: Color) -> SquareSet {
        self.pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(sq, _)| sq)
            .collect()
    }

    /// Squares holding exactly `piece`.
    pub fn squares_of(&self, piece: Piece) -> SquareSet {
        self.pieces()
            .filter(|&(_, p)| p == piece)
            .map(|(sq, _)| sq)
            .collect()
    }

    /// Occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Replace the occupant of `sq`, returning the previous one.
    #[inline]
    pub(crate) fn replace(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.squares[sq.index()], piece)
    }
}

// ---------------------------------------------------------------------------
// UndoInfo
// ---------------------------------------------------------------------------

/// Snapshot of the auxiliary state taken before a move, enough to restore
/// the exact prior position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoInfo {
    pub captured: Option<Piece>,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub zobrist_hash: u64,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete chess position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub(crate) board: Board,
    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: CastlingRights,
    /// The square *behind* a pawn that just advanced two squares.
    pub(crate) en_passant: Option<Square>,
    /// Plies since the last pawn move or capture.
    pub(crate) halfmove_clock: u32,
    /// Starts at 1, incremented after Black moves.
    pub(crate) fullmove_number: u32,
    pub(crate) zobrist_hash: u64,
}

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// An empty board, White to move, no rights. Only useful as a builder
    /// start; it has no kings.
    pub(crate) fn empty() -> Self {
        Position {
            board: Board::empty(),
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            zobrist_hash: 0,
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is always valid")
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.piece_at(sq)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    pub fn zobrist_hash(&self) -> u64 {
        self.zobrist_hash
    }

    /// Square of `color`'s king.
    ///
    /// # Panics
    /// If `color` has no king, which no reachable position allows.
    pub fn king_square(&self, color: Color) -> Square {
        self.board
            .squares_of(Piece::new(color, PieceKind::King))
            .first()
            .expect("king must exist")
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of colour `by`?
    ///
    /// Works backwards from the target: a piece of kind K attacks `sq` iff a
    /// K of the other colour placed on `sq` would reach it.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let occ = self.board.occupancy();
        PieceKind::ALL.iter().any(|&kind| {
            let attacker = Piece::new(by, kind);
            attacks::attack_pattern(Piece::new(!by, kind), sq, occ)
                .iter()
                .any(|from| self.board.piece_at(from) == Some(attacker))
        })
    }

    /// Is the side to move's king attacked?
    #[inline]
    pub fn is_in_check(&self) -> bool {
        let king = self.king_square(self.side_to_move);
        self.is_square_attacked(king, !self.side_to_move)
    }

    /// Neither side can ever deliver mate: bare kings, or a single minor
    /// piece, or only bishops that all stand on one square colour.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = Vec::new();
        for (sq, piece) in self.board.pieces() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((sq, piece.kind)),
                _ => return false,
            }
        }
        if minors.len() <= 1 {
            return true;
        }
        let shade = |sq: Square| (sq.file() + sq.rank()) % 2;
        let (first_sq, _) = minors[0];
        minors
            .iter()
            .all(|&(sq, kind)| kind == PieceKind::Bishop && shade(sq) == shade(first_sq))
    }

    // -----------------------------------------------------------------------
    // Hashing
    // -----------------------------------------------------------------------

    /// Compute the Zobrist hash from scratch.
    pub fn compute_hash(&self) -> u64 {
        let zk = zobrist::keys();
        let mut hash = self
            .board
            .pieces()
            .fold(0u64, |h, (sq, piece)| h ^ zk.piece_key(piece, sq));
        if self.side_to_move == Color::Black {
            hash ^= zk.side_to_move;
        }
        hash ^= zk.castling_key(self.castling_rights.0);
        if let Some(ep) = self.en_passant {
            hash ^= zk.ep_key(ep.file());
        }
        hash
    }

    // -----------------------------------------------------------------------
    // Mutation (crate-private)
    // -----------------------------------------------------------------------

    /// Place a piece on an empty square, updating the hash.
    #[inline]
    pub(crate) fn put_piece(&mut self, sq: Square, piece: Piece) {
        let previous = self.board.replace(sq, Some(piece));
        debug_assert!(previous.is_none(), "put_piece onto occupied {sq}");
        self.zobrist_hash ^= zobrist::keys().piece_key(piece, sq);
    }

    /// Clear a square, updating the hash. Returns what was there.
    #[inline]
    pub(crate) fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let removed = self.board.replace(sq, None);
        if let Some(piece) = removed {
            self.zobrist_hash ^= zobrist::keys().piece_key(piece, sq);
        }
        removed
    }

    /// Apply a move generated for this position. Returns the snapshot needed
    /// by [`Position::unmake_move`].
    ///
    /// Legality is the caller's concern: the king may be left in check.
    pub(crate) fn make_move(&mut self, mv: Move) -> UndoInfo {
        let zk = zobrist::keys();
        let us = self.side_to_move;

        let mut undo = UndoInfo {
            captured: None,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            zobrist_hash: self.zobrist_hash,
        };

        if let Some(ep) = self.en_passant.take() {
            self.zobrist_hash ^= zk.ep_key(ep.file());
        }
        self.zobrist_hash ^= zk.castling_key(self.castling_rights.0);

        let moving = self
            .remove_piece(mv.from)
            .expect("make_move: source square is empty");

        // En passant removes the pawn beside the mover, not the one on `to`.
        let captured = if mv.is_en_passant() {
            self.remove_piece(en_passant_victim(mv))
        } else {
            self.remove_piece(mv.to)
        };

        let landing = match mv.promotion {
            Some(kind) => Piece::new(us, kind),
            None => moving,
        };
        self.put_piece(mv.to, landing);

        if mv.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(mv.to);
            if let Some(rook) = self.remove_piece(rook_from) {
                self.put_piece(rook_to, rook);
            }
        }

        // Moving from, or capturing on, a king or rook home square.
        self.castling_rights.0 &= CASTLING_MASK[mv.from.index()] & CASTLING_MASK[mv.to.index()];
        self.zobrist_hash ^= zk.castling_key(self.castling_rights.0);

        if mv.is_double_push() {
            let ep = Square::from_file_rank(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2);
            self.en_passant = Some(ep);
            self.zobrist_hash ^= zk.ep_key(ep.file());
        }

        if moving.kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = !us;
        self.zobrist_hash ^= zk.side_to_move;

        undo.captured = captured;
        undo
    }

    /// Reverse a move previously applied with [`Position::make_move`].
    pub(crate) fn unmake_move(&mut self, mv: Move, undo: &UndoInfo) {
        let us = !self.side_to_move;
        self.side_to_move = us;

        let landed = self
            .remove_piece(mv.to)
            .expect("unmake_move: destination square is empty");
        let original = if mv.promotion.is_some() {
            Piece::new(us, PieceKind::Pawn)
        } else {
            landed
        };
        self.put_piece(mv.from, original);

        if let Some(captured) = undo.captured {
            let sq = if mv.is_en_passant() {
                en_passant_victim(mv)
            } else {
                mv.to
            };
            self.put_piece(sq, captured);
        }

        if mv.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(mv.to);
            if let Some(rook) = self.remove_piece(rook_to) {
                self.put_piece(rook_from, rook);
            }
        }

        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.zobrist_hash = undo.zobrist_hash;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }
    }

    // -----------------------------------------------------------------------
    // Text diagram
    // -----------------------------------------------------------------------

    /// FEN letters on an 8x8 grid, rank 8 on top, file letters underneath.
    pub fn board_string(&self) -> String {
        let rows = (0..8u8).rev().map(|rank| {
            let cells: Vec<String> = (0..8u8)
                .map(|file| {
                    self.piece_at(Square::from_file_rank(file, rank))
                        .map_or('.', Piece::to_char)
                        .to_string()
                })
                .collect();
            format!("{} {}", rank + 1, cells.join(" "))
        });
        let mut lines: Vec<String> = rows.collect();
        lines.push("  a b c d e f g h".to_string());
        lines.join("\n")
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Castling and en-passant helpers
// ---------------------------------------------------------------------------

/// For a castling king destination, return (rook_from, rook_to).
pub(crate) fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    let rank = king_to.rank();
    if king_to.file() == 6 {
        (Square::from_file_rank(7, rank), Square::from_file_rank(5, rank))
    } else {
        (Square::from_file_rank(0, rank), Square::from_file_rank(3, rank))
    }
}

/// Square of the pawn taken by an en-passant capture.
#[inline]
fn en_passant_victim(mv: Move) -> Square {
    Square::from_file_rank(mv.to.file(), mv.from.rank())
}

/// Rights that survive a move touching each square: a king or rook leaving
/// home, or a rook being captured there, clears the matching bits.
const CASTLING_MASK: [u8; 64] = {
    let all = CastlingRights::ALL.0;
    let mut mask = [all; 64];
    let homes: [(usize, u8); 6] = [
        (0, CastlingRights::WHITE_QUEENSIDE),
        (4, CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE),
        (7, CastlingRights::WHITE_KINGSIDE),
        (56, CastlingRights::BLACK_QUEENSIDE),
        (60, CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE),
        (63, CastlingRights::BLACK_KINGSIDE),
    ];
    let mut i = 0;
    while i < homes.len() {
        mask[homes[i].0] = all & !homes[i].1;
        i += 1;
    }
    mask
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
