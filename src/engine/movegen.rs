//! Legal move generation.
//!
//! Pipeline:
//!   1. Pseudo-legal moves per piece, from the attack patterns filtered by
//!      occupancy, plus pawn pushes and the special moves.
//!   2. Filter: make the move on a scratch copy, reject it if the mover's
//!      king is attacked, unmake.
//!
//! Pins, discovered checks and king adjacency all fall out of step 2.

use crate::engine::attacks;
use crate::engine::board::Position;
use crate::engine::types::{Color, Move, MoveFlags, Piece, PieceKind, Square, SquareSet};

// =========================================================================
// Public API
// =========================================================================

/// All legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut pseudo = Vec::with_capacity(64);
    generate_pseudo_legal(pos, &mut pseudo);
    filter_legal(pos, pseudo)
}

/// Legal moves of the piece on `from`; empty if the square is empty or holds
/// a piece of the side not to move.
pub fn legal_moves_from(pos: &Position, from: Square) -> Vec<Move> {
    let mut pseudo = Vec::with_capacity(32);
    if let Some(piece) = pos.piece_at(from)
        && piece.color == pos.side_to_move()
    {
        generate_piece_moves(pos, from, piece, &mut pseudo);
        if piece.kind == PieceKind::King {
            generate_castling_moves(pos, piece.color, &mut pseudo);
        }
    }
    filter_legal(pos, pseudo)
}

/// Does the side to move have at least one legal move?
pub fn has_legal_move(pos: &Position) -> bool {
    let mut pseudo = Vec::with_capacity(64);
    generate_pseudo_legal(pos, &mut pseudo);
    let mut scratch = pos.clone();
    pseudo.into_iter().any(|mv| is_legal_on(&mut scratch, mv))
}

// =========================================================================
// Legality filter
// =========================================================================

fn filter_legal(pos: &Position, pseudo: Vec<Move>) -> Vec<Move> {
    let mut scratch = pos.clone();
    pseudo
        .into_iter()
        .filter(|&mv| is_legal_on(&mut scratch, mv))
        .collect()
}

/// Make `mv`, test the mover's king, unmake. `scratch` is left unchanged.
fn is_legal_on(scratch: &mut Position, mv: Move) -> bool {
    let us = scratch.side_to_move();
    let undo = scratch.make_move(mv);
    let safe = !scratch.is_square_attacked(scratch.king_square(us), !us);
    scratch.unmake_move(mv, &undo);
    safe
}

// =========================================================================
// Pseudo-legal generation
// =========================================================================

fn generate_pseudo_legal(pos: &Position, moves: &mut Vec<Move>) {
    let us = pos.side_to_move();
    for (from, piece) in pos.board().pieces() {
        if piece.color == us {
            generate_piece_moves(pos, from, piece, moves);
        }
    }
    generate_castling_moves(pos, us, moves);
}

fn generate_piece_moves(pos: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    match piece.kind {
        PieceKind::Pawn => generate_pawn_moves(pos, from, piece.color, moves),
        _ => {
            let board = pos.board();
            let targets = attacks::attack_pattern(piece, from, board.occupancy());
            for to in targets.iter() {
                match board.piece_at(to) {
                    Some(other) if other.color == piece.color => {}
                    Some(_) => moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE)),
                    None => moves.push(Move::new(from, to)),
                }
            }
        }
    }
}

// =========================================================================
// Pawn moves
// =========================================================================

fn generate_pawn_moves(pos: &Position, from: Square, us: Color, moves: &mut Vec<Move>) {
    let board = pos.board();
    let promo_rank = match us {
        Color::White => 7,
        Color::Black => 0,
    };

    for to in attacks::pawn_pushes(us, from, board.occupancy()).iter() {
        if to.rank() == promo_rank {
            add_promotions(from, to, MoveFlags::NONE, moves);
        } else if to.rank().abs_diff(from.rank()) == 2 {
            moves.push(Move::with_flags(from, to, MoveFlags::DOUBLE_PUSH));
        } else {
            moves.push(Move::new(from, to));
        }
    }

    let diagonals = attacks::attack_pattern(Piece::new(us, PieceKind::Pawn), from, SquareSet::EMPTY);
    for to in diagonals.iter() {
        match board.piece_at(to) {
            Some(target) if target.color != us => {
                if to.rank() == promo_rank {
                    add_promotions(from, to, MoveFlags::CAPTURE, moves);
                } else {
                    moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE));
                }
            }
            Some(_) => {}
            None => {
                if pos.en_passant() == Some(to) {
                    moves.push(Move::with_flags(
                        from,
                        to,
                        MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
                    ));
                }
            }
        }
    }
}

/// One move per promotion piece.
fn add_promotions(from: Square, to: Square, flags: MoveFlags, moves: &mut Vec<Move>) {
    for promo in PieceKind::PROMOTIONS {
        moves.push(Move::with_promotion(from, to, promo, flags));
    }
}

// =========================================================================
// Castling
// =========================================================================

/// King and rook on their home squares, the squares between them empty, the
/// king not in check and not passing through or landing on an attacked
/// square, and the right still held.
fn generate_castling_moves(pos: &Position, us: Color, moves: &mut Vec<Move>) {
    let rights = pos.castling_rights();
    if !rights.can_castle_kingside(us) && !rights.can_castle_queenside(us) {
        return;
    }
    let rank = us.back_rank();
    let king_from = Square::from_file_rank(4, rank);
    if pos.piece_at(king_from) != Some(Piece::new(us, PieceKind::King)) {
        return;
    }
    let them = !us;
    if pos.is_square_attacked(king_from, them) {
        return;
    }

    let sides: [(bool, u8, &[u8], &[u8]); 2] = [
        // (kingside, rook file, must be empty, must be safe)
        (true, 7, &[5, 6], &[5, 6]),
        (false, 0, &[1, 2, 3], &[3, 2]),
    ];
    for (kingside, rook_file, empty, safe) in sides {
        let held = if kingside {
            rights.can_castle_kingside(us)
        } else {
            rights.can_castle_queenside(us)
        };
        if !held {
            continue;
        }
        let rook_sq = Square::from_file_rank(rook_file, rank);
        if pos.piece_at(rook_sq) != Some(Piece::new(us, PieceKind::Rook)) {
            continue;
        }
        if empty
            .iter()
            .any(|&f| pos.piece_at(Square::from_file_rank(f, rank)).is_some())
        {
            continue;
        }
        if safe
            .iter()
            .any(|&f| pos.is_square_attacked(Square::from_file_rank(f, rank), them))
        {
            continue;
        }
        let king_to = Square::from_file_rank(if kingside { 6 } else { 2 }, rank);
        moves.push(Move::with_flags(king_from, king_to, MoveFlags::CASTLING));
    }
}

// =========================================================================
// Tests
// =========================================================================
