//! Movement patterns for every piece kind.
//!
//! Stepping pieces (knight, king, pawn captures) read from tables that are
//! built once via `OnceLock` and live for the lifetime of the process.
//! Sliding pieces walk their rays square by square until the first occupied
//! square, which is included so that captures fall out of the same pattern.

use crate::engine::types::{Color, Piece, PieceKind, Square, SquareSet};
use std::sync::OnceLock;

// =========================================================================
// Public API
// =========================================================================

/// Squares `piece` standing on `square` could capture on, given the set of
/// occupied squares. For pawns this is the two forward diagonals only; see
/// [`pawn_pushes`] for the non-capturing moves.
pub fn attack_pattern(piece: Piece, square: Square, occupancy: SquareSet) -> SquareSet {
    let t = tables();
    match piece.kind {
        PieceKind::Pawn => t.pawn_attacks(piece.color, square),
        PieceKind::Knight => t.knight_attacks(square),
        PieceKind::King => t.king_attacks(square),
        PieceKind::Bishop => bishop_attacks(square, occupancy),
        PieceKind::Rook => rook_attacks(square, occupancy),
        PieceKind::Queen => rook_attacks(square, occupancy) | bishop_attacks(square, occupancy),
    }
}

/// Forward pushes of a pawn: one square if empty, and two from the starting
/// rank if both squares are empty.
pub fn pawn_pushes(color: Color, square: Square, occupancy: SquareSet) -> SquareSet {
    let mut pushes = SquareSet::EMPTY;
    let dir = color.forward();
    let Some(one) = square.offset(0, dir) else {
        return pushes;
    };
    if occupancy.contains(one) {
        return pushes;
    }
    pushes.insert(one);

    let start_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };
    if square.rank() == start_rank
        && let Some(two) = one.offset(0, dir)
        && !occupancy.contains(two)
    {
        pushes.insert(two);
    }
    pushes
}

/// Rook reach from `sq`, stopping at (and including) the first blocker on
/// each ray.
#[inline]
pub fn rook_attacks(sq: Square, occupancy: SquareSet) -> SquareSet {
    sliding_attacks(sq, occupancy, &ROOK_DELTAS)
}

/// Bishop reach from `sq`, stopping at (and including) the first blocker on
/// each diagonal.
#[inline]
pub fn bishop_attacks(sq: Square, occupancy: SquareSet) -> SquareSet {
    sliding_attacks(sq, occupancy, &BISHOP_DELTAS)
}

// =========================================================================
// Stepping tables
// =========================================================================

/// Get a reference to the global stepping tables.
pub fn tables() -> &'static StepTables {
    static TABLES: OnceLock<StepTables> = OnceLock::new();
    TABLES.get_or_init(StepTables::init)
}

/// Pre-computed reach of the stepping pieces from every square.
pub struct StepTables {
    knight: [SquareSet; 64],
    king: [SquareSet; 64],
    /// `pawn[color][square]`: diagonals a pawn on `square` attacks.
    pawn: [[SquareSet; 64]; 2],
}

impl StepTables {
    #[inline]
    pub fn knight_attacks(&self, sq: Square) -> SquareSet {
        self.knight[sq.index()]
    }

    #[inline]
    pub fn king_attacks(&self, sq: Square) -> SquareSet {
        self.king[sq.index()]
    }

    #[inline]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> SquareSet {
        self.pawn[color.index()][sq.index()]
    }

    fn init() -> Self {
        let white_pawn = [(-1, 1), (1, 1)];
        let black_pawn = [(-1, -1), (1, -1)];
        StepTables {
            knight: step_table(&KNIGHT_DELTAS),
            king: step_table(&KING_DELTAS),
            pawn: [step_table(&white_pawn), step_table(&black_pawn)],
        }
    }
}

/// (file_delta, rank_delta) steps.
const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ROOK_DELTAS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DELTAS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

fn step_table(deltas: &[(i8, i8)]) -> [SquareSet; 64] {
    let mut table = [SquareSet::EMPTY; 64];
    for sq in Square::all() {
        table[sq.index()] = deltas
            .iter()
            .filter_map(|&(df, dr)| sq.offset(df, dr))
            .collect();
    }
    table
}

fn sliding_attacks(sq: Square, occupancy: SquareSet, deltas: &[(i8, i8)]) -> SquareSet {
    let mut attacks = SquareSet::EMPTY;
    for &(df, dr) in deltas {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            attacks.insert(next);
            if occupancy.contains(next) {
                break;
            }
            cur = next;
        }
    }
    attacks
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

    fn set(names: &[&str]) -> SquareSet {
        names.iter().map(|n| sq(n)).collect()
    }

    fn white(kind: PieceKind) -> Piece {
        Piece::new(Color::White, kind)
    }

    // -------------------------------------------------------------------
    // Stepping pieces
    // -------------------------------------------------------------------

    #[test]
    fn knight_center_attacks() {
        let attacks = attack_pattern(white(PieceKind::Knight), sq("e4"), SquareSet::EMPTY);
        assert_eq!(
            attacks,
            set(&["d2", "f2", "c3", "g3", "c5", "g5", "d6", "f6"])
        );
    }

    #[test]
    fn knight_corner_and_edge() {
        let t = tables();
        assert_eq!(t.knight_attacks(sq("a1")), set(&["b3", "c2"]));
        assert_eq!(t.knight_attacks(sq("a4")).len(), 4);
    }

    #[test]
    fn king_attacks() {
        let t = tables();
        assert_eq!(t.king_attacks(sq("e4")).len(), 8);
        assert_eq!(t.king_attacks(sq("a1")), set(&["a2", "b1", "b2"]));
    }

    #[test]
    fn every_square_has_stepping_moves() {
        let t = tables();
        for s in Square::all() {
            assert!(t.knight_attacks(s).len() >= 2, "knight table empty at {s}");
            assert!(t.king_attacks(s).len() >= 3, "king table empty at {s}");
        }
    }

    #[test]
    fn pawn_attacks_by_color() {
        let t = tables();
        assert_eq!(t.pawn_attacks(Color::White, sq("e4")), set(&["d5", "f5"]));
        assert_eq!(t.pawn_attacks(Color::Black, sq("e4")), set(&["d3", "f3"]));
        assert_eq!(t.pawn_attacks(Color::White, sq("a2")), set(&["b3"]));
        assert_eq!(t.pawn_attacks(Color::White, sq("h2")), set(&["g3"]));
        assert!(t.pawn_attacks(Color::White, sq("e8")).is_empty());
    }

    // -------------------------------------------------------------------
    // Sliding pieces
    // -------------------------------------------------------------------

    #[test]
    fn rook_attacks_empty_board() {
        assert_eq!(rook_attacks(sq("e4"), SquareSet::EMPTY).len(), 14);
        assert_eq!(rook_attacks(sq("a1"), SquareSet::EMPTY).len(), 14);
    }

    #[test]
    fn rook_attacks_blocked() {
        let attacks = rook_attacks(sq("e4"), set(&["e6"]));
        assert!(attacks.contains(sq("e5")));
        assert!(attacks.contains(sq("e6")));
        assert!(!attacks.contains(sq("e7")));
    }

    #[test]
    fn bishop_attacks() {
        assert_eq!(super::bishop_attacks(sq("e4"), SquareSet::EMPTY).len(), 13);
        assert_eq!(super::bishop_attacks(sq("a1"), SquareSet::EMPTY).len(), 7);
        let blocked = super::bishop_attacks(sq("e4"), set(&["c6"]));
        assert!(blocked.contains(sq("c6")));
        assert!(!blocked.contains(sq("b7")));
    }

    #[test]
    fn queen_is_rook_plus_bishop() {
        let attacks = attack_pattern(white(PieceKind::Queen), sq("e4"), SquareSet::EMPTY);
        assert_eq!(attacks.len(), 27);
    }

    #[test]
    fn pattern_is_color_independent_except_pawns() {
        let occ = set(&["d5", "c2"]);
        for kind in [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::King] {
            assert_eq!(
                attack_pattern(Piece::new(Color::White, kind), sq("d4"), occ),
                attack_pattern(Piece::new(Color::Black, kind), sq("d4"), occ),
            );
        }
    }

    // -------------------------------------------------------------------
    // Pawn pushes
    // -------------------------------------------------------------------

    #[test]
    fn pawn_double_push_from_start() {
        assert_eq!(
            pawn_pushes(Color::White, sq("e2"), SquareSet::EMPTY),
            set(&["e3", "e4"])
        );
        assert_eq!(
            pawn_pushes(Color::Black, sq("d7"), SquareSet::EMPTY),
            set(&["d6", "d5"])
        );
    }

    #[test]
    fn pawn_single_push_off_start() {
        assert_eq!(pawn_pushes(Color::White, sq("e3"), SquareSet::EMPTY), set(&["e4"]));
    }

    #[test]
    fn pawn_push_blocked() {
        assert!(pawn_pushes(Color::White, sq("e2"), set(&["e3"])).is_empty());
        assert_eq!(pawn_pushes(Color::White, sq("e2"), set(&["e4"])), set(&["e3"]));
    }
}
