//! Chess rules: legal move generation, a game state machine with undo and
//! redo, FEN / SAN / PGN serialization and an opening book.

pub mod ai;
pub mod config;
pub mod engine;
pub mod openings;

pub use engine::{ChessError, Color, Game, GameStatus, Move, Piece, PieceKind, Position, Square};
