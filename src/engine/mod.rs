pub mod attacks;
pub mod board;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod pgn;
pub mod san;
pub mod types;
pub mod zobrist;

pub use board::{Board, Position, STARTING_FEN, UndoInfo};
pub use game::{Game, GameView, HistoryEntry, MoveRequest};
pub use movegen::{legal_moves, legal_moves_from};
pub use pgn::{PgnGame, PgnTags, parse_pgn};
pub use san::{canonical_san, move_to_san, parse_san};
pub use types::*;
