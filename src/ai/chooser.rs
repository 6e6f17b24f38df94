//! The move-chooser contract and the uniformly random reference chooser.
//!
//! A chooser receives an owned position snapshot and a strength rating and
//! answers with one move. It never touches the game: the answer goes back
//! through `Game::submit_collaborator_move`, which re-validates it.

use std::fmt;
use std::sync::Mutex;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::engine::board::Position;
use crate::engine::movegen::legal_moves;
use crate::engine::types::{ChessError, GameStatus, Move};

// =========================================================================
// Strength
// =========================================================================

/// Playing strength on an Elo-like scale, clamped to 300..=2000.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Strength(u16);

impl Strength {
    pub const MIN: Strength = Strength(300);
    pub const MAX: Strength = Strength(2000);

    /// Clamp `rating` into the supported range.
    pub fn new(rating: u16) -> Self {
        Strength(rating.clamp(Self::MIN.0, Self::MAX.0))
    }

    #[inline]
    pub fn rating(self) -> u16 {
        self.0
    }
}

impl Default for Strength {
    fn default() -> Self {
        Strength(1400)
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// MoveChooser trait
// =========================================================================

/// Anything that can pick a move for a position.
pub trait MoveChooser: Send + Sync {
    /// Pick a move for the side to move in `snapshot`.
    fn choose_move(&self, snapshot: &Position, strength: Strength) -> Result<Move, ChessError>;

    /// Human-readable name for this chooser.
    fn name(&self) -> &str;
}

// =========================================================================
// RandomMover
// =========================================================================

/// Picks a legal move uniformly at random, whatever the strength.
pub struct RandomMover {
    rng: Option<Mutex<StdRng>>,
}

impl RandomMover {
    /// Draws from the thread-local generator.
    pub fn new() -> Self {
        RandomMover { rng: None }
    }

    /// Reproducible sequence of choices for a given seed.
    pub fn seeded(seed: u64) -> Self {
        RandomMover {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for RandomMover {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveChooser for RandomMover {
    fn choose_move(&self, snapshot: &Position, _strength: Strength) -> Result<Move, ChessError> {
        let moves = legal_moves(snapshot);
        let picked = match &self.rng {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                moves.choose(&mut *rng).copied()
            }
            None => moves.choose(&mut rand::thread_rng()).copied(),
        };
        picked.ok_or_else(|| {
            ChessError::GameOver(if snapshot.is_in_check() {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            })
        })
    }

    fn name(&self) -> &str {
        "RandomMover"
    }
}

// =========================================================================
// Tests
// =========================================================================
