//! Zobrist keys for position identification.
//!
//! Each aspect of a position (piece on square, side to move, castling rights,
//! en-passant file) gets a random 64-bit key and the position hash is the XOR
//! of all applicable keys, so make/unmake can update it incrementally.
//! Repetition detection compares these hashes.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::OnceLock;

use crate::engine::types::{Piece, Square};

/// 16 possible castling-rights bitmasks (0..15).
const CASTLING_KEYS: usize = 16;
/// Only the en-passant file is hashed.
const EP_KEYS: usize = 8;

/// Fixed seed so hashes are reproducible within and across runs of one build.
const SEED: u64 = 0x3243_F6A8_885A_308D;

pub struct ZobristKeys {
    /// piece\[color\]\[kind\]\[square\]
    piece: [[[u64; 64]; 6]; 2],
    /// XOR-ed in when Black is to move.
    pub side_to_move: u64,
    castling: [u64; CASTLING_KEYS],
    en_passant: [u64; EP_KEYS],
}

pub fn keys() -> &'static ZobristKeys {
    static KEYS: OnceLock<ZobristKeys> = OnceLock::new();
    KEYS.get_or_init(ZobristKeys::init)
}

impl ZobristKeys {
    fn init() -> Self {
        let mut rng = StdRng::seed_from_u64(SEED);

        let mut piece = [[[0u64; 64]; 6]; 2];
        for color in &mut piece {
            for kind in color {
                for key in kind {
                    *key = rng.next_u64();
                }
            }
        }
        let side_to_move = rng.next_u64();
        let mut castling = [0u64; CASTLING_KEYS];
        castling.iter_mut().for_each(|k| *k = rng.next_u64());
        let mut en_passant = [0u64; EP_KEYS];
        en_passant.iter_mut().for_each(|k| *k = rng.next_u64());

        ZobristKeys {
            piece,
            side_to_move,
            castling,
            en_passant,
        }
    }

    #[inline]
    pub fn piece_key(&self, piece: Piece, sq: Square) -> u64 {
        self.piece[piece.color.index()][piece.kind.index()][sq.index()]
    }

    #[inline]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }

    #[inline]
    pub fn castling_key(&self, rights: u8) -> u64 {
        self.castling[rights as usize]
    }
}
