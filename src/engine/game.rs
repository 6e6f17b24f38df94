//! Stateful game controller wrapping `Position`.
//!
//! `Game` sequences turns, keeps the move history with SAN, supports undo and
//! redo, tracks position hashes for repetition and detects the terminal
//! states. It is the only public way to change a position.

use tracing::{debug, warn};

use crate::ai::{MoveChooser, Strength};
use crate::config::RulesConfig;
use crate::engine::board::{Position, UndoInfo};
use crate::engine::movegen;
use crate::engine::pgn::PgnTags;
use crate::engine::san;
use crate::engine::types::{ChessError, Color, DrawReason, GameStatus, Move, Piece, PieceKind, Square};
use crate::engine::zobrist;

// =========================================================================
// HistoryEntry
// =========================================================================

/// One applied move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    /// SAN including the `+` / `#` suffix.
    pub san: String,
    pub status_after: GameStatus,
    /// Auxiliary state from before the move.
    pub undo: UndoInfo,
}

/// Read-only snapshot for a UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameView {
    pub position: Position,
    pub status: GameStatus,
    pub side_to_move: Color,
    pub fen: String,
    /// Plies played since the starting position.
    pub ply: usize,
    pub last_move: Option<String>,
}

/// A pending question to a move chooser.
///
/// The snapshot is owned, so the chooser may run anywhere; `ply` and `hash`
/// identify the position it answers for.
#[derive(Clone, Debug)]
pub struct MoveRequest {
    pub position: Position,
    pub strength: Strength,
    pub ply: usize,
    pub hash: u64,
}

// =========================================================================
// Game
// =========================================================================

#[derive(Clone, Debug)]
pub struct Game {
    start: Position,
    position: Position,
    history: Vec<HistoryEntry>,
    /// Undone moves, most recent last.
    redo: Vec<Move>,
    /// Repetition keys of every position reached, including the current one.
    position_hashes: Vec<u64>,
    status: GameStatus,
    config: RulesConfig,
    pub tags: PgnTags,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game from the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::starting())
    }

    /// A new game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    pub(crate) fn from_position(pos: Position) -> Self {
        let mut game = Game {
            start: pos.clone(),
            position_hashes: vec![repetition_key(&pos)],
            position: pos,
            history: Vec::new(),
            redo: Vec::new(),
            status: GameStatus::Active,
            config: RulesConfig::default(),
            tags: PgnTags::default(),
        };
        game.status = game.compute_status();
        game
    }

    /// Replace the rule configuration and re-evaluate the status.
    pub fn with_config(mut self, config: RulesConfig) -> Self {
        self.config = config;
        self.status = self.compute_status();
        self
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn starting_position(&self) -> &Position {
        &self.start
    }

    /// Whether the game began somewhere other than the standard setup.
    pub fn started_from_fen(&self) -> bool {
        self.start != Position::starting()
    }

    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Pieces captured so far, in the order they were taken.
    pub fn captured_pieces(&self) -> Vec<Piece> {
        self.history.iter().filter_map(|e| e.undo.captured).collect()
    }

    /// SAN of every applied move, in order.
    pub fn san_history(&self) -> Vec<&str> {
        self.history.iter().map(|e| e.san.as_str()).collect()
    }

    pub fn is_game_over(&self) -> bool {
        self.status.is_game_over()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(&self.position)
    }

    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        movegen::legal_moves_from(&self.position, sq)
    }

    /// Would moving `from` → `to` promote a pawn? Lets a UI ask for the
    /// piece before calling [`Game::find_move`].
    pub fn is_promotion_move(&self, from: Square, to: Square) -> bool {
        self.legal_moves_from(from)
            .iter()
            .any(|m| m.to == to && m.promotion.is_some())
    }

    pub fn current_state(&self) -> GameView {
        GameView {
            position: self.position.clone(),
            status: self.status.clone(),
            side_to_move: self.position.side_to_move(),
            fen: self.position.to_fen(),
            ply: self.history.len(),
            last_move: self.history.last().map(|e| e.san.clone()),
        }
    }

    // -----------------------------------------------------------------
    // Move lookup
    // -----------------------------------------------------------------

    /// The legal move matching the given coordinates.
    pub fn find_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Move, ChessError> {
        let candidates: Vec<Move> = self
            .legal_moves_from(from)
            .into_iter()
            .filter(|m| m.to == to)
            .collect();
        if let Some(mv) = candidates.iter().find(|m| m.promotion == promotion) {
            return Ok(*mv);
        }
        let reason = match candidates.first() {
            Some(_) if promotion.is_none() => "a promotion piece is required".to_string(),
            Some(_) => "invalid promotion piece".to_string(),
            None => self.rejection_reason(from),
        };
        let mut mv = Move::new(from, to);
        mv.promotion = promotion;
        Err(ChessError::IllegalMove { mv, reason })
    }

    /// Resolve coordinate notation such as `e2e4` or `e7e8q`.
    pub fn parse_uci(&self, text: &str) -> Result<Move, ChessError> {
        let text = text.trim();
        if !(4..=5).contains(&text.len()) || !text.is_ascii() {
            return Err(ChessError::InvalidSan {
                san: text.to_string(),
                reason: "expected coordinate notation like e2e4".into(),
            });
        }
        let from: Square = text[0..2].parse()?;
        let to: Square = text[2..4].parse()?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => Some(
                PieceKind::from_letter(c)
                    .filter(|k| PieceKind::PROMOTIONS.contains(k))
                    .ok_or_else(|| ChessError::InvalidSan {
                        san: text.to_string(),
                        reason: format!("invalid promotion piece '{c}'"),
                    })?,
            ),
        };
        self.find_move(from, to, promotion)
    }

    fn rejection_reason(&self, from: Square) -> String {
        match self.position.piece_at(from) {
            None => format!("no piece on {from}"),
            Some(piece) if piece.color != self.side_to_move() => {
                format!("it is {}'s turn", self.side_to_move())
            }
            Some(piece) => format!("the {} on {from} cannot move there", piece.kind),
        }
    }

    // -----------------------------------------------------------------
    // Apply / undo / redo
    // -----------------------------------------------------------------

    /// Play a legal move and return its SAN.
    ///
    /// Fails with `GameOver` once the game has ended and `IllegalMove` for
    /// anything not in the legal move list. A failed call changes nothing.
    pub fn apply_move(&mut self, mv: Move) -> Result<String, ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status.clone()));
        }
        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            let own_piece = self
                .position
                .piece_at(mv.from)
                .is_some_and(|p| p.color == self.side_to_move());
            let reason = if own_piece {
                "not a legal move in this position".to_string()
            } else {
                self.rejection_reason(mv.from)
            };
            return Err(ChessError::IllegalMove { mv, reason });
        }
        self.redo.clear();
        Ok(self.record(mv, &legal))
    }

    /// Play a move given in SAN.
    pub fn apply_san(&mut self, text: &str) -> Result<String, ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status.clone()));
        }
        let mv = san::parse_san(&self.position, text)?;
        self.apply_move(mv)
    }

    /// Play a move given in coordinate notation.
    pub fn apply_uci(&mut self, text: &str) -> Result<String, ChessError> {
        let mv = self.parse_uci(text)?;
        self.apply_move(mv)
    }

    /// Take back the last move, restoring the exact prior position.
    pub fn undo_move(&mut self) -> Result<Move, ChessError> {
        let entry = self.history.pop().ok_or(ChessError::EmptyHistory)?;
        self.position.unmake_move(entry.mv, &entry.undo);
        self.position_hashes.pop();
        self.status = self.compute_status();
        self.redo.push(entry.mv);
        debug!(mv = %entry.mv, san = %entry.san, "undid move");
        Ok(entry.mv)
    }

    /// Re-apply the most recently undone move.
    pub fn redo_move(&mut self) -> Result<String, ChessError> {
        let mv = *self.redo.last().ok_or(ChessError::NothingToRedo)?;
        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            return Err(ChessError::IllegalMove {
                mv,
                reason: "redo move is not legal in this position".into(),
            });
        }
        self.redo.pop();
        let san = self.record(mv, &legal);
        debug!(mv = %mv, san = %san, "redid move");
        Ok(san)
    }

    /// Make `mv` (already known to be legal) and append the history entry.
    fn record(&mut self, mv: Move, legal: &[Move]) -> String {
        let mut san = san::san_without_suffix(&self.position, mv, legal);
        let undo = self.position.make_move(mv);
        self.position_hashes.push(repetition_key(&self.position));

        self.status = self.compute_status();
        if self.status == GameStatus::Checkmate {
            san.push('#');
        } else if self.position.is_in_check() {
            san.push('+');
        }

        debug!(mv = %mv, san = %san, status = %self.status, "applied move");
        if self.status.is_game_over() {
            debug!(status = %self.status, plies = self.history.len() + 1, "game over");
        }

        self.history.push(HistoryEntry {
            mv,
            san: san.clone(),
            status_after: self.status.clone(),
            undo,
        });
        san
    }

    // -----------------------------------------------------------------
    // Reset / load
    // -----------------------------------------------------------------

    /// Back to the standard starting position. Tags and rules are kept.
    pub fn reset(&mut self) {
        self.restart_from(Position::starting());
    }

    /// Replace the game with a FEN position. Nothing changes on error.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), ChessError> {
        let pos = Position::from_fen(fen)?;
        self.restart_from(pos);
        Ok(())
    }

    fn restart_from(&mut self, pos: Position) {
        self.position_hashes = vec![repetition_key(&pos)];
        self.start = pos.clone();
        self.position = pos;
        self.history.clear();
        self.redo.clear();
        self.status = self.compute_status();
    }

    // -----------------------------------------------------------------
    // Move chooser handshake
    // -----------------------------------------------------------------

    /// Snapshot the current position for a move chooser.
    pub fn request_collaborator_move(&self, strength: Strength) -> Result<MoveRequest, ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status.clone()));
        }
        Ok(MoveRequest {
            position: self.position.clone(),
            strength,
            ply: self.history.len(),
            hash: self.position.zobrist_hash(),
        })
    }

    /// Apply a chooser's answer, provided the game has not moved on since
    /// the request. The move is validated like any other.
    pub fn submit_collaborator_move(
        &mut self,
        request: &MoveRequest,
        mv: Move,
    ) -> Result<String, ChessError> {
        if request.ply != self.history.len() || request.hash != self.position.zobrist_hash() {
            warn!(mv = %mv, request_ply = request.ply, ply = self.history.len(), "stale collaborator move");
            return Err(ChessError::StaleMove);
        }
        self.apply_move(mv).inspect_err(|e| {
            warn!(mv = %mv, error = %e, "rejected collaborator move");
        })
    }

    /// Ask `chooser` for a move and apply it.
    pub fn play_collaborator_move(
        &mut self,
        chooser: &dyn MoveChooser,
        strength: Strength,
    ) -> Result<String, ChessError> {
        let request = self.request_collaborator_move(strength)?;
        let mv = chooser.choose_move(&request.position, request.strength)?;
        self.submit_collaborator_move(&request, mv)
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    fn compute_status(&self) -> GameStatus {
        let in_check = self.position.is_in_check();
        if !movegen::has_legal_move(&self.position) {
            return if in_check {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            };
        }
        if self.config.fifty_move_rule && self.position.halfmove_clock() >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }
        if self.config.threefold_repetition && self.repetition_count() >= 3 {
            return GameStatus::Draw(DrawReason::ThreefoldRepetition);
        }
        if self.config.insufficient_material && self.position.is_insufficient_material() {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }
        if in_check {
            GameStatus::Check
        } else {
            GameStatus::Active
        }
    }

    /// How often the current position has occurred, counting now.
    pub fn repetition_count(&self) -> usize {
        let current = repetition_key(&self.position);
        self.position_hashes.iter().filter(|&&h| h == current).count()
    }
}

/// Zobrist hash with the en-passant file dropped unless an en-passant
/// capture is actually legal. Positions that differ only by an uncapturable
/// target count as the same position.
fn repetition_key(pos: &Position) -> u64 {
    match pos.en_passant() {
        Some(ep) if !movegen::legal_moves(pos).iter().any(|m| m.is_en_passant()) => {
            pos.zobrist_hash() ^ zobrist::keys().ep_key(ep.file())
        }
        _ => pos.zobrist_hash(),
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
