//! Rule-level behaviour through the public `Game` API.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use chess_rules::ai::{MoveChooser, RandomMover, Strength};
use chess_rules::config::RulesConfig;
use chess_rules::engine::{
    ChessError, Color, DrawReason, Game, GameStatus, Move, Piece, PieceKind, Position, Square,
};

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn play(game: &mut Game, sans: &[&str]) {
    for san in sans {
        game.apply_san(san)
            .unwrap_or_else(|e| panic!("{san} rejected: {e}"));
    }
}

fn no_draw_rules() -> RulesConfig {
    RulesConfig {
        fifty_move_rule: false,
        threefold_repetition: false,
        insufficient_material: false,
        ..Default::default()
    }
}

#[test]
fn starting_position_has_twenty_moves() {
    let game = Game::new();
    assert_eq!(game.legal_moves().len(), 20);
    assert_eq!(*game.status(), GameStatus::Active);
    assert_eq!(game.side_to_move(), Color::White);
}

#[test]
fn fools_mate() {
    let mut game = Game::new();
    play(&mut game, &["f3", "e5", "g4", "Qh4"]);
    assert_eq!(*game.status(), GameStatus::Checkmate);
    assert!(game.legal_moves().is_empty());
    assert!(game.movetext().ends_with("Qh4#"));
    assert_eq!(game.result_token(), "0-1");
    assert_eq!(
        game.apply_san("a3"),
        Err(ChessError::GameOver(GameStatus::Checkmate))
    );
}

#[test]
fn rook_round_trip_revokes_kingside_castling() {
    let mut game = Game::new();
    play(&mut game, &["Nf3", "a6", "Rg1", "a5", "Rh1", "a4"]);
    let rights = game.position().castling_rights();
    assert!(!rights.can_castle_kingside(Color::White));
    assert!(rights.can_castle_queenside(Color::White));
    assert!(rights.can_castle_kingside(Color::Black));
    assert!(game.to_fen().contains(" Qkq "));
}

#[test]
fn en_passant_target_lives_for_one_move() {
    let mut game = Game::new();
    play(&mut game, &["e4"]);
    assert_eq!(game.position().en_passant(), Some(sq("e3")));
    play(&mut game, &["Nf6"]);
    assert_eq!(game.position().en_passant(), None);

    play(&mut game, &["e5", "d5"]);
    assert_eq!(game.position().en_passant(), Some(sq("d6")));
    assert_eq!(game.apply_san("exd6").unwrap(), "exd6");
    assert_eq!(game.position().piece_at(sq("d5")), None);
    assert_eq!(
        game.position().piece_at(sq("d6")),
        Some(Piece::new(Color::White, PieceKind::Pawn))
    );
    assert_eq!(game.position().en_passant(), None);
}

#[test]
fn promotion_offers_four_pieces() {
    let mut game = Game::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let promotions: Vec<Move> = game
        .legal_moves_from(sq("a7"))
        .into_iter()
        .filter(|m| m.to == sq("a8"))
        .collect();
    assert_eq!(promotions.len(), 4);
    assert!(game.is_promotion_move(sq("a7"), sq("a8")));

    assert!(matches!(
        game.find_move(sq("a7"), sq("a8"), None),
        Err(ChessError::IllegalMove { .. })
    ));
    let queen = game
        .find_move(sq("a7"), sq("a8"), Some(PieceKind::Queen))
        .unwrap();
    assert_eq!(game.apply_move(queen).unwrap(), "a8=Q");
    assert_eq!(
        game.position().piece_at(sq("a8")),
        Some(Piece::new(Color::White, PieceKind::Queen))
    );
}

#[test]
fn illegal_moves_leave_the_game_untouched() {
    let mut game = Game::new();
    play(&mut game, &["e4", "e5"]);
    let before = game.position().clone();
    let fen = game.to_fen();

    let bogus = Move::new(sq("e1"), sq("e3"));
    assert!(matches!(
        game.apply_move(bogus),
        Err(ChessError::IllegalMove { .. })
    ));
    assert!(matches!(
        game.apply_san("Ke3"),
        Err(ChessError::InvalidSan { .. })
    ));
    assert!(game.apply_uci("e8e7").is_err());

    assert_eq!(game.position(), &before);
    assert_eq!(game.to_fen(), fen);
    assert_eq!(game.history().len(), 2);
}

#[test]
fn pinned_piece_cannot_move() {
    // The e2 knight is pinned by the e8 rook.
    let game = Game::from_fen("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
    assert!(game.legal_moves_from(sq("e2")).is_empty());
    assert!(matches!(
        game.find_move(sq("e2"), sq("c3"), None),
        Err(ChessError::IllegalMove { .. })
    ));
}

#[test]
fn threefold_repetition() {
    let mut game = Game::new();
    play(&mut game, &["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1"]);
    assert_eq!(*game.status(), GameStatus::Active);
    play(&mut game, &["Ng8"]);
    assert_eq!(
        *game.status(),
        GameStatus::Draw(DrawReason::ThreefoldRepetition)
    );
    assert_eq!(game.repetition_count(), 3);
    assert_eq!(game.result_token(), "1/2-1/2");

    game.undo_move().unwrap();
    assert_eq!(*game.status(), GameStatus::Active);
}

#[test]
fn fifty_move_rule_is_configurable() {
    let fen = "8/8/8/4k3/8/8/8/R3K3 w - - 99 80";
    let mut game = Game::from_fen(fen).unwrap();
    play(&mut game, &["Ra2"]);
    assert_eq!(*game.status(), GameStatus::Draw(DrawReason::FiftyMoveRule));

    let mut relaxed = Game::from_fen(fen).unwrap().with_config(no_draw_rules());
    play(&mut relaxed, &["Ra2"]);
    assert_eq!(*relaxed.status(), GameStatus::Active);
}

#[test]
fn insufficient_material() {
    let game = Game::from_fen("8/8/8/4k3/8/8/8/4K2N w - - 0 1").unwrap();
    assert_eq!(
        *game.status(),
        GameStatus::Draw(DrawReason::InsufficientMaterial)
    );

    let mut game = Game::from_fen("8/8/8/4k3/8/8/4r3/4K2N w - - 0 1").unwrap();
    assert_eq!(*game.status(), GameStatus::Check);
    play(&mut game, &["Kxe2"]);
    assert_eq!(
        *game.status(),
        GameStatus::Draw(DrawReason::InsufficientMaterial)
    );
}

#[test]
fn stale_collaborator_answer_is_rejected() {
    let mut game = Game::new();
    let request = game.request_collaborator_move(Strength::default()).unwrap();
    let answer = RandomMover::seeded(1)
        .choose_move(&request.position, request.strength)
        .unwrap();
    play(&mut game, &["d4"]);
    assert_eq!(
        game.submit_collaborator_move(&request, answer),
        Err(ChessError::StaleMove)
    );
    assert_eq!(game.history().len(), 1);

    let fresh = game.request_collaborator_move(Strength::MAX).unwrap();
    let answer = RandomMover::seeded(1)
        .choose_move(&fresh.position, fresh.strength)
        .unwrap();
    game.submit_collaborator_move(&fresh, answer).unwrap();
    assert_eq!(game.history().len(), 2);
}

#[test]
fn collaborator_cannot_smuggle_an_illegal_move() {
    struct Cheater;
    impl MoveChooser for Cheater {
        fn choose_move(&self, _: &Position, _: Strength) -> Result<Move, ChessError> {
            Ok(Move::new("e2".parse()?, "e5".parse()?))
        }
        fn name(&self) -> &str {
            "Cheater"
        }
    }

    let mut game = Game::new();
    assert!(matches!(
        game.play_collaborator_move(&Cheater, Strength::default()),
        Err(ChessError::IllegalMove { .. })
    ));
    assert!(game.history().is_empty());
}

/// Random legal walks: every move must undo to the exact prior position,
/// redo to the same successor, and survive a FEN round trip.
#[test]
fn random_walks_undo_and_fen_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..40 {
        let mut game = Game::new().with_config(no_draw_rules());
        for _ in 0..80 {
            let moves = game.legal_moves();
            let Some(&mv) = moves.choose(&mut rng) else {
                break;
            };
            let before = game.position().clone();
            game.apply_move(mv).unwrap();
            let after = game.position().clone();

            let reparsed = Position::from_fen(&after.to_fen()).unwrap();
            assert_eq!(reparsed, after, "FEN round trip after {mv}");

            assert_eq!(game.undo_move().unwrap(), mv);
            assert_eq!(game.position(), &before, "undo of {mv}");
            game.redo_move().unwrap();
            assert_eq!(game.position(), &after, "redo of {mv}");
        }

        // Unwinding the whole game returns to the start.
        while !game.history().is_empty() {
            game.undo_move().unwrap();
        }
        assert_eq!(game.position(), &Position::starting());
        assert_eq!(game.undo_move(), Err(ChessError::EmptyHistory));
    }
}

#[test]
fn pgn_round_trip_of_a_random_game() {
    let mover = RandomMover::seeded(2024);
    let mut game = Game::new();
    while !game.is_game_over() && game.history().len() < 120 {
        game.play_collaborator_move(&mover, Strength::default())
            .unwrap();
    }
    let replayed = Game::from_pgn(&game.to_pgn()).unwrap();
    assert_eq!(replayed.position(), game.position());
    assert_eq!(replayed.san_history(), game.san_history());
    assert_eq!(replayed.status(), game.status());
}
