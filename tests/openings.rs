//! Opening book built from table text and queried with real game histories.

use chess_rules::engine::{ChessError, Game};
use chess_rules::openings::{self, OpeningMatch, OpeningTrie, parse_opening_table};

const BOOK: &str = "eco\tname\tpgn
B20\tSicilian Defense\t1. e4 c5
B27\tSicilian Defense: Hyperaccelerated Dragon\t1. e4 c5 2. Nf3 g6
B30\tSicilian Defense: Old Sicilian\t1. e4 c5 2. Nf3 Nc6
C42\tPetrov's Defense\t1. e4 e5 2. Nf3 Nf6
C44\tKing's Pawn Game: Tayler Opening\t1. e4 e5 2. Nf3 Nc6 3. Be2
C60\tRuy Lopez\t1. e4 e5 2. Nf3 Nc6 3. Bb5
C65\tRuy Lopez: Berlin Defense\t1. e4 e5 2. Nf3 Nc6 3. Bb5 Nf6
D06\tQueen's Gambit\t1. d4 d5 2. c4
";

fn book() -> OpeningTrie {
    OpeningTrie::from_records(parse_opening_table(BOOK).unwrap()).unwrap()
}

fn game(sans: &[&str]) -> Game {
    let mut game = Game::new();
    for san in sans {
        game.apply_san(san).unwrap();
    }
    game
}

#[test]
fn classifies_played_games() {
    let trie = book();
    assert_eq!(trie.len(), 8);

    let berlin = game(&["e4", "e5", "Nf3", "Nc6", "Bb5", "Nf6", "O-O", "Nxe4"]);
    let opening = trie.lookup(&berlin.san_history()).unwrap();
    assert_eq!(opening.opening_name, "Ruy Lopez");
    assert_eq!(opening.variation_name, "Berlin Defense");

    let qg = game(&["d4", "d5", "c4", "dxc4"]);
    assert_eq!(trie.lookup(&qg.san_history()).unwrap().to_string(), "Queen's Gambit");

    assert_eq!(trie.lookup(&game(&["c4"]).san_history()), None);
}

#[test]
fn check_suffixes_do_not_break_lookup() {
    let mut trie = OpeningTrie::new();
    trie.insert(&["e4", "f5", "exf5", "Kf7", "Qh5"], "Test Line", "Check")
        .unwrap();
    let played = game(&["e4", "f5", "exf5", "Kf7", "Qh5"]);
    assert_eq!(played.san_history().last(), Some(&"Qh5+"));
    assert_eq!(
        trie.lookup(&played.san_history()).unwrap().variation_name,
        "Check"
    );
}

#[test]
fn book_moves_and_continuations() {
    let trie = book();
    let history = game(&["e4", "e5", "Nf3", "Nc6"]);
    match trie.classify(&history.san_history()) {
        OpeningMatch::BookMove { candidates } => {
            assert_eq!(candidates, vec!["King's Pawn Game", "Ruy Lopez"]);
        }
        other => panic!("expected a book move, got {other:?}"),
    }
    let replies: Vec<&str> = trie
        .continuations(&history.san_history())
        .iter()
        .map(|c| c.san)
        .collect();
    assert_eq!(replies, vec!["Bb5", "Be2"]);

    let sicilian = game(&["e4", "c5"]);
    assert!(matches!(
        trie.classify(&sicilian.san_history()),
        OpeningMatch::Named(o) if o.opening_name == "Sicilian Defense"
    ));
    assert_eq!(
        trie.classify(&game(&["a3"]).san_history()),
        OpeningMatch::OutOfBook
    );
}

#[test]
fn conflicting_table_fails_to_build() {
    let text = format!("{BOOK}C61\tRuy Lopez: Bird Variation\t1. e4 e5 2. Nf3 Nc6 3. Bb5\n");
    let err = OpeningTrie::from_records(parse_opening_table(&text).unwrap()).unwrap_err();
    assert_eq!(
        err,
        ChessError::OpeningDataConflict {
            path: "e4 e5 Nf3 Nc6 Bb5".into(),
            existing: "Ruy Lopez".into(),
            rejected: "Ruy Lopez: Bird Variation".into(),
        }
    );
}

#[test]
fn registry_installs_once() {
    assert!(openings::global().is_none());
    let installed = openings::install(book()).unwrap();
    assert_eq!(installed.len(), 8);
    assert_eq!(openings::global().map(OpeningTrie::len), Some(8));
    assert_eq!(
        openings::install(OpeningTrie::new()).unwrap_err(),
        ChessError::RegistryInitialised
    );
}
