use std::error::Error;
use std::process::ExitCode;

use chess_rules::ai::{MoveChooser, RandomMover};
use chess_rules::config::RulesConfig;
use chess_rules::engine::{Game, move_to_san};
use chess_rules::openings::{self, load_opening_file};

const USAGE: &str = "usage:
  chess-rules fen \"<FEN>\"      show the board, status and legal moves
  chess-rules pgn <file>        replay a PGN file
  chess-rules selfplay [plies]  random self-play, printed as PGN";

const DEFAULT_SELFPLAY_PLIES: usize = 200;

fn main() -> ExitCode {
    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_rules=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RulesConfig::from_env();
    if let Some(path) = &config.openings_path {
        if let Err(e) = load_opening_file(path).and_then(openings::install) {
            tracing::error!("failed to load openings from {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("fen") => match args.get(1) {
            Some(fen) => show_fen(fen, &config),
            None => Err("fen: missing FEN argument".into()),
        },
        Some("pgn") => match args.get(1) {
            Some(path) => replay_pgn(path, &config),
            None => Err("pgn: missing file argument".into()),
        },
        Some("selfplay") => match args.get(1).map(|n| n.parse::<usize>()) {
            None => self_play(DEFAULT_SELFPLAY_PLIES, &config),
            Some(Ok(plies)) => self_play(plies, &config),
            Some(Err(e)) => Err(format!("selfplay: bad ply count: {e}").into()),
        },
        Some("-h" | "--help" | "help") => {
            println!("{USAGE}");
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn show_fen(fen: &str, config: &RulesConfig) -> Result<(), Box<dyn Error>> {
    let game = Game::from_fen(fen)?.with_config(config.clone());
    let pos = game.position();
    let mut sans: Vec<String> = game
        .legal_moves()
        .into_iter()
        .map(|mv| move_to_san(pos, mv))
        .collect();
    sans.sort();

    println!("{pos}");
    println!("Side to move: {}", game.side_to_move());
    println!("Status: {}", game.status());
    println!("Legal moves ({}): {}", sans.len(), sans.join(" "));
    Ok(())
}

fn replay_pgn(path: &str, config: &RulesConfig) -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let game = Game::from_pgn_with_config(&text, config.clone())?;

    println!("FEN: {}", game.to_fen());
    println!("Moves: {}", game.history().len());
    println!("Status: {}", game.status());
    println!("Result: {}", game.result_token());
    let opening = openings::global().and_then(|book| book.lookup(&game.san_history()));
    match opening {
        Some(opening) => println!("Opening: {opening}"),
        None => println!("Opening: unknown"),
    }
    Ok(())
}

fn self_play(plies: usize, config: &RulesConfig) -> Result<(), Box<dyn Error>> {
    let mover = RandomMover::new();
    let mut game = Game::new().with_config(config.clone());
    game.tags.event = "Self-play".into();
    game.tags.white = mover.name().into();
    game.tags.black = mover.name().into();

    while !game.is_game_over() && game.history().len() < plies {
        game.play_collaborator_move(&mover, config.ai_strength)?;
    }
    tracing::info!(plies = game.history().len(), status = %game.status(), "self-play finished");
    print!("{}", game.to_pgn());
    Ok(())
}
