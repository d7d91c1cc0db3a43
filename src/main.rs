//! Reversi-Holes in the terminal.
//!
//! ## Usage
//!
//! - `reversi-holes` - Watch a random player against the iterative searcher
//! - `reversi-holes play --black human --white iterative` - Play a game
//! - `reversi-holes moves --holes c4,f5` - Show the opening moves for a layout
//!
//! Human moves are typed on stdin as coordinates such as `d3`. Set
//! `RUST_LOG` or pass `-v` for search progress.

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use reversi_holes::board::{Board, Move, Player, parse_coord, str_coord};
use reversi_holes::constants::{FIXED_DEPTH, FLIP_GROUP_DELAY, SEARCH_BUDGET, SETTLE_DELAY};
use reversi_holes::game::{Game, TurnEvent};
use reversi_holes::input::{Dispatch, MoveEvents};
use reversi_holes::player::{PlayerKind, SearchConfig};

/// Reversi-Holes: Reversi with blockable cells
#[derive(Parser)]
#[command(name = "reversi-holes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game in the terminal
    Play(PlayArgs),
    /// Print the board and the opening moves for a hole layout
    Moves {
        /// Cells to turn into holes, e.g. `c4,f5`
        #[arg(long, value_delimiter = ',', value_parser = parse_hole)]
        holes: Vec<Move>,
    },
    /// Watch a random player against the iterative searcher
    Demo,
}

#[derive(Args)]
struct PlayArgs {
    /// Strategy for Black (human, random, minimax, iterative)
    #[arg(long, default_value = "human")]
    black: PlayerKind,

    /// Strategy for White (human, random, minimax, iterative)
    #[arg(long, default_value = "iterative")]
    white: PlayerKind,

    /// Cells to turn into holes before the game, e.g. `c4,f5`
    #[arg(long, value_delimiter = ',', value_parser = parse_hole)]
    holes: Vec<Move>,

    /// Search depth of the minimax player
    #[arg(long, default_value_t = FIXED_DEPTH)]
    depth: u32,

    /// Time budget of the iterative player, in milliseconds
    #[arg(long, default_value_t = SEARCH_BUDGET.as_millis() as u64)]
    budget_ms: u64,

    /// Seed for the random player
    #[arg(long)]
    seed: Option<u64>,

    /// Replay flips group by group with short pauses
    #[arg(long)]
    delay: bool,
}

fn parse_hole(s: &str) -> Result<Move, String> {
    parse_coord(s).ok_or_else(|| format!("'{s}' is not a board coordinate (a1-h8)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Some(Commands::Play(args)) => play(&args),
        Some(Commands::Moves { holes }) => {
            show_moves(&holes);
            Ok(())
        }
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn show_moves(holes: &[Move]) {
    let mut board = Board::new();
    for &mv in holes {
        board.toggle_hole(mv);
    }
    println!("{board}");
    println!("{} to move: {}", board.player(), format_moves(&board.legal_moves()));
}

fn play(args: &PlayArgs) -> Result<()> {
    let config = SearchConfig {
        fixed_depth: args.depth,
        budget: Duration::from_millis(args.budget_ms),
        seed: args.seed,
    };
    let mut game = Game::new(args.black.build(&config), args.white.build(&config));
    for &mv in &args.holes {
        if !game.toggle_hole(mv) {
            anyhow::bail!("cannot put a hole on {mv}");
        }
    }

    let humans = [args.black, args.white].contains(&PlayerKind::Human);
    if humans {
        spawn_input(game.events());
    }

    let kinds = |player: Player| match player {
        Player::Black => args.black,
        Player::White => args.white,
    };

    println!("{}", game.board());
    loop {
        let board = game.board();
        if kinds(board.player()) == PlayerKind::Human && !board.legal_moves().is_empty() {
            println!(
                "{}'s turn. Legal moves: {}",
                board.player(),
                format_moves(&board.legal_moves())
            );
        }

        let event = game.step().context("game aborted")?;
        render(&event, game.board(), args.delay);
        if let TurnEvent::GameOver(_) = event {
            return Ok(());
        }
    }
}

fn run_demo() -> Result<()> {
    println!("Reversi-Holes: random (Black) vs iterative (White)\n");
    let config = SearchConfig {
        budget: Duration::from_millis(500),
        ..SearchConfig::default()
    };
    let mut game = Game::new(
        PlayerKind::Random.build(&config),
        PlayerKind::Iterative.build(&config),
    );
    game.toggle_hole(Move::new(2, 2));
    game.toggle_hole(Move::new(5, 5));

    println!("{}", game.board());
    let outcome = game.run(|event| {
        if let TurnEvent::Moved(report) = event {
            println!("{} plays {}", report.player, report.placed);
        }
    })?;
    println!("\n{}", game.board());
    println!("{outcome}");
    Ok(())
}

/// Forward stdin lines to the game as move attempts.
fn spawn_input(events: MoveEvents) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_coord(line) {
                Some(mv) => match events.dispatch(mv) {
                    Dispatch::Forwarded => {}
                    Dispatch::Cancelled => println!("{mv} is not a legal move"),
                    Dispatch::Unheard => println!("not your turn"),
                },
                None => println!("expected a coordinate like d3"),
            }
        }
        events.close();
    });
}

fn render(event: &TurnEvent, board: &Board, delay: bool) {
    match event {
        TurnEvent::Moved(report) => {
            println!("{} plays {}", report.player, report.placed);
            for (distance, group) in report.flips.iter().enumerate() {
                println!("  flip {}: {}", distance + 1, format_moves(group));
                if delay {
                    thread::sleep(FLIP_GROUP_DELAY);
                }
            }
            if delay {
                thread::sleep(SETTLE_DELAY);
            }
            println!("{board}");
        }
        TurnEvent::Pass { player } => {
            println!("{player} has no moves. Turn skipped, {}'s turn", player.opponent());
        }
        TurnEvent::GameOver(outcome) => println!("Game over! {outcome}"),
    }
}

fn format_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .map(|&mv| str_coord(mv))
        .collect::<Vec<_>>()
        .join(" ")
}
