//! Player strategies.
//!
//! Every kind of player implements [`Strategy`]: it is handed a
//! [`MoveContext`] and answers with one of the legal moves. The game loop
//! does not know or care which kind it is talking to.
//!
//! - [`HumanPlayer`] waits for one move event from the UI.
//! - [`RandomPlayer`] picks uniformly among the legal moves.
//! - [`FixedDepthPlayer`] asks the evaluator once at a fixed depth.
//! - [`IterativePlayer`] deepens one ply at a time until it runs out of
//!   depths or out of time, and keeps the deepest completed answer.
//!
//! Both search players run the evaluator on their own [`SearchWorker`],
//! created for the call and terminated before the call returns.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use thiserror::Error;

use crate::bitboard::{Bitboard, encode};
use crate::board::{Grid, Move, Player};
use crate::constants::{FIXED_DEPTH, SEARCH_BUDGET};
use crate::engine::{Evaluator, Negamax};
use crate::input::MoveEvents;
use crate::worker::{SearchWorker, WorkerError};

/// Everything a strategy gets to see when it is its turn.
pub struct MoveContext<'a> {
    /// Legal moves in row-major order. Never empty.
    pub legal_moves: &'a [Move],
    /// Snapshot of the grid.
    pub board: Grid,
    /// The player to move.
    pub mover: Player,
    /// Move attempts raised by the UI.
    pub events: &'a MoveEvents,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error("evaluator suggested {0}, which is not a legal move")]
    IllegalSuggestion(Move),
    #[error("input closed before a move was made")]
    InputClosed,
    #[error("no legal moves to choose from")]
    NoLegalMoves,
    #[error("no search depth finished within {0:?}")]
    NoCompletedDepth(Duration),
}

/// A way of choosing moves.
pub trait Strategy: Send {
    /// Short name, as accepted by [`PlayerKind::from_str`].
    fn name(&self) -> &str;

    /// Pick a move from `ctx.legal_moves`.
    fn choose_move(&mut self, ctx: &MoveContext<'_>) -> Result<Move, PlayerError>;
}

/// Tunables for the search strategies.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Depth used by [`FixedDepthPlayer`].
    pub fixed_depth: u32,
    /// Time budget of [`IterativePlayer`].
    pub budget: Duration,
    /// Seed for [`RandomPlayer`]; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fixed_depth: FIXED_DEPTH,
            budget: SEARCH_BUDGET,
            seed: None,
        }
    }
}

// =============================================================================
// Player kinds
// =============================================================================

/// The selectable kinds of player.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerKind {
    Human,
    Random,
    Minimax,
    Iterative,
}

impl PlayerKind {
    pub const ALL: [PlayerKind; 4] = [
        PlayerKind::Human,
        PlayerKind::Random,
        PlayerKind::Minimax,
        PlayerKind::Iterative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerKind::Human => "human",
            PlayerKind::Random => "random",
            PlayerKind::Minimax => "minimax",
            PlayerKind::Iterative => "iterative",
        }
    }

    /// Build a strategy of this kind. Search kinds use the bundled
    /// [`Negamax`] evaluator.
    pub fn build(self, config: &SearchConfig) -> Box<dyn Strategy> {
        let evaluator: Arc<dyn Evaluator> = Arc::new(Negamax);
        match self {
            PlayerKind::Human => Box::new(HumanPlayer),
            PlayerKind::Random => Box::new(match config.seed {
                Some(seed) => RandomPlayer::with_seed(seed),
                None => RandomPlayer::new(),
            }),
            PlayerKind::Minimax => Box::new(FixedDepthPlayer::new(evaluator, config.fixed_depth)),
            PlayerKind::Iterative => Box::new(IterativePlayer::new(evaluator, config.budget)),
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlayerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = PlayerKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown player '{s}', expected one of: {}", names.join(", "))
            })
    }
}

// =============================================================================
// Human and random
// =============================================================================

/// Waits for a single move event from the UI.
///
/// The game loop opens the input gate before asking, so only legal moves
/// reach the listener.
pub struct HumanPlayer;

impl Strategy for HumanPlayer {
    fn name(&self) -> &str {
        "human"
    }

    fn choose_move(&mut self, ctx: &MoveContext<'_>) -> Result<Move, PlayerError> {
        ctx.events.once().recv().map_err(|_| PlayerError::InputClosed)
    }
}

/// Picks one of the legal moves uniformly at random.
pub struct RandomPlayer {
    rng: fastrand::Rng,
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Strategy for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_move(&mut self, ctx: &MoveContext<'_>) -> Result<Move, PlayerError> {
        if ctx.legal_moves.is_empty() {
            return Err(PlayerError::NoLegalMoves);
        }
        Ok(ctx.legal_moves[self.rng.usize(..ctx.legal_moves.len())])
    }
}

// =============================================================================
// Search players
// =============================================================================

fn ensure_legal(mv: Move, legal: &[Move]) -> Result<Move, PlayerError> {
    if legal.contains(&mv) {
        Ok(mv)
    } else {
        Err(PlayerError::IllegalSuggestion(mv))
    }
}

/// One evaluator call at a fixed depth.
///
/// There is no time limit: a hung evaluator stalls this player.
pub struct FixedDepthPlayer {
    evaluator: Arc<dyn Evaluator>,
    depth: u32,
}

impl FixedDepthPlayer {
    pub fn new(evaluator: Arc<dyn Evaluator>, depth: u32) -> Self {
        Self { evaluator, depth }
    }
}

impl Strategy for FixedDepthPlayer {
    fn name(&self) -> &str {
        "minimax"
    }

    fn choose_move(&mut self, ctx: &MoveContext<'_>) -> Result<Move, PlayerError> {
        let board = encode(&ctx.board, ctx.mover);

        let mut worker = SearchWorker::spawn(Arc::clone(&self.evaluator))?;
        let result = worker.call(board, self.depth);
        worker.terminate();

        let mv = result?;
        debug!("{} depth {}: {mv}", ctx.mover, self.depth);
        ensure_legal(mv, ctx.legal_moves)
    }
}

/// Result of one iterative-deepening search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Answer of the deepest search that completed in time.
    pub best: Option<Move>,
    /// Depth that produced `best`.
    pub depth: Option<u32>,
    /// Whether the budget ran out before all depths were searched.
    pub timed_out: bool,
}

/// Iterative deepening under a wall-clock budget.
///
/// Searches depth 0, 1, 2, ... up to one less than the number of empty
/// cells, one request at a time, racing the whole sequence against the
/// budget. Whichever finishes first ends the search; the worker is then
/// terminated, which also abandons a request still in flight.
pub struct IterativePlayer {
    evaluator: Arc<dyn Evaluator>,
    budget: Duration,
}

impl IterativePlayer {
    pub fn new(evaluator: Arc<dyn Evaluator>, budget: Duration) -> Self {
        Self { evaluator, budget }
    }

    /// Run the search for `board` and report what it reached.
    pub fn search(&self, board: Bitboard) -> Result<SearchOutcome, WorkerError> {
        let deadline = Instant::now() + self.budget;
        let mut outcome = SearchOutcome {
            best: None,
            depth: None,
            timed_out: false,
        };

        let mut worker = SearchWorker::spawn(Arc::clone(&self.evaluator))?;
        let result = deepen(&mut worker, board, deadline, &mut outcome);
        worker.terminate();
        result?;

        Ok(outcome)
    }
}

fn deepen(
    worker: &mut SearchWorker,
    board: Bitboard,
    deadline: Instant,
    outcome: &mut SearchOutcome,
) -> Result<(), WorkerError> {
    for depth in 0..board.empty_count() {
        match worker.call_until(board, depth, deadline)? {
            Some(mv) => {
                debug!("depth {depth}: {mv}");
                outcome.best = Some(mv);
                outcome.depth = Some(depth);
            }
            None => {
                outcome.timed_out = true;
                break;
            }
        }
    }
    Ok(())
}

impl Strategy for IterativePlayer {
    fn name(&self) -> &str {
        "iterative"
    }

    fn choose_move(&mut self, ctx: &MoveContext<'_>) -> Result<Move, PlayerError> {
        let outcome = self.search(encode(&ctx.board, ctx.mover))?;
        debug!(
            "{} searched to depth {:?} (timed out: {})",
            ctx.mover, outcome.depth, outcome.timed_out
        );

        let mv = outcome.best.ok_or(PlayerError::NoCompletedDepth(self.budget))?;
        ensure_legal(mv, ctx.legal_moves)
    }
}
