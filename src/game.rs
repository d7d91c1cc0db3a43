//! Turn sequencing: passes, termination and move validation.
//!
//! [`Game`] is the sole owner of the [`Board`]. Each [`step`](Game::step)
//! advances the game by one turn and reports what happened as a
//! [`TurnEvent`]; [`run`](Game::run) steps until the game is over.
//!
//! A player with no legal move passes. If the player receiving the turn
//! cannot move either, the game ends. A strategy answering with a move that
//! is not legal is a broken contract: the game halts with
//! [`GameError::InvalidMove`] and refuses to continue.

use std::fmt;

use log::{debug, info, warn};
use thiserror::Error;

use crate::board::{Board, Cell, FlipGroup, Move, Player};
use crate::input::MoveEvents;
use crate::player::{MoveContext, PlayerError, Strategy};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("{player} played an invalid move: {mv}")]
    InvalidMove { player: Player, mv: Move },
    #[error("{player} failed to choose a move")]
    Strategy {
        player: Player,
        #[source]
        source: PlayerError,
    },
    #[error("game was halted by an earlier error")]
    Halted,
}

/// A completed move, as needed to replay it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    pub player: Player,
    pub placed: Move,
    /// Flipped cells grouped by distance from `placed`.
    pub flips: FlipGroup,
}

impl TurnReport {
    /// Every cell the move changed, with its new value.
    pub fn changes(&self) -> impl Iterator<Item = (Move, Cell)> + '_ {
        let cell = self.player.cell();
        std::iter::once(self.placed)
            .chain(self.flips.iter().flatten().copied())
            .map(move |mv| (mv, cell))
    }

    /// Number of flipped pieces.
    pub fn flipped(&self) -> usize {
        self.flips.iter().map(Vec::len).sum()
    }
}

/// Final piece counts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub black: usize,
    pub white: usize,
}

impl Outcome {
    /// The player with more pieces, or `None` on a draw.
    pub fn winner(&self) -> Option<Player> {
        match self.black.cmp(&self.white) {
            std::cmp::Ordering::Greater => Some(Player::Black),
            std::cmp::Ordering::Less => Some(Player::White),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner() {
            Some(p) => write!(f, "{p} wins {}-{}", self.black.max(self.white), self.black.min(self.white)),
            None => write!(f, "draw {}-{}", self.black, self.white),
        }
    }
}

/// What a single step did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnEvent {
    Moved(TurnReport),
    /// `player` had no legal move; the turn went to the opponent.
    Pass { player: Player },
    GameOver(Outcome),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Setup,
    Playing,
    Over,
    Halted,
}

/// A game between two strategies.
pub struct Game {
    board: Board,
    black: Box<dyn Strategy>,
    white: Box<dyn Strategy>,
    events: MoveEvents,
    phase: Phase,
}

impl Game {
    pub fn new(black: Box<dyn Strategy>, white: Box<dyn Strategy>) -> Self {
        Self::with_board(Board::new(), black, white)
    }

    /// Start from an arbitrary position.
    pub fn with_board(board: Board, black: Box<dyn Strategy>, white: Box<dyn Strategy>) -> Self {
        Self {
            board,
            black,
            white,
            events: MoveEvents::new(),
            phase: Phase::Setup,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Handle for raising move attempts from a UI.
    pub fn events(&self) -> MoveEvents {
        self.events.clone()
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Over | Phase::Halted)
    }

    /// Toggle a hole. Only possible before the first step.
    pub fn toggle_hole(&mut self, mv: Move) -> bool {
        self.phase == Phase::Setup && self.board.toggle_hole(mv)
    }

    /// Back to the starting position, in setup phase.
    pub fn reset(&mut self) {
        self.board.reset();
        self.events.close_turn();
        self.phase = Phase::Setup;
    }

    fn outcome(&self) -> Outcome {
        let (black, white) = self.board.score();
        Outcome { black, white }
    }

    /// Play one turn.
    pub fn step(&mut self) -> Result<TurnEvent, GameError> {
        match self.phase {
            Phase::Halted => return Err(GameError::Halted),
            Phase::Over => return Ok(TurnEvent::GameOver(self.outcome())),
            Phase::Setup => self.phase = Phase::Playing,
            Phase::Playing => {}
        }

        let player = self.board.player();
        let legal = self.board.legal_moves();

        if legal.is_empty() {
            self.board.apply_move(None);
            if self.board.legal_moves().is_empty() {
                self.phase = Phase::Over;
                let outcome = self.outcome();
                info!("game over: {outcome}");
                return Ok(TurnEvent::GameOver(outcome));
            }
            info!("{player} passes");
            return Ok(TurnEvent::Pass { player });
        }

        let result = self.ask(player, &legal);
        let mv = match result {
            Ok(mv) if self.board.is_legal(mv) => mv,
            Ok(mv) => {
                self.phase = Phase::Halted;
                warn!("{player} played {mv}, which is not legal; game halted");
                return Err(GameError::InvalidMove { player, mv });
            }
            Err(source) => {
                self.phase = Phase::Halted;
                warn!("{player} failed to move ({source}); game halted");
                return Err(GameError::Strategy { player, source });
            }
        };

        let flips = self.board.apply_move(Some(mv));
        let report = TurnReport {
            player,
            placed: mv,
            flips,
        };
        info!("{player} plays {mv}, flipping {}", report.flipped());
        Ok(TurnEvent::Moved(report))
    }

    fn ask(&mut self, player: Player, legal: &[Move]) -> Result<Move, PlayerError> {
        let strategy = match player {
            Player::Black => &mut self.black,
            Player::White => &mut self.white,
        };
        debug!("asking {} ({}) for a move", player, strategy.name());

        self.events.open_turn(legal);
        let ctx = MoveContext {
            legal_moves: legal,
            board: self.board.grid(),
            mover: player,
            events: &self.events,
        };
        let result = strategy.choose_move(&ctx);
        self.events.close_turn();
        result
    }

    /// Play until the game ends, handing every event to `observer`.
    pub fn run(&mut self, mut observer: impl FnMut(&TurnEvent)) -> Result<Outcome, GameError> {
        loop {
            let event = self.step()?;
            observer(&event);
            if let TurnEvent::GameOver(outcome) = event {
                return Ok(outcome);
            }
        }
    }
}
