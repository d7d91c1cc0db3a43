//! Reversi-Holes: Reversi on an 8x8 board with blockable cells.
//!
//! Before a game starts any empty cell can be turned into a *hole*, which
//! can never be played and stops captures. Players are interchangeable
//! strategies: a human feeding moves through an input gate, a random
//! mover, and two searchers that delegate to an evaluator running on a
//! separate worker thread.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, search defaults, playback timings
//! - [`board`] - Board state, legality and flip resolution
//! - [`bitboard`] - Bitmask encoding exchanged with evaluators
//! - [`engine`] - Evaluator trait and the bundled negamax evaluator
//! - [`worker`] - Evaluator thread with request/response calls
//! - [`input`] - Move-attempt events and the turn input gate
//! - [`player`] - Player strategies
//! - [`game`] - Turn sequencing, passes and termination
//!
//! ## Example
//!
//! ```
//! use reversi_holes::board::Move;
//! use reversi_holes::game::Game;
//! use reversi_holes::player::RandomPlayer;
//!
//! let mut game = Game::new(
//!     Box::new(RandomPlayer::with_seed(1)),
//!     Box::new(RandomPlayer::with_seed(2)),
//! );
//! game.toggle_hole(Move::new(0, 0));
//!
//! let outcome = game.run(|_| {}).unwrap();
//! println!("{outcome}");
//! ```

pub mod bitboard;
pub mod board;
pub mod constants;
pub mod engine;
pub mod game;
pub mod input;
pub mod player;
pub mod worker;
