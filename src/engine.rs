//! Evaluator boundary and the bundled negamax evaluator.
//!
//! Search strategies never look inside an evaluator: they hand it a
//! [`Bitboard`] and a depth and get back a cell index. Anything implementing
//! [`Evaluator`] can be plugged in, including plain closures.
//!
//! [`Negamax`] is the evaluator shipped with the crate. It works directly on
//! bitmasks: move generation shifts the mover's pieces through runs of
//! opponent pieces in all 8 directions at once, with per-direction masks that
//! stop pieces wrapping around the board edge.

use std::cmp::Ordering as CmpOrdering;
use std::ops::BitOr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bitboard::Bitboard;

/// Shared flag used to ask a running evaluation to give up.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A move recommender.
///
/// `evaluate` returns the index (`row * 8 + col`) of the recommended cell,
/// or `None` when the mover has no move or the evaluation was cancelled.
/// Implementations should poll `cancel` and return early once it is raised;
/// whatever they return after that is discarded. Ignoring it is allowed, but
/// then a terminated worker thread stays busy until the evaluation ends.
///
/// Plain closures `Fn(Bitboard, u32) -> Option<u8>` are evaluators that
/// never see the token, so they always run to completion.
pub trait Evaluator: Send + Sync + 'static {
    fn evaluate(&self, board: Bitboard, depth: u32, cancel: &CancelToken) -> Option<u8>;
}

impl<F> Evaluator for F
where
    F: Fn(Bitboard, u32) -> Option<u8> + Send + Sync + 'static,
{
    fn evaluate(&self, board: Bitboard, depth: u32, _cancel: &CancelToken) -> Option<u8> {
        self(board, depth)
    }
}

// =============================================================================
// Bit-parallel board operations
// =============================================================================

/// Rotation amount and wrap-around mask for one direction.
type Direction = (u32, u64);

const FILL: [Direction; 8] = [
    (1, 0xfefe_fefe_fefe_fefe),      // west
    (7, 0x7f7f_7f7f_7f7f_7f00),      // north-east
    (8, 0xffff_ffff_ffff_ff00),      // north
    (9, 0xfefe_fefe_fefe_fe00),      // north-west
    (64 - 1, 0x7f7f_7f7f_7f7f_7f7f), // east
    (64 - 7, 0x00fe_fefe_fefe_fefe), // south-west
    (64 - 8, 0x00ff_ffff_ffff_ffff), // south
    (64 - 9, 0x007f_7f7f_7f7f_7f7f), // south-east
];

#[inline]
fn shift(dir: &Direction, bits: u64) -> u64 {
    bits.rotate_left(dir.0) & dir.1
}

/// Cells of `mask` reachable from `bits` by stepping through `mask` in `dir`.
#[inline]
fn fill(dir: &Direction, bits: u64, mask: u64) -> u64 {
    let mut run = shift(dir, bits) & mask;
    // a run is at most 6 cells long
    for _ in 0..5 {
        run |= shift(dir, run) & mask;
    }
    run
}

/// Iterator over the single-bit masks of a bitmask, most significant first.
pub struct Moves(pub u64);

impl Iterator for Moves {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.0 == 0 {
            return None;
        }
        let m = 1 << (63 - self.0.leading_zeros());
        self.0 ^= m;
        Some(m)
    }
}

impl Bitboard {
    /// Mask of legal moves for `own`.
    pub fn moves(&self) -> u64 {
        FILL.iter()
            .map(|dir| shift(dir, fill(dir, self.own, self.opponent)))
            .fold(0, BitOr::bitor)
            & self.empty()
    }

    /// Board after `own` plays the single-bit move `m`, seen from the
    /// opponent's side.
    pub fn play(&self, m: u64) -> Bitboard {
        let flipped = self.flipped(m);
        Bitboard {
            own: self.opponent ^ flipped,
            opponent: self.own ^ (flipped | m),
            blocked: self.blocked,
        }
    }

    /// The same position with the other side to move.
    pub fn pass(&self) -> Bitboard {
        Bitboard {
            own: self.opponent,
            opponent: self.own,
            blocked: self.blocked,
        }
    }

    /// `own` pieces next to at least one empty cell.
    pub fn frontier(&self) -> u64 {
        let empty = self.empty();
        FILL.iter()
            .map(|dir| shift(dir, empty))
            .fold(0, BitOr::bitor)
            & self.own
    }

    /// Cells that can never be flipped once taken: on every axis at least
    /// one neighbour is a hole or off the board.
    pub fn corners(&self) -> u64 {
        let open = !self.blocked;
        Moves(open)
            .filter(|&m| {
                (0..4).all(|i| {
                    shift(&FILL[i], m) & open == 0 || shift(&FILL[i + 4], m) & open == 0
                })
            })
            .fold(0, BitOr::bitor)
    }

    fn flipped(&self, m: u64) -> u64 {
        FILL.iter()
            .map(|dir| {
                let run = fill(dir, m, self.opponent);
                if shift(dir, run) & self.own == 0 { 0 } else { run }
            })
            .fold(0, BitOr::bitor)
    }
}

// =============================================================================
// Negamax
// =============================================================================

const INF: i32 = i32::MAX;

/// Fixed-depth negamax over mobility, frontier and stable-corner heuristics.
#[derive(Copy, Clone, Debug, Default)]
pub struct Negamax;

impl Negamax {
    /// Best move for `board.own` searched `depth` plies past the first move.
    pub fn best_move(board: Bitboard, depth: u32, cancel: &CancelToken) -> Option<u8> {
        let best = Moves(board.moves())
            .max_by_key(|&m| -Self::search(board.play(m), depth, cancel))
            .map(|m| m.leading_zeros() as u8);
        if cancel.is_cancelled() { None } else { best }
    }

    fn search(board: Bitboard, depth: u32, cancel: &CancelToken) -> i32 {
        if cancel.is_cancelled() {
            return 0;
        }

        let next = board.pass();
        let own = board.moves();
        let theirs = next.moves();

        if own | theirs == 0 {
            return match count(board.own).cmp(&count(board.opponent)) {
                CmpOrdering::Less => -INF,
                CmpOrdering::Equal => 0,
                CmpOrdering::Greater => INF,
            };
        }

        if depth == 0 {
            let corners = {
                let mask = board.corners();
                count(board.own & mask) - count(board.opponent & mask)
            };
            let mobility = count(own) - count(theirs);
            let frontier = count(next.frontier()) - count(board.frontier());
            return 16 * corners + 4 * mobility + frontier;
        }

        Moves(own)
            .map(|m| -Self::search(board.play(m), depth - 1, cancel))
            .max()
            .unwrap_or_else(|| -Self::search(next, depth, cancel))
    }
}

impl Evaluator for Negamax {
    fn evaluate(&self, board: Bitboard, depth: u32, cancel: &CancelToken) -> Option<u8> {
        Self::best_move(board, depth, cancel)
    }
}

#[inline]
fn count(mask: u64) -> i32 {
    mask.count_ones() as i32
}
