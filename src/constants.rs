//! Board geometry, search parameters and playback timings.
//!
//! Everything here is a compile-time default. The command line can override
//! the search depth, the time budget and the playback delay (see
//! [`SearchConfig`](crate::player::SearchConfig)).

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN). The game is always played on an 8x8 grid.
pub const N: usize = 8;

/// Number of cells on the board.
pub const CELLS: usize = N * N;

/// Compass directions as (row delta, column delta).
/// Order: NW, N, NE, W, E, SW, S, SE
pub const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

// =============================================================================
// Search Parameters
// =============================================================================

/// Depth used by the fixed-depth ("minimax") strategy.
pub const FIXED_DEPTH: u32 = 5;

/// Wall-clock budget of the iterative-deepening strategy.
pub const SEARCH_BUDGET: Duration = Duration::from_millis(5000);

// =============================================================================
// Playback
// =============================================================================

/// Pause between two flip groups when replaying a turn.
pub const FLIP_GROUP_DELAY: Duration = Duration::from_millis(150);

/// Pause after the last flip group before the next turn is shown.
pub const SETTLE_DELAY: Duration = Duration::from_millis(400);
