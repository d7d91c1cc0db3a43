//! Compact bitmask encoding of a grid, as exchanged with an evaluator.
//!
//! Cell index `i = row * 8 + col` lives at bit `63 - i`: the grid is scanned
//! in row-major order and each cell is shifted in from the right, so a1 ends
//! up in the most significant bit. An evaluator names its chosen cell by that
//! same index, i.e. the number of leading zeros of the single-bit mask.

use crate::board::{Cell, Grid, Move, Player};
use crate::constants::{CELLS, N};

/// Occupancy masks from the point of view of one player.
///
/// The three masks are pairwise disjoint; a bit set in none of them is an
/// empty cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bitboard {
    pub own: u64,
    pub opponent: u64,
    pub blocked: u64,
}

impl Bitboard {
    /// Mask of empty cells.
    #[inline]
    pub fn empty(&self) -> u64 {
        !(self.own | self.opponent | self.blocked)
    }

    /// Number of empty cells.
    #[inline]
    pub fn empty_count(&self) -> u32 {
        self.empty().count_ones()
    }
}

/// Single-bit mask for a cell index.
#[inline]
pub fn bit(index: usize) -> u64 {
    1 << (CELLS - 1 - index)
}

/// Encode `grid` from the point of view of `own`.
pub fn encode(grid: &Grid, own: Player) -> Bitboard {
    let own = own.cell();
    grid.iter().fold(Bitboard::default(), |acc, &cell| {
        let mut next = Bitboard {
            own: acc.own << 1,
            opponent: acc.opponent << 1,
            blocked: acc.blocked << 1,
        };
        match cell {
            Cell::Empty => {}
            Cell::Hole => next.blocked |= 1,
            c if c == own => next.own |= 1,
            _ => next.opponent |= 1,
        }
        next
    })
}

/// Decode an evaluator's cell index. Returns `None` for indices past 63.
pub fn decode(index: u8) -> Option<Move> {
    let index = index as usize;
    (index < CELLS).then(|| Move::new(index / N, index % N))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, parse_grid};

    #[test]
    fn test_encode_start_position() {
        let board = Board::new();
        let bb = encode(&board.grid(), Player::Black);

        assert_eq!(bb.own, bit(28) | bit(35));
        assert_eq!(bb.opponent, bit(27) | bit(36));
        assert_eq!(bb.blocked, 0);
        assert_eq!(bb.empty_count(), 60);

        // Same grid from the other side swaps the piece masks.
        let other = encode(&board.grid(), Player::White);
        assert_eq!(other.own, bb.opponent);
        assert_eq!(other.opponent, bb.own);
    }

    #[test]
    fn test_encode_msb_first() {
        let grid = parse_grid(
            "X . . . . . . #
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             # . . . . . . O",
        )
        .unwrap();
        let bb = encode(&grid, Player::Black);

        assert_eq!(bb.own, 0x8000_0000_0000_0000);
        assert_eq!(bb.opponent, 0x0000_0000_0000_0001);
        assert_eq!(bb.blocked, 0x0100_0000_0000_0080);
        assert_eq!(bb.own & bb.opponent, 0);
        assert_eq!(bb.own & bb.blocked, 0);
        assert_eq!(bb.empty_count(), 60);
    }

    #[test]
    fn test_decode_roundtrip() {
        for row in 0..N {
            for col in 0..N {
                let mv = Move::new(row, col);
                let index = mv.index();
                assert_eq!(decode(index as u8), Some(mv));
                // The set bit of a lone piece decodes back to its cell.
                assert_eq!(decode(bit(index).leading_zeros() as u8), Some(mv));
            }
        }
    }

    #[test]
    fn test_decode_out_of_range() {
        assert_eq!(decode(64), None);
        assert_eq!(decode(u8::MAX), None);
    }
}
