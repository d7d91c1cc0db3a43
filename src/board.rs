//! Board state, move legality and flip resolution.
//!
//! The board is a row-major array of 64 [`Cell`]s (index = `row * 8 + col`).
//! Besides the two players' pieces a cell can hold a *hole*: a cell that can
//! never be played on and that stops capture runs just like an empty cell.
//!
//! [`Board`] is the only owner of the grid and of the turn order. It is
//! mutated exclusively by [`Board::apply_move`] once a game is running;
//! [`Board::toggle_hole`] exists for the setup phase before the first move.

use std::fmt;

use crate::constants::{CELLS, DIRECTIONS, N};

/// One of the two sides. Black moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// The other side.
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// The cell value holding one of this player's pieces.
    pub fn cell(self) -> Cell {
        match self {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Black => write!(f, "Black"),
            Player::White => write!(f, "White"),
        }
    }
}

/// Content of a single board cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    /// Blocked cell: never playable, never flipped, ends capture runs.
    Hole,
    Black,
    White,
}

impl Cell {
    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Hole => '#',
            Cell::Black => 'X',
            Cell::White => 'O',
        }
    }

    fn from_symbol(c: char) -> Option<Cell> {
        match c {
            '.' => Some(Cell::Empty),
            '#' => Some(Cell::Hole),
            'X' => Some(Cell::Black),
            'O' => Some(Cell::White),
            _ => None,
        }
    }
}

/// A board coordinate. Both components are in `0..8` for any move produced
/// by this crate; [`Board::is_legal`] rejects anything else.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Flat row-major index of the cell.
    #[inline]
    pub fn index(self) -> usize {
        self.row * N + self.col
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", str_coord(*self))
    }
}

/// Flipped cells grouped by distance from the placed piece.
///
/// `groups[d]` holds every cell at distance `d + 1` across all capturing
/// directions, in direction order. The grouping only drives playback order;
/// the set of flipped cells is the same however it is grouped.
pub type FlipGroup = Vec<Vec<Move>>;

/// Snapshot of all 64 cells in row-major order.
pub type Grid = [Cell; CELLS];

/// The game state: grid plus whose turn it is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Grid,
    player: Player,
    opponent: Player,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// A board in the starting position.
    pub fn new() -> Self {
        let mut board = Board {
            cells: [Cell::Empty; CELLS],
            player: Player::Black,
            opponent: Player::White,
        };
        board.reset();
        board
    }

    /// Build a board from an arbitrary grid with `player` to move.
    pub fn from_grid(cells: Grid, player: Player) -> Self {
        Board {
            cells,
            player,
            opponent: player.opponent(),
        }
    }

    /// Reset to the starting position: four pieces in the centre, split
    /// diagonally, Black to move. Holes are cleared.
    pub fn reset(&mut self) {
        self.cells = [Cell::Empty; CELLS];
        self.set(Move::new(3, 4), Cell::Black);
        self.set(Move::new(4, 3), Cell::Black);
        self.set(Move::new(3, 3), Cell::White);
        self.set(Move::new(4, 4), Cell::White);

        self.player = Player::Black;
        self.opponent = Player::White;
    }

    /// The player to move.
    pub fn player(&self) -> Player {
        self.player
    }

    /// The player waiting for their turn.
    pub fn opponent(&self) -> Player {
        self.opponent
    }

    /// Copy of the grid.
    pub fn grid(&self) -> Grid {
        self.cells
    }

    /// Cell at `(row, col)`, or `None` when the coordinate is off the board.
    ///
    /// `None` never equals `Some(cell)`, so directional scans comparing
    /// against a player's cell stop at the edge without a separate check.
    #[inline]
    pub fn cell_at(&self, row: isize, col: isize) -> Option<Cell> {
        if (0..N as isize).contains(&row) && (0..N as isize).contains(&col) {
            Some(self.cells[row as usize * N + col as usize])
        } else {
            None
        }
    }

    fn set(&mut self, mv: Move, cell: Cell) {
        self.cells[mv.index()] = cell;
    }

    /// All legal moves for the player to move, in row-major order.
    pub fn legal_moves(&self) -> Vec<Move> {
        (0..N)
            .flat_map(|row| (0..N).map(move |col| Move::new(row, col)))
            .filter(|&mv| self.is_legal(mv))
            .collect()
    }

    /// A move is legal when its cell is empty and it flips at least one piece.
    pub fn is_legal(&self, mv: Move) -> bool {
        self.cell_at(mv.row as isize, mv.col as isize) == Some(Cell::Empty)
            && !self.flips_for(mv).is_empty()
    }

    /// Pieces the player to move would flip by playing `mv`.
    ///
    /// Each direction contributes the run of opponent pieces starting next to
    /// `mv`, provided the run is non-empty and ends on one of the mover's own
    /// pieces. Runs that end on an empty cell, a hole or the board edge are
    /// discarded.
    pub fn flips_for(&self, mv: Move) -> FlipGroup {
        let own = Some(self.player.cell());
        let theirs = Some(self.opponent.cell());
        let mut groups: FlipGroup = Vec::new();

        for (dr, dc) in DIRECTIONS {
            let mut run = Vec::new();
            let mut row = mv.row as isize + dr;
            let mut col = mv.col as isize + dc;

            while self.cell_at(row, col) == theirs {
                run.push(Move::new(row as usize, col as usize));
                row += dr;
                col += dc;
            }

            if run.is_empty() || self.cell_at(row, col) != own {
                continue;
            }

            for (distance, cell) in run.into_iter().enumerate() {
                if distance == groups.len() {
                    groups.push(Vec::new());
                }
                groups[distance].push(cell);
            }
        }

        groups
    }

    /// Play `mv` for the player to move (or pass with `None`) and hand the
    /// turn over.
    ///
    /// The turn always changes hands, also on a pass. Legality is the
    /// caller's responsibility; check [`is_legal`](Self::is_legal) first.
    /// Returns the flips that were applied (empty on a pass).
    pub fn apply_move(&mut self, mv: Option<Move>) -> FlipGroup {
        let mut flipped = FlipGroup::new();
        if let Some(mv) = mv {
            debug_assert!(mv.row < N && mv.col < N, "move {mv:?} is off the board");
            flipped = self.flips_for(mv);
            let own = self.player.cell();
            self.set(mv, own);
            for &cell in flipped.iter().flatten() {
                self.set(cell, own);
            }
        }
        std::mem::swap(&mut self.player, &mut self.opponent);
        flipped
    }

    /// Setup-phase toggle: Empty becomes Hole and Hole becomes Empty.
    /// Pieces and off-board coordinates are left alone.
    ///
    /// Returns `true` if the cell changed.
    pub fn toggle_hole(&mut self, mv: Move) -> bool {
        match self.cell_at(mv.row as isize, mv.col as isize) {
            Some(Cell::Empty) => self.set(mv, Cell::Hole),
            Some(Cell::Hole) => self.set(mv, Cell::Empty),
            _ => return false,
        }
        true
    }

    /// Number of pieces held by `player`.
    pub fn count(&self, player: Player) -> usize {
        let cell = player.cell();
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Piece counts as `(black, white)`.
    pub fn score(&self) -> (usize, usize) {
        (self.count(Player::Black), self.count(Player::White))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " ")?;
        for col in 0..N {
            write!(f, " {}", (b'a' + col as u8) as char)?;
        }
        writeln!(f)?;
        for row in 0..N {
            write!(f, "{}", row + 1)?;
            for col in 0..N {
                write!(f, " {}", self.cells[row * N + col].symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse a grid drawn with `.` (empty), `#` (hole), `X` (black) and `O`
/// (white). Whitespace is ignored; any other character or a cell count
/// other than 64 yields `None`.
pub fn parse_grid(s: &str) -> Option<Grid> {
    let mut cells = [Cell::Empty; CELLS];
    let mut n = 0;
    for c in s.chars().filter(|c| !c.is_whitespace()) {
        if n == CELLS {
            return None;
        }
        cells[n] = Cell::from_symbol(c)?;
        n += 1;
    }
    (n == CELLS).then_some(cells)
}

/// Parse a coordinate such as `"d3"`: column letter `a`-`h`, then row `1`-`8`.
///
/// Returns `None` for malformed or off-board input.
pub fn parse_coord(s: &str) -> Option<Move> {
    let bytes = s.trim().as_bytes();
    if bytes.len() != 2 {
        return None;
    }

    let col = bytes[0].to_ascii_lowercase().checked_sub(b'a')? as usize;
    let row = bytes[1].checked_sub(b'1')? as usize;

    (row < N && col < N).then_some(Move::new(row, col))
}

/// Convert a move to its text coordinate (e.g. `"d3"`).
pub fn str_coord(mv: Move) -> String {
    format!("{}{}", (b'a' + mv.col as u8) as char, mv.row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_pattern() {
        let board = Board::new();
        let occupied: Vec<(usize, Cell)> = board
            .grid()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != Cell::Empty)
            .map(|(i, c)| (i, *c))
            .collect();

        assert_eq!(
            occupied,
            vec![
                (27, Cell::White),
                (28, Cell::Black),
                (35, Cell::Black),
                (36, Cell::White),
            ]
        );
        assert_eq!(board.player(), Player::Black);
        assert_eq!(board.opponent(), Player::White);
    }

    #[test]
    fn test_cell_at_out_of_range() {
        let board = Board::new();
        assert_eq!(board.cell_at(-1, 0), None);
        assert_eq!(board.cell_at(0, 8), None);
        assert_eq!(board.cell_at(8, 8), None);
        assert_eq!(board.cell_at(0, 0), Some(Cell::Empty));
        assert_ne!(board.cell_at(-1, -1), Some(Cell::Empty));
    }

    #[test]
    fn test_opening_moves() {
        let board = Board::new();
        assert_eq!(
            board.legal_moves(),
            vec![
                Move::new(2, 3),
                Move::new(3, 2),
                Move::new(4, 5),
                Move::new(5, 4),
            ]
        );
    }

    #[test]
    fn test_flip_groups_ordered_by_distance() {
        // Black plays c6: three white pieces north ending on black,
        // one white piece east ending on black.
        let grid = parse_grid(
            ". . . . . . . .
             . . X . . . . .
             . . O . . . . .
             . . O . . . . .
             . . O . . . . .
             . . . O X . . .
             . . . . . . . .
             . . . . . . . .",
        )
        .unwrap();
        let board = Board::from_grid(grid, Player::Black);

        let flips = board.flips_for(Move::new(5, 2));
        assert_eq!(
            flips,
            vec![
                vec![Move::new(4, 2), Move::new(5, 3)],
                vec![Move::new(3, 2)],
                vec![Move::new(2, 2)],
            ]
        );
    }

    #[test]
    fn test_hole_blocks_capture() {
        let grid = parse_grid(
            ". . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . O # X . . . .
             . . . . . . . .
             . O . X . . . .
             . . . . . . . .
             . . . . . . . .",
        )
        .unwrap();
        let board = Board::from_grid(grid, Player::Black);

        // The run east of a4 ends on a hole, the one east of a6 on an empty cell.
        assert!(board.flips_for(Move::new(3, 0)).is_empty());
        assert!(!board.is_legal(Move::new(3, 0)));
        assert!(board.flips_for(Move::new(5, 0)).is_empty());
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn test_edge_does_not_capture() {
        let grid = parse_grid(
            "O O O . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . X",
        )
        .unwrap();
        let board = Board::from_grid(grid, Player::Black);
        assert!(board.flips_for(Move::new(0, 3)).is_empty());
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn test_apply_move_flips_and_swaps() {
        let mut board = Board::new();
        let flips = board.apply_move(Some(Move::new(2, 3)));

        assert_eq!(flips, vec![vec![Move::new(3, 3)]]);
        assert_eq!(board.cell_at(2, 3), Some(Cell::Black));
        assert_eq!(board.cell_at(3, 3), Some(Cell::Black));
        assert_eq!(board.score(), (4, 1));
        assert_eq!(board.player(), Player::White);
    }

    #[test]
    fn test_pass_swaps_without_mutation() {
        let mut board = Board::new();
        let before = board.grid();
        let flips = board.apply_move(None);

        assert!(flips.is_empty());
        assert_eq!(board.grid(), before);
        assert_eq!(board.player(), Player::White);
        assert_eq!(board.opponent(), Player::Black);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "off the board")]
    fn test_apply_move_off_board_panics() {
        let mut board = Board::new();
        board.apply_move(Some(Move::new(8, 0)));
    }

    #[test]
    fn test_toggle_hole() {
        let mut board = Board::new();
        assert!(board.toggle_hole(Move::new(0, 0)));
        assert_eq!(board.cell_at(0, 0), Some(Cell::Hole));
        assert!(board.toggle_hole(Move::new(0, 0)));
        assert_eq!(board.cell_at(0, 0), Some(Cell::Empty));

        // Pieces and off-board cells are not toggled.
        assert!(!board.toggle_hole(Move::new(3, 3)));
        assert!(!board.toggle_hole(Move::new(9, 0)));
    }

    #[test]
    fn test_hole_cell_is_not_legal() {
        let mut board = Board::new();
        board.toggle_hole(Move::new(2, 3));
        assert!(!board.is_legal(Move::new(2, 3)));
        assert_eq!(board.legal_moves().len(), 3);
    }

    #[test]
    fn test_parse_str_coord_roundtrip() {
        for row in 0..N {
            for col in 0..N {
                let mv = Move::new(row, col);
                assert_eq!(parse_coord(&str_coord(mv)), Some(mv));
            }
        }
        assert_eq!(parse_coord("d3"), Some(Move::new(2, 3)));
        assert_eq!(parse_coord("D3"), Some(Move::new(2, 3)));
        assert_eq!(parse_coord("i1"), None);
        assert_eq!(parse_coord("a9"), None);
        assert_eq!(parse_coord("a0"), None);
        assert_eq!(parse_coord("pass"), None);
    }

    #[test]
    fn test_parse_grid_rejects_bad_input() {
        assert!(parse_grid("...").is_none());
        assert!(parse_grid(&"Z".repeat(64)).is_none());
        assert!(parse_grid(&".".repeat(65)).is_none());
        assert!(parse_grid(&".".repeat(64)).is_some());
    }

    #[test]
    fn test_display() {
        let s = Board::new().to_string();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "  a b c d e f g h");
        assert_eq!(lines[4], "4 . . . O X . . .");
        assert_eq!(lines[5], "5 . . . X O . . .");
    }
}
