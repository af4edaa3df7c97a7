// Board state for one noughts-and-crosses round.
//
// Slot layout, row-major:
//   0 | 1 | 2
//   3 | 4 | 5
//   6 | 7 | 8
//
// `Board` is pure state: the cells, the turn cursor, and a winner memo.
// It performs no gameplay validation — slot bounds and occupancy are the
// coordinator's responsibility. What it does enforce is calling
// discipline: mutating or reading an outcome after the round concluded,
// or before any turn mark was set, is a `GuardError`. The coordinator
// validates before calling, so a guard failure there is a programming
// error, not a player-visible outcome.

use std::fmt;

use noughts_protocol::Mark;

/// Number of addressable board cells.
pub const SLOT_COUNT: usize = 9;

/// The 8 possibly-winning triples, scanned in this fixed order:
/// rows, then columns, then diagonals.
const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Calling-discipline violation on a guarded board operation.
///
/// These never reach players: the coordinator's validation pipeline rules
/// them out before touching the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardError {
    /// A winner is already recorded.
    Concluded(Mark),
    /// No turn mark has ever been set.
    NoActivePlayer,
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::Concluded(mark) => {
                write!(f, "round already concluded, winner: {}", mark.symbol())
            }
            GuardError::NoActivePlayer => write!(f, "no turn mark has been set"),
        }
    }
}

/// Three-way verdict from outcome detection.
///
/// `Draw` (board full, no line) is distinct from `Undecided` (at least one
/// empty cell remains) — callers rely on telling the two apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Winner(Mark),
    Draw,
    Undecided,
}

#[derive(Debug, Default)]
pub struct Board {
    cells: [Option<Mark>; SLOT_COUNT],
    turn: Option<Mark>,
    winner: Option<Mark>,
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    /// Clear all cells, the turn cursor, and the winner memo.
    pub fn reset(&mut self) {
        *self = Board::default();
    }

    /// Record which mark moves next. Always succeeds.
    pub fn set_turn(&mut self, mark: Mark) {
        self.turn = Some(mark);
    }

    /// The mark whose move is currently legal, once one has been set.
    pub fn turn(&self) -> Option<Mark> {
        self.turn
    }

    /// The memoized winner, once a complete line has been detected.
    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    /// The mark occupying `slot`, if any.
    pub fn cell(&self, slot: usize) -> Option<Mark> {
        self.cells[slot]
    }

    /// Whether `slot` already holds a mark.
    pub fn is_occupied(&self, slot: usize) -> bool {
        self.cells[slot].is_some()
    }

    /// Whether any cell holds a mark.
    pub fn has_any_move(&self) -> bool {
        self.cells.iter().any(Option::is_some)
    }

    /// Write the current turn mark into `slot`.
    ///
    /// No bounds or occupancy check — the caller validates those. Only the
    /// named cell is mutated.
    pub fn apply_move(&mut self, slot: usize) -> Result<(), GuardError> {
        self.guard()?;
        self.cells[slot] = self.turn;
        Ok(())
    }

    /// Scan the 8 winning lines in fixed order.
    ///
    /// The first complete line decides the round: its mark is memoized as
    /// the winner and returned. With no complete line, a full board is a
    /// `Draw` and anything else is `Undecided`.
    pub fn detect_outcome(&mut self) -> Result<Verdict, GuardError> {
        self.guard()?;
        for [a, b, c] in WINNING_LINES {
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    self.winner = Some(mark);
                    return Ok(Verdict::Winner(mark));
                }
            }
        }
        if self.cells.iter().all(Option::is_some) {
            return Ok(Verdict::Draw);
        }
        Ok(Verdict::Undecided)
    }

    /// Precondition shared by every state-mutating or outcome-reading call.
    fn guard(&self) -> Result<(), GuardError> {
        if let Some(mark) = self.winner {
            return Err(GuardError::Concluded(mark));
        }
        if self.turn.is_none() {
            return Err(GuardError::NoActivePlayer);
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    /// Render the 3x3 grid, `-` for empty cells.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            let symbol = cell.map_or('-', Mark::symbol);
            if i % 3 == 2 {
                writeln!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol} | ")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Play `slots` for `mark` without touching the other mark's cells.
    fn play(board: &mut Board, mark: Mark, slots: &[usize]) {
        for &slot in slots {
            board.set_turn(mark);
            board.apply_move(slot).unwrap();
        }
    }

    #[test]
    fn new_board_is_empty_with_no_turn() {
        let board = Board::new();
        assert!(!board.has_any_move());
        assert_eq!(board.turn(), None);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn guarded_ops_require_a_turn_mark() {
        let mut board = Board::new();
        assert_eq!(board.apply_move(0), Err(GuardError::NoActivePlayer));
        assert_eq!(board.detect_outcome(), Err(GuardError::NoActivePlayer));
    }

    #[test]
    fn apply_move_writes_the_current_turn_mark() {
        let mut board = Board::new();
        board.set_turn(Mark::Cross);
        board.apply_move(4).unwrap();
        assert_eq!(board.cell(4), Some(Mark::Cross));
        assert!(board.is_occupied(4));
        assert!(!board.is_occupied(0));
    }

    #[test]
    fn row_win_is_detected() {
        // Nought takes the top row while Cross takes 3 and 4.
        let mut board = Board::new();
        play(&mut board, Mark::Nought, &[0, 1]);
        play(&mut board, Mark::Cross, &[3, 4]);
        play(&mut board, Mark::Nought, &[2]);
        assert_eq!(board.detect_outcome(), Ok(Verdict::Winner(Mark::Nought)));
        assert_eq!(board.winner(), Some(Mark::Nought));
    }

    #[test]
    fn column_win_is_detected() {
        let mut board = Board::new();
        play(&mut board, Mark::Cross, &[1, 4, 7]);
        play(&mut board, Mark::Nought, &[0, 2]);
        assert_eq!(board.detect_outcome(), Ok(Verdict::Winner(Mark::Cross)));
    }

    #[test]
    fn diagonal_win_is_detected() {
        let mut board = Board::new();
        play(&mut board, Mark::Nought, &[2, 4, 6]);
        play(&mut board, Mark::Cross, &[0, 1]);
        assert_eq!(board.detect_outcome(), Ok(Verdict::Winner(Mark::Nought)));
    }

    #[test]
    fn full_board_without_a_line_is_a_draw() {
        // o | o | x
        // x | x | o
        // o | x | o
        let mut board = Board::new();
        play(&mut board, Mark::Nought, &[0, 1, 5, 6, 8]);
        play(&mut board, Mark::Cross, &[2, 3, 4, 7]);
        assert_eq!(board.detect_outcome(), Ok(Verdict::Draw));
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn incomplete_board_without_a_line_is_undecided() {
        let mut board = Board::new();
        play(&mut board, Mark::Nought, &[0]);
        play(&mut board, Mark::Cross, &[4]);
        assert_eq!(board.detect_outcome(), Ok(Verdict::Undecided));
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn concluded_round_rejects_further_guarded_calls() {
        let mut board = Board::new();
        play(&mut board, Mark::Nought, &[0, 1, 2]);
        assert_eq!(board.detect_outcome(), Ok(Verdict::Winner(Mark::Nought)));

        // The memoized winner blocks both mutation and re-detection, so a
        // terminal board can never produce a second winning mark.
        assert_eq!(
            board.apply_move(5),
            Err(GuardError::Concluded(Mark::Nought))
        );
        assert_eq!(
            board.detect_outcome(),
            Err(GuardError::Concluded(Mark::Nought))
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let mut board = Board::new();
        play(&mut board, Mark::Nought, &[0, 1, 2]);
        board.detect_outcome().unwrap();

        board.reset();
        assert!(!board.has_any_move());
        assert_eq!(board.turn(), None);
        assert_eq!(board.winner(), None);

        board.reset();
        assert!(!board.has_any_move());
        assert_eq!(board.turn(), None);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn display_renders_the_grid() {
        let mut board = Board::new();
        play(&mut board, Mark::Nought, &[0]);
        play(&mut board, Mark::Cross, &[4]);
        assert_eq!(board.to_string(), "o | - | -\n- | x | -\n- | - | -\n");
    }
}
