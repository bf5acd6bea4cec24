use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    env::{Environment, Transition},
    error::{Error, Result},
};

/// Reward for the learner completing a line
pub const WIN_REWARD: f64 = 1.0;
/// Reward for the learner when the other side completes a line
pub const LOSS_REWARD: f64 = -1.0;
/// Reward for a full board without a line
pub const DRAW_REWARD: f64 = 0.5;
/// Reward for any non-terminal move
pub const STEP_REWARD: f64 = 0.0;
/// Penalty for attempting to play an occupied cell or a finished game
pub const ILLEGAL_REWARD: f64 = -10.0;

/// Character used for an empty cell in state keys
pub const EMPTY: char = ' ';

/// The eight winning lines as row-major cell indices: rows, columns, diagonals
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    fn from_symbol(c: char) -> Option<Option<Self>> {
        match c {
            'X' => Some(Some(Mark::X)),
            'O' => Some(Some(Mark::O)),
            EMPTY => Some(None),
            _ => None,
        }
    }
}

/// A board coordinate, also used as the action type
///
/// Ordered row-major, which is the enumeration and tie-breaking order everywhere.
/// Serialized as its action key, `"row,col"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cell {
    row: u8,
    col: u8,
}

impl Cell {
    pub const CENTER: Cell = Cell { row: 1, col: 1 };
    pub const CORNERS: [Cell; 4] = [
        Cell { row: 0, col: 0 },
        Cell { row: 0, col: 2 },
        Cell { row: 2, col: 0 },
        Cell { row: 2, col: 2 },
    ];

    /// Returns `None` when either coordinate is off the board
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < 3 && col < 3).then(|| Self {
            row: row as u8,
            col: col as u8,
        })
    }

    pub fn row(self) -> usize {
        self.row.into()
    }

    pub fn col(self) -> usize {
        self.col.into()
    }

    /// Row-major index in `0..9`
    pub fn index(self) -> usize {
        self.row() * 3 + self.col()
    }

    fn from_index(i: usize) -> Self {
        debug_assert!(i < 9);
        Self {
            row: (i / 3) as u8,
            col: (i % 3) as u8,
        }
    }

    /// All nine cells in row-major order
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..9).map(Cell::from_index)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for Cell {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidCell {
            input: s.to_string(),
        };
        let (row, col) = s
            .split_once(',')
            .or_else(|| s.trim().split_once(char::is_whitespace))
            .ok_or_else(invalid)?;
        let row = row.trim().parse().map_err(|_| invalid())?;
        let col = col.trim().parse().map_err(|_| invalid())?;
        Cell::new(row, col).ok_or_else(invalid)
    }
}

impl From<Cell> for String {
    fn from(cell: Cell) -> Self {
        cell.to_string()
    }
}

impl TryFrom<String> for Cell {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won(Mark),
    Draw,
}

/// A 3x3 grid of optional marks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Mark>; 9],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: Cell) -> Option<Mark> {
        self.cells[cell.index()]
    }

    pub fn is_free(&self, cell: Cell) -> bool {
        self.get(cell).is_none()
    }

    /// Place `mark` on `cell` if it is free. Does not check whether the game is over.
    pub fn place(&mut self, cell: Cell, mark: Mark) -> bool {
        let slot = &mut self.cells[cell.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(mark);
        true
    }

    /// Copy of the board with `mark` placed on `cell`
    pub fn with(&self, cell: Cell, mark: Mark) -> Self {
        let mut board = *self;
        board.cells[cell.index()] = Some(mark);
        board
    }

    /// Free cells in row-major order, or nothing once the game is decided
    pub fn legal_moves(&self) -> Vec<Cell> {
        if self.line_winner().is_some() {
            return Vec::new();
        }
        Cell::all().filter(|&c| self.is_free(c)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The mark holding a complete line, if any
    pub fn line_winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| match self.cells[a] {
            Some(m) if self.cells[b] == Some(m) && self.cells[c] == Some(m) => Some(m),
            _ => None,
        })
    }

    /// `None` while the game is in progress
    pub fn outcome(&self) -> Option<Outcome> {
        match self.line_winner() {
            Some(mark) => Some(Outcome::Won(mark)),
            None if self.is_full() => Some(Outcome::Draw),
            None => None,
        }
    }

    /// Canonical 9-character state key, rows concatenated, `' '` for empty
    pub fn key(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.map_or(EMPTY, Mark::symbol))
            .collect()
    }
}

impl FromStr for Board {
    type Err = Error;

    /// Parse a state key as produced by [`Board::key`]
    fn from_str(s: &str) -> Result<Self> {
        let chars = s.chars().collect::<Vec<_>>();
        if chars.len() != 9 {
            return Err(Error::InvalidBoard {
                input: s.to_string(),
                reason: format!("expected 9 cells, got {}", chars.len()),
            });
        }
        let mut board = Board::new();
        for (i, &c) in chars.iter().enumerate() {
            board.cells[i] = Mark::from_symbol(c).ok_or_else(|| Error::InvalidBoard {
                input: s.to_string(),
                reason: format!("invalid character {c:?} at position {i}"),
            })?;
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            let symbols = (0..3)
                .map(|col| self.cells[row * 3 + col].map_or(EMPTY, Mark::symbol))
                .collect::<Vec<_>>();
            writeln!(f, " {} | {} | {} ", symbols[0], symbols[1], symbols[2])?;
        }
        Ok(())
    }
}

/// Tic-tac-toe environment with rewards reported for a fixed learning side
#[derive(Debug, Clone)]
pub struct TicTacToe {
    board: Board,
    to_move: Mark,
    first: Mark,
    learner: Mark,
    aborted: bool,
}

impl TicTacToe {
    /// A new game where `learner` receives rewards and `first` opens
    pub fn new(learner: Mark, first: Mark) -> Self {
        Self {
            board: Board::new(),
            to_move: first,
            first,
            learner,
            aborted: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Whether the last episode ended on an illegal move
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_over(&self) -> bool {
        self.aborted || self.board.outcome().is_some()
    }

    /// Place `mark` on `cell`
    ///
    /// **Returns** `false`, leaving everything untouched, if the cell is occupied or
    /// the game has already ended
    pub fn apply(&mut self, cell: Cell, mark: Mark) -> bool {
        if self.is_over() || !self.board.place(cell, mark) {
            return false;
        }
        self.to_move = mark.opponent();
        true
    }

    pub fn winner(&self) -> Option<Outcome> {
        self.board.outcome()
    }

    /// Play `mark` on `cell` and score the result for the learner
    ///
    /// An illegal move aborts the episode with [`ILLEGAL_REWARD`].
    pub fn play(&mut self, cell: Cell, mark: Mark) -> Transition<Board> {
        if !self.apply(cell, mark) {
            log::warn!("illegal move {cell} by {mark} on {:?}", self.board.key());
            self.aborted = true;
            return Transition {
                next_state: self.board,
                reward: ILLEGAL_REWARD,
                done: true,
            };
        }
        let (reward, done) = match self.board.outcome() {
            Some(Outcome::Won(m)) if m == self.learner => (WIN_REWARD, true),
            Some(Outcome::Won(_)) => (LOSS_REWARD, true),
            Some(Outcome::Draw) => (DRAW_REWARD, true),
            None => (STEP_REWARD, false),
        };
        Transition {
            next_state: self.board,
            reward,
            done,
        }
    }
}

impl Environment for TicTacToe {
    type State = Board;
    type Action = Cell;

    fn is_active(&self) -> bool {
        !self.is_over()
    }

    fn step(&mut self, action: Self::Action) -> Transition<Self::State> {
        self.play(action, self.to_move)
    }

    fn reset(&mut self) -> Self::State {
        self.board = Board::new();
        self.to_move = self.first;
        self.aborted = false;
        self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: usize, col: usize) -> Cell {
        Cell::new(row, col).unwrap()
    }

    #[test]
    fn every_line_is_detected() {
        for line in LINES {
            for mark in [Mark::X, Mark::O] {
                let mut board = Board::new();
                for &i in &line {
                    board.place(Cell::from_index(i), mark);
                }
                assert_eq!(board.line_winner(), Some(mark), "Line {line:?} wins for {mark}");
                assert_eq!(board.outcome(), Some(Outcome::Won(mark)));
            }
        }
    }

    #[test]
    fn only_lines_win() {
        // Every 3-cell subset that is not one of the eight lines must not win
        for a in 0..9 {
            for b in (a + 1)..9 {
                for c in (b + 1)..9 {
                    let mut board = Board::new();
                    for i in [a, b, c] {
                        board.place(Cell::from_index(i), Mark::X);
                    }
                    let is_line = LINES.contains(&[a, b, c]);
                    assert_eq!(
                        board.line_winner().is_some(),
                        is_line,
                        "Cells {a},{b},{c} win iff they form a line"
                    );
                }
            }
        }
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let board: Board = "XOXXOOOXX".parse().unwrap();
        assert_eq!(board.outcome(), Some(Outcome::Draw), "Draw detected");
        assert!(board.legal_moves().is_empty(), "No moves on a full board");
    }

    #[test]
    fn apply_rejects_occupied_and_finished() {
        let mut env = TicTacToe::new(Mark::O, Mark::O);
        assert!(env.apply(cell(0, 0), Mark::O), "First move accepted");
        assert!(!env.apply(cell(0, 0), Mark::X), "Occupied cell rejected");
        assert_eq!(env.board().get(cell(0, 0)), Some(Mark::O), "Board unchanged");

        env.apply(cell(1, 0), Mark::X);
        env.apply(cell(0, 1), Mark::O);
        env.apply(cell(1, 1), Mark::X);
        env.apply(cell(0, 2), Mark::O);
        assert_eq!(env.winner(), Some(Outcome::Won(Mark::O)), "Top row wins");
        assert!(!env.apply(cell(2, 2), Mark::X), "Finished game rejects moves");
        assert!(env.board().is_free(cell(2, 2)));
    }

    #[test]
    fn apply_wins_on_column_and_diagonal() {
        let mut env = TicTacToe::new(Mark::O, Mark::X);
        let opening = [(0, 1, Mark::X), (0, 0, Mark::O), (1, 1, Mark::X), (0, 2, Mark::O)];
        for (row, col, mark) in opening {
            assert!(env.apply(cell(row, col), mark));
        }
        assert_eq!(env.winner(), None, "Two in a column is not a win");
        assert!(env.apply(cell(2, 1), Mark::X));
        assert_eq!(env.winner(), Some(Outcome::Won(Mark::X)), "Middle column wins");
        assert!(env.is_over());

        let mut env = TicTacToe::new(Mark::O, Mark::O);
        let opening = [(0, 0, Mark::O), (0, 1, Mark::X), (1, 1, Mark::O), (0, 2, Mark::X)];
        for (row, col, mark) in opening {
            assert!(env.apply(cell(row, col), mark));
        }
        assert_eq!(env.winner(), None, "Two on the diagonal is not a win");
        assert!(env.apply(cell(2, 2), Mark::O));
        assert_eq!(env.winner(), Some(Outcome::Won(Mark::O)), "Main diagonal wins");
        assert_eq!(env.to_move(), Mark::X);
    }

    #[test]
    fn key_uses_space_sentinel() {
        let mut board = Board::new();
        assert_eq!(board.key(), "         ", "Empty board key");
        board.place(cell(0, 0), Mark::X);
        board.place(cell(1, 1), Mark::O);
        board.place(cell(2, 2), Mark::X);
        assert_eq!(board.key(), "X   O   X", "Row-major key");
        assert_eq!(board.key().parse::<Board>().unwrap(), board, "Key parses back");
    }

    #[test]
    fn board_parse_errors() {
        assert!("XO".parse::<Board>().is_err(), "Short key rejected");
        assert!("XO-      ".parse::<Board>().is_err(), "Bad character rejected");
    }

    #[test]
    fn cell_keys() {
        assert_eq!(cell(2, 1).to_string(), "2,1");
        assert_eq!("1,2".parse::<Cell>().unwrap(), cell(1, 2));
        assert_eq!("1 2".parse::<Cell>().unwrap(), cell(1, 2), "Space separated");
        assert!("3,0".parse::<Cell>().is_err(), "Off-board row rejected");
        assert!("a,b".parse::<Cell>().is_err(), "Non-numeric rejected");
        assert!(Cell::new(0, 3).is_none());
    }

    #[test]
    fn legal_moves_row_major() {
        let board: Board = " X O     ".parse().unwrap();
        let moves = board.legal_moves();
        assert_eq!(moves.len(), 7);
        assert_eq!(moves[0], cell(0, 0));
        assert_eq!(moves[1], cell(0, 2));
        assert!(moves.windows(2).all(|w| w[0] < w[1]), "Sorted row-major");
    }

    #[test]
    fn step_rewards() {
        let mut env = TicTacToe::new(Mark::O, Mark::O);
        env.reset();
        let t = env.step(cell(0, 0));
        assert_eq!((t.reward, t.done), (STEP_REWARD, false), "Quiet move");
        assert_eq!(env.to_move(), Mark::X, "Turns alternate");

        env.step(cell(1, 0));
        env.step(cell(0, 1));
        env.step(cell(1, 1));
        let t = env.step(cell(0, 2));
        assert_eq!((t.reward, t.done), (WIN_REWARD, true), "Learner wins");

        env.reset();
        env.step(cell(2, 2));
        env.step(cell(0, 0));
        env.step(cell(2, 1));
        env.step(cell(0, 1));
        env.step(cell(1, 1));
        let t = env.step(cell(0, 2));
        assert_eq!((t.reward, t.done), (LOSS_REWARD, true), "Learner loses");
    }

    #[test]
    fn draw_reward() {
        let mut env = TicTacToe::new(Mark::O, Mark::O);
        // O X O / O X X / X O O
        let moves = [(0, 0), (0, 1), (0, 2), (1, 1), (1, 0), (2, 0), (2, 1), (1, 2), (2, 2)];
        let mut last = None;
        for (r, c) in moves {
            last = Some(env.step(cell(r, c)));
        }
        let t = last.unwrap();
        assert_eq!((t.reward, t.done), (DRAW_REWARD, true), "Draw rewarded");
        assert_eq!(env.winner(), Some(Outcome::Draw));
    }

    #[test]
    fn illegal_step_aborts() {
        let mut env = TicTacToe::new(Mark::O, Mark::O);
        env.step(cell(1, 1));
        let t = env.step(cell(1, 1));
        assert_eq!((t.reward, t.done), (ILLEGAL_REWARD, true), "Illegal move penalized");
        assert!(env.aborted(), "Episode aborted");
        assert!(!env.is_active(), "Aborted episode is inactive");
        assert!(!env.apply(cell(0, 0), Mark::X), "No moves after abort");
        env.reset();
        assert!(!env.aborted(), "Reset clears abort");
        assert!(env.is_active());
        assert_eq!(env.board().legal_moves().len(), 9);
    }
}
