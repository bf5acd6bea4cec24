use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::gym::{Board, Cell, Mark};

/// Fixed, non-learning move policies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Opponent {
    /// Uniformly random legal cell
    Random,
    /// Center, else the first free corner, else random
    Heuristic,
    /// Center, else random
    CenterFirst,
    /// Win, block, center, shuffled corners, else random
    Tactical,
}

impl Opponent {
    /// Opponents the evaluation driver measures against by default
    pub const EVALUATION: [Opponent; 3] =
        [Opponent::Random, Opponent::Heuristic, Opponent::CenterFirst];

    /// Pick a move for `mark`, or `None` on a finished board
    pub fn choose<R: Rng + ?Sized>(&self, board: &Board, mark: Mark, rng: &mut R) -> Option<Cell> {
        let legal = board.legal_moves();
        if legal.is_empty() {
            return None;
        }
        match self {
            Opponent::Random => legal.choose(rng).copied(),
            Opponent::Heuristic => center(board)
                .or_else(|| Cell::CORNERS.into_iter().find(|&c| board.is_free(c)))
                .or_else(|| legal.choose(rng).copied()),
            Opponent::CenterFirst => center(board).or_else(|| legal.choose(rng).copied()),
            Opponent::Tactical => tactical_move(board, mark, rng),
        }
    }
}

fn center(board: &Board) -> Option<Cell> {
    board.is_free(Cell::CENTER).then_some(Cell::CENTER)
}

/// A cell that completes a line for `mark`
pub fn winning_move(board: &Board, mark: Mark) -> Option<Cell> {
    board
        .legal_moves()
        .into_iter()
        .find(|&c| board.with(c, mark).line_winner() == Some(mark))
}

/// Rule-based move used when the value table has nothing to say about a board
///
/// In priority order: win immediately, block the other side's immediate win, take
/// the center, take a corner (in random order), play any free cell.
pub fn tactical_move<R: Rng + ?Sized>(board: &Board, mark: Mark, rng: &mut R) -> Option<Cell> {
    let legal = board.legal_moves();
    if legal.is_empty() {
        return None;
    }

    if let Some(cell) = winning_move(board, mark).or_else(|| winning_move(board, mark.opponent()))
    {
        return Some(cell);
    }
    if let Some(cell) = center(board) {
        return Some(cell);
    }

    let mut corners = Cell::CORNERS;
    corners.shuffle(rng);
    corners
        .into_iter()
        .find(|&c| board.is_free(c))
        .or_else(|| legal.choose(rng).copied())
}
