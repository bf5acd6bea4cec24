use std::path::Path;

use rand::{seq::SliceRandom, Rng};

use crate::{
    algo::opponent::tactical_move,
    assert_interval,
    decay::{self, Decay},
    ds::ValueTable,
    env::Exp,
    error::Result,
    exploration::{Choice, EpsilonGreedy},
    gym::{Board, Cell, Mark},
};

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone)]
pub struct QTableAgentConfig<D: Decay> {
    pub exploration: EpsilonGreedy<D>,
    /// The learning rate - must be between 0 and 1
    pub alpha: f64,
    /// The discount factor - must be between 0 and 1
    pub gamma: f64,
    /// The side the agent plays
    pub mark: Mark,
}

impl Default for QTableAgentConfig<decay::Linear> {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(
                decay::Linear::spanning(0.3, 0.01, 20_000).expect("valid default decay"),
            ),
            alpha: 0.1,
            gamma: 0.9,
            mark: Mark::O,
        }
    }
}

/// A tic-tac-toe Q-learning agent backed by a [`ValueTable`]
///
/// ### Generics
/// - `D` - The [`Decay`] schedule driving the epsilon-greedy exploration rate
pub struct QTableAgent<D: Decay> {
    table: ValueTable,
    exploration: EpsilonGreedy<D>,
    alpha: f64,   // learning rate
    gamma: f64,   // discount factor
    mark: Mark,   // side played
    episode: u32, // current episode
}

impl<D: Decay> QTableAgent<D> {
    /// Initialize a new `QTableAgent` with an empty table
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: QTableAgentConfig<D>) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self {
            table: ValueTable::new(),
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            mark: config.mark,
            episode: 0,
        }
    }

    /// Replace the value table, e.g. with one loaded from disk
    pub fn with_table(mut self, table: ValueTable) -> Self {
        self.table = table;
        self
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn into_table(self) -> ValueTable {
        self.table
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Set the episode the exploration schedule is evaluated at
    pub fn set_episode(&mut self, episode: u32) {
        self.episode = episode;
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon(self.episode)
    }

    /// Replace the table with the one stored at `path`
    ///
    /// On error the current table is left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.table = ValueTable::load(path)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.table.save(path)
    }

    /// Epsilon-greedy action selection
    ///
    /// With `explore` set, a uniformly random legal cell is returned with
    /// probability epsilon. Otherwise, and always when `explore` is unset, the legal
    /// cell with the highest stored value, ties going to the first in row-major order.
    /// Returns `None` when the board has no legal moves.
    pub fn choose_action<R: Rng + ?Sized>(
        &self,
        board: &Board,
        explore: bool,
        rng: &mut R,
    ) -> Option<Cell> {
        let actions = board.legal_moves();
        if explore {
            if let Choice::Explore = self.exploration.choose(self.episode, rng) {
                return actions.choose(rng).copied();
            }
        }
        self.argmax(&board.key(), &actions)
    }

    /// Greedy selection without exploration; deterministic for a fixed table
    pub fn greedy(&self, board: &Board) -> Option<Cell> {
        self.argmax(&board.key(), &board.legal_moves())
    }

    /// Select a training move, recording the visited state's legal actions at `0.0`
    /// first so that later bootstraps see them
    pub fn act<R: Rng + ?Sized>(&mut self, board: &Board, rng: &mut R) -> Option<Cell> {
        self.table.touch(&board.key(), &board.legal_moves());
        self.choose_action(board, true, rng)
    }

    fn argmax(&self, state: &str, actions: &[Cell]) -> Option<Cell> {
        let mut best: Option<(Cell, f64)> = None;
        for &action in actions {
            let value = self.table.get(state, action);
            // Strict comparison keeps the earliest action on ties
            if best.map_or(true, |(_, v)| value > v) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Bellman backup for a single transition
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max<sub>a'</sub> Q(s',a') - Q(s,a)]
    ///
    /// The max runs over every action recorded for `s'`, without filtering to those
    /// legal in `s'`, and is `0` when `s'` is terminal or unseen.
    pub fn learn(&mut self, experience: Exp<Board, Cell>) {
        let Exp {
            state,
            action,
            reward,
            next_state,
            done,
        } = experience;

        let state = state.key();
        let q_value = self.table.get(&state, action);
        let max_next_q = if done {
            0.0
        } else {
            self.table.max_value(&next_state.key())
        };
        let updated = q_value + self.alpha * (reward + self.gamma * max_next_q - q_value);
        log::trace!("Q({state:?}, {action}) {q_value:.4} -> {updated:.4}");

        self.table.set(&state, action, updated);
    }

    /// Move for interactive play: the best legal action with a stored value,
    /// falling back to [`tactical_move`] when the state is unseen or none of its
    /// legal actions are stored
    pub fn best_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R) -> Option<Cell> {
        let known = self.table.actions(&board.key()).map(|values| {
            board
                .legal_moves()
                .into_iter()
                .filter(|a| values.contains_key(a))
                .collect::<Vec<_>>()
        });
        match known {
            Some(actions) if !actions.is_empty() => self.argmax(&board.key(), &actions),
            _ => {
                log::debug!("no stored values for {:?}, using fallback", board.key());
                tactical_move(board, self.mark, rng)
            }
        }
    }
}
