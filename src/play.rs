use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    algo::QTableAgent,
    decay::Decay,
    env::Environment,
    gym::{Board, Cell, Mark, Outcome, TicTacToe},
    util::ratio,
};

/// Settings for an interactive game against a trained agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    /// Pause before the agent replies, in milliseconds
    pub ai_delay_ms: u64,
    /// Whether the human opens each game
    pub human_first: bool,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            ai_delay_ms: 500,
            human_first: true,
        }
    }
}

/// The agent's running record across games in a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// States in the agent's table
    pub states_learned: usize,
}

impl MatchStats {
    pub fn win_rate(&self) -> f64 {
        ratio(self.wins, self.games)
    }
}

/// A human (`X`) against a frozen agent (`O`)
pub struct Session<D: Decay> {
    env: TicTacToe,
    agent: QTableAgent<D>,
    human: Mark,
    stats: MatchStats,
    moves_made: u32,
    recorded: bool,
}

impl<D: Decay> Session<D> {
    pub fn new(agent: QTableAgent<D>, human_first: bool) -> Self {
        let ai = agent.mark();
        let human = ai.opponent();
        let first = if human_first { human } else { ai };
        let stats = MatchStats {
            states_learned: agent.table().len(),
            ..Default::default()
        };
        Self {
            env: TicTacToe::new(ai, first),
            agent,
            human,
            stats,
            moves_made: 0,
            recorded: false,
        }
    }

    pub fn board(&self) -> &Board {
        self.env.board()
    }

    pub fn to_move(&self) -> Mark {
        self.env.to_move()
    }

    pub fn human(&self) -> Mark {
        self.human
    }

    pub fn ai(&self) -> Mark {
        self.agent.mark()
    }

    pub fn is_human_turn(&self) -> bool {
        !self.is_over() && self.to_move() == self.human
    }

    pub fn is_over(&self) -> bool {
        self.env.is_over()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.env.winner()
    }

    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    pub fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Start a new game, keeping the running stats
    pub fn reset(&mut self) {
        self.env.reset();
        self.moves_made = 0;
        self.recorded = false;
    }

    /// Place the human's mark
    ///
    /// **Returns** `false`, changing nothing, if it is not the human's turn or the
    /// cell is taken
    pub fn human_move(&mut self, cell: Cell) -> bool {
        if !self.is_human_turn() || !self.env.apply(cell, self.human) {
            return false;
        }
        self.after_move();
        true
    }

    /// Let the agent reply with its best move
    pub fn ai_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Cell> {
        if self.is_over() || self.to_move() != self.ai() {
            return None;
        }
        let cell = self.agent.best_move(self.env.board(), rng)?;
        if !self.env.apply(cell, self.ai()) {
            return None;
        }
        self.after_move();
        Some(cell)
    }

    fn after_move(&mut self) {
        self.moves_made += 1;
        if self.recorded {
            return;
        }
        let Some(outcome) = self.env.winner() else {
            return;
        };
        self.stats.games += 1;
        match outcome {
            Outcome::Won(m) if m == self.ai() => self.stats.wins += 1,
            Outcome::Won(_) => self.stats.losses += 1,
            Outcome::Draw => self.stats.draws += 1,
        }
        self.recorded = true;
        log::info!("game over: {outcome:?} after {} moves", self.moves_made);
    }
}
