use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    algo::{Opponent, QTableAgent},
    decay::Decay,
    error::{Error, Result},
    env::Environment,
    gym::{Outcome, TicTacToe},
    train::{EpisodeResult, Tally},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Games played against each opponent
    pub games: u32,
    pub opponents: Vec<Opponent>,
    pub seed: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            games: 1000,
            opponents: Opponent::EVALUATION.to_vec(),
            seed: None,
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.games == 0 {
            return Err(Error::config("eval.games must be > 0"));
        }
        if self.opponents.is_empty() {
            return Err(Error::config("eval.opponents must name at least one opponent"));
        }
        Ok(())
    }
}

/// Results against one opponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Report {
    pub opponent: Opponent,
    pub tally: Tally,
}

/// Measure a frozen agent against every configured opponent
///
/// Exploration is disabled and the table is never written to.
pub fn evaluate<D: Decay>(agent: &QTableAgent<D>, config: &EvalConfig) -> Result<Vec<Report>> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let reports = config
        .opponents
        .iter()
        .map(|&opponent| {
            let tally = play_games(agent, opponent, config.games, &mut rng);
            log::info!(
                "vs {opponent}: {} wins ({:.1}%), {} losses ({:.1}%), {} draws ({:.1}%)",
                tally.wins,
                tally.win_rate() * 100.0,
                tally.losses,
                tally.loss_rate() * 100.0,
                tally.draws,
                tally.draw_rate() * 100.0,
            );
            Report { opponent, tally }
        })
        .collect();
    Ok(reports)
}

/// Play `games` greedy games against `opponent`, agent moving first
pub fn play_games<D: Decay, R: Rng + ?Sized>(
    agent: &QTableAgent<D>,
    opponent: Opponent,
    games: u32,
    rng: &mut R,
) -> Tally {
    let mut tally = Tally::default();
    for _ in 0..games {
        tally.record(play_game(agent, opponent, rng));
    }
    tally
}

fn play_game<D: Decay, R: Rng + ?Sized>(
    agent: &QTableAgent<D>,
    opponent: Opponent,
    rng: &mut R,
) -> EpisodeResult {
    let me = agent.mark();
    let mut env = TicTacToe::new(me, me);
    let mut board = env.reset();

    while env.is_active() {
        let choice = if env.to_move() == me {
            agent.choose_action(&board, false, rng)
        } else {
            opponent.choose(&board, me.opponent(), rng)
        };
        let Some(cell) = choice else {
            break;
        };
        board = env.step(cell).next_state;
    }

    match env.winner() {
        _ if env.aborted() => EpisodeResult::Aborted,
        Some(Outcome::Won(m)) if m == me => EpisodeResult::Win,
        Some(Outcome::Won(_)) => EpisodeResult::Loss,
        Some(Outcome::Draw) => EpisodeResult::Draw,
        None => EpisodeResult::Aborted,
    }
}
