use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    algo::{Opponent, QTableAgent, QTableAgentConfig},
    decay::{Decay, Epsilon, Schedule},
    ds::ValueTable,
    env::{Environment, Exp},
    error::{Error, Result},
    exploration::EpsilonGreedy,
    gym::{Mark, Outcome, TicTacToe},
    util::{in_unit_interval, ratio},
};

/// Hyperparameters of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Number of episodes (games) to play
    pub episodes: u32,
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Exploration rate schedule over the run
    pub epsilon: Schedule,
    /// The fixed policy the agent trains against
    pub opponent: Opponent,
    /// Emit a progress snapshot every this many episodes
    pub report_interval: u32,
    /// Seed for a reproducible run
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 20_000,
            alpha: 0.1,
            gamma: 0.9,
            epsilon: Schedule::default(),
            opponent: Opponent::Heuristic,
            report_interval: 100,
            seed: None,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.episodes == 0 {
            return Err(Error::config("trainer.episodes must be > 0"));
        }
        if !in_unit_interval(self.alpha) {
            return Err(Error::config("trainer.alpha must be in [0, 1]"));
        }
        if !in_unit_interval(self.gamma) {
            return Err(Error::config("trainer.gamma must be in [0, 1]"));
        }
        let (start, end) = self.epsilon.bounds();
        if !in_unit_interval(start) || !in_unit_interval(end) {
            return Err(Error::config("trainer.epsilon bounds must be in [0, 1]"));
        }
        if end > start {
            return Err(Error::config("trainer.epsilon end must be <= start"));
        }
        if self.report_interval == 0 {
            return Err(Error::config("trainer.report_interval must be > 0"));
        }
        Ok(())
    }
}

/// How an episode ended, from the learner's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeResult {
    Win,
    Loss,
    Draw,
    /// Ended by an illegal move
    Aborted,
}

impl EpisodeResult {
    fn from_outcome(outcome: Option<Outcome>, learner: Mark) -> Self {
        match outcome {
            Some(Outcome::Won(m)) if m == learner => EpisodeResult::Win,
            Some(Outcome::Won(_)) => EpisodeResult::Loss,
            Some(Outcome::Draw) => EpisodeResult::Draw,
            None => EpisodeResult::Aborted,
        }
    }
}

/// Cumulative game results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub aborted: u32,
}

impl Tally {
    pub fn record(&mut self, result: EpisodeResult) {
        match result {
            EpisodeResult::Win => self.wins += 1,
            EpisodeResult::Loss => self.losses += 1,
            EpisodeResult::Draw => self.draws += 1,
            EpisodeResult::Aborted => self.aborted += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws + self.aborted
    }

    pub fn win_rate(&self) -> f64 {
        ratio(self.wins, self.total())
    }

    pub fn loss_rate(&self) -> f64 {
        ratio(self.losses, self.total())
    }

    pub fn draw_rate(&self) -> f64 {
        ratio(self.draws, self.total())
    }
}

/// Snapshot emitted every `report_interval` episodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Episodes completed so far
    pub episode: u32,
    pub epsilon: f64,
    pub tally: Tally,
    /// States in the value table
    pub states: usize,
}

/// Plays a learning agent against a fixed opponent
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Build a fresh agent (playing `O`) from the configured hyperparameters
    pub fn agent(&self, table: ValueTable) -> Result<QTableAgent<Epsilon>> {
        self.config.validate()?;
        let config = QTableAgentConfig {
            exploration: EpsilonGreedy::new(self.config.epsilon.build(self.config.episodes)?),
            alpha: self.config.alpha,
            gamma: self.config.gamma,
            mark: Mark::O,
        };
        Ok(QTableAgent::new(config).with_table(table))
    }

    /// Run every configured episode
    pub fn train<D, R>(&self, agent: &mut QTableAgent<D>, rng: &mut R) -> Tally
    where
        D: Decay,
        R: Rng + ?Sized,
    {
        self.train_with(agent, rng, |_| {})
    }

    /// Run every configured episode, calling `on_progress` every `report_interval`
    /// episodes and once more at the end
    pub fn train_with<D, R, F>(
        &self,
        agent: &mut QTableAgent<D>,
        rng: &mut R,
        mut on_progress: F,
    ) -> Tally
    where
        D: Decay,
        R: Rng + ?Sized,
        F: FnMut(&Progress),
    {
        let TrainerConfig {
            episodes,
            opponent,
            report_interval,
            ..
        } = self.config;
        let mut env = TicTacToe::new(agent.mark(), agent.mark());
        let mut tally = Tally::default();

        log::info!("training for {episodes} episodes against {opponent}");

        for episode in 0..episodes {
            agent.set_episode(episode);
            let result = run_episode(agent, &mut env, opponent, rng);
            log::debug!("episode {episode}: {result:?}");
            tally.record(result);

            let done = episode + 1;
            if done % report_interval == 0 || done == episodes {
                let progress = Progress {
                    episode: done,
                    epsilon: agent.epsilon(),
                    tally,
                    states: agent.table().len(),
                };
                log::info!(
                    "episode {done}/{episodes} | epsilon {:.3} | {} | states {}",
                    progress.epsilon,
                    rates(&tally),
                    progress.states,
                );
                on_progress(&progress);
            }
        }

        log::info!(
            "training complete: {} episodes, {} states",
            tally.total(),
            agent.table().len()
        );
        log::info!(
            "final results: {} wins, {} losses, {} draws, {} aborted | {}",
            tally.wins,
            tally.losses,
            tally.draws,
            tally.aborted,
            rates(&tally),
        );
        tally
    }
}

fn rates(tally: &Tally) -> String {
    format!(
        "wins {:.1}% | losses {:.1}% | draws {:.1}%",
        tally.win_rate() * 100.0,
        tally.loss_rate() * 100.0,
        tally.draw_rate() * 100.0,
    )
}

/// Play one episode; the agent moves first and learns from each of its own moves
///
/// The opponent's moves carry no learning signal.
pub fn run_episode<D: Decay, R: Rng + ?Sized>(
    agent: &mut QTableAgent<D>,
    env: &mut TicTacToe,
    opponent: Opponent,
    rng: &mut R,
) -> EpisodeResult {
    let learner = agent.mark();
    let mut board = env.reset();

    while env.is_active() {
        if env.to_move() == learner {
            let Some(action) = agent.act(&board, rng) else {
                break;
            };
            let transition = env.step(action);
            agent.learn(Exp::from_transition(board, action, &transition));
            board = transition.next_state;
        } else {
            let Some(reply) = opponent.choose(&board, learner.opponent(), rng) else {
                break;
            };
            board = env.step(reply).next_state;
        }
    }

    if env.aborted() {
        return EpisodeResult::Aborted;
    }
    EpisodeResult::from_outcome(env.winner(), learner)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const EMPTY_BOARD: &str = "         ";

    fn config(episodes: u32) -> TrainerConfig {
        TrainerConfig {
            episodes,
            report_interval: 10,
            ..Default::default()
        }
    }

    #[test]
    fn single_episode_populates_empty_board() {
        let trainer = Trainer::new(config(1));
        let mut agent = trainer.agent(ValueTable::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let tally = trainer.train(&mut agent, &mut rng);
        assert_eq!(tally.total(), 1, "One episode played");
        assert!(agent.table().contains_state(EMPTY_BOARD), "Empty board recorded");
    }

    #[test]
    fn tally_accounts_for_every_episode() {
        let trainer = Trainer::new(config(300));
        let mut agent = trainer.agent(ValueTable::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let tally = trainer.train(&mut agent, &mut rng);
        assert_eq!(tally.total(), 300, "Every episode tallied");
        assert_eq!(tally.aborted, 0, "Only legal moves are offered");
        assert!(agent.table().len() > 1, "Table grows");
    }

    #[test]
    fn progress_reported_at_interval() {
        let trainer = Trainer::new(config(25));
        let mut agent = trainer.agent(ValueTable::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = Vec::new();
        trainer.train_with(&mut agent, &mut rng, |p| seen.push(p.episode));
        assert_eq!(seen, vec![10, 20, 25], "Every 10 episodes plus the final one");
    }

    #[test]
    fn epsilon_decays_across_run() {
        let trainer = Trainer::new(config(100));
        let mut agent = trainer.agent(ValueTable::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut epsilons = Vec::new();
        trainer.train_with(&mut agent, &mut rng, |p| epsilons.push(p.epsilon));
        assert!(epsilons.windows(2).all(|w| w[1] <= w[0]), "Non-increasing epsilon");
        assert!(epsilons.iter().all(|&e| e >= 0.01), "Floor respected");
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let trainer = Trainer::new(config(200));
        let run = |seed| {
            let mut agent = trainer.agent(ValueTable::new()).unwrap();
            let tally = trainer.train(&mut agent, &mut StdRng::seed_from_u64(seed));
            (tally, agent.into_table())
        };
        assert_eq!(run(7), run(7), "Same seed, same table and tally");
    }

    #[test]
    fn resumed_training_keeps_prior_values() {
        let trainer = Trainer::new(config(1));
        let mut prior = ValueTable::new();
        prior.set("X        ", crate::gym::Cell::CENTER, 0.42);
        let mut agent = trainer.agent(prior).unwrap();
        trainer.train(&mut agent, &mut StdRng::seed_from_u64(4));
        assert_eq!(
            agent.table().get("X        ", crate::gym::Cell::CENTER),
            0.42,
            "Unvisited prior entry untouched"
        );
    }

    #[test]
    fn validation_rejects_bad_hyperparameters() {
        assert!(TrainerConfig::default().validate().is_ok());
        let bad = [
            TrainerConfig {
                episodes: 0,
                ..Default::default()
            },
            TrainerConfig {
                alpha: 1.1,
                ..Default::default()
            },
            TrainerConfig {
                gamma: -0.1,
                ..Default::default()
            },
            TrainerConfig {
                epsilon: Schedule::Linear {
                    start: 0.1,
                    end: 0.5,
                },
                ..Default::default()
            },
            TrainerConfig {
                report_interval: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} rejected");
        }
    }

    #[test]
    fn episode_result_from_outcome() {
        let result = |outcome| EpisodeResult::from_outcome(outcome, Mark::O);
        assert_eq!(result(Some(Outcome::Won(Mark::O))), EpisodeResult::Win);
        assert_eq!(result(Some(Outcome::Won(Mark::X))), EpisodeResult::Loss);
        assert_eq!(result(Some(Outcome::Draw)), EpisodeResult::Draw);
        assert_eq!(result(None), EpisodeResult::Aborted);
    }

    #[test]
    fn episode_alternates_turns_until_inactive() {
        let trainer = Trainer::new(config(1));
        let mut agent = trainer.agent(ValueTable::new()).unwrap();
        let mut env = TicTacToe::new(Mark::O, Mark::O);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let result = run_episode(&mut agent, &mut env, Opponent::Random, &mut rng);
            assert!(!env.is_active(), "Episode runs until the environment is done");
            assert_ne!(result, EpisodeResult::Aborted, "Only legal moves are played");

            let key = env.board().key();
            let o = key.chars().filter(|&c| c == 'O').count();
            let x = key.chars().filter(|&c| c == 'X').count();
            assert!(o == x || o == x + 1, "Agent opens and turns alternate: {key:?}");
        }
    }
}
