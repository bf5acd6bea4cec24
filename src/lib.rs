//! Tabular Q-learning for tic-tac-toe: an agent that learns a state-action value
//! table by playing against fixed opponents, persists it as JSON and plays against
//! humans with it.

/// The learning agent and the fixed opponents it plays against
pub mod algo;

/// Application configuration
pub mod config;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

pub mod error;

/// Greedy evaluation against fixed opponents
pub mod eval;

/// Exploration policies
pub mod exploration;

/// The tic-tac-toe board and environment
pub mod gym;

/// Interactive human-vs-agent sessions
pub mod play;

/// Training driver
pub mod train;

/// Terminal training dashboard
#[cfg(feature = "viz")]
pub mod viz;

mod util;

pub use error::{Error, Result};
pub use util::ratio;
