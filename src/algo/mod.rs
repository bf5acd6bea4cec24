pub mod opponent;
pub mod q_table;

pub use opponent::Opponent;
pub use q_table::{QTableAgent, QTableAgentConfig};
