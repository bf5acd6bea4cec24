//! Terminal dashboard for watching a training run

use std::{
    io,
    sync::mpsc::{self, Sender},
    thread::{self, JoinHandle},
};

use crate::train::Progress;

mod app;
mod components;
mod tui;
mod util;

pub use app::App;

/// Names of the plotted metrics, in the order [`Update::metrics`] returns them
pub const METRICS: [&str; 4] = ["Win rate", "Loss rate", "Draw rate", "Epsilon"];

/// A training progress snapshot sent to the dashboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Update {
    pub episode: u32,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub draw_rate: f64,
    pub epsilon: f64,
}

impl Update {
    pub fn metrics(&self) -> [f64; 4] {
        [self.win_rate, self.loss_rate, self.draw_rate, self.epsilon]
    }
}

impl From<&Progress> for Update {
    fn from(progress: &Progress) -> Self {
        Self {
            episode: progress.episode,
            win_rate: progress.tally.win_rate(),
            loss_rate: progress.tally.loss_rate(),
            draw_rate: progress.tally.draw_rate(),
            epsilon: progress.epsilon,
        }
    }
}

/// A running dashboard: the thread drawing it and the channel feeding it
pub struct Dashboard {
    handle: JoinHandle<io::Result<()>>,
    tx: Sender<Update>,
}

impl Dashboard {
    /// Push a snapshot to the dashboard. A closed dashboard drops it.
    pub fn send(&self, progress: &Progress) {
        let _ = self.tx.send(Update::from(progress));
    }

    /// Hang up the channel and wait for the user to close the dashboard
    ///
    /// **Returns** the dashboard's terminal error, or an error if its thread panicked
    pub fn close(self) -> io::Result<()> {
        let Self { handle, tx } = self;
        drop(tx);
        handle
            .join()
            .map_err(|_| io::Error::other("dashboard thread panicked"))?
    }
}

/// Route `log` records into the dashboard and start it on a background thread
///
/// The thread exits when the user presses `q`.
pub fn init(total_episodes: u32) -> Dashboard {
    if let Err(e) = tui_logger::init_logger(log::LevelFilter::Trace) {
        eprintln!("failed to install dashboard logger: {e}");
    }
    tui_logger::set_default_level(log::LevelFilter::Info);

    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || App::new(total_episodes).run(rx));

    Dashboard { handle, tx }
}
