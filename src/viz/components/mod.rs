pub mod help;
pub mod log;
pub mod plot;

use crossterm::event::Event;
pub use log::Logs;
pub use plot::Plots;
use ratatui::widgets::WidgetRef;

/// A widget that reacts to terminal input
pub trait Component: WidgetRef {
    /// **Returns** whether the event was consumed
    fn handle_ui_event(&mut self, event: &Event) -> bool;
}
