use std::{
    io,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use crossterm::event::{self, Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{help::render_help, Component, Logs, Plots},
    tui,
    util::pressed_key,
    Update,
};

const TABS: [&str; 2] = ["Plots", "Logs"];

#[derive(Debug, Default, PartialEq, Eq)]
enum State {
    #[default]
    Training,
    /// The sender hung up; keep showing the final numbers
    Finished,
    Quit,
}

/// The root dashboard component: tabs, the selected view and a progress gauge
pub struct App {
    state: State,
    episode: u32,
    total_episodes: u32,
    selected_tab: usize,
    show_help: bool,
    plots: Plots,
    logs: Logs,
}

impl App {
    pub fn new(total_episodes: u32) -> Self {
        Self {
            state: State::default(),
            episode: 0,
            total_episodes,
            selected_tab: 0,
            show_help: false,
            plots: Plots::new(total_episodes),
            logs: Logs::new(),
        }
    }

    /// Take over the terminal and draw until `q` is pressed
    pub fn run(&mut self, updates: Receiver<Update>) -> io::Result<()> {
        let mut terminal = tui::init()?;

        while self.state != State::Quit {
            if self.state == State::Training {
                self.drain(&updates);
            }
            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(&event);
            }
        }

        tui::restore()
    }

    fn drain(&mut self, updates: &Receiver<Update>) {
        loop {
            match updates.try_recv() {
                Ok(update) => {
                    self.episode = update.episode;
                    self.plots.update(&update);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.state = State::Finished;
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: &Event) {
        match pressed_key(event) {
            Some(KeyCode::Char('q')) => self.state = State::Quit,
            Some(KeyCode::Char('h')) => self.show_help = !self.show_help,
            Some(KeyCode::Tab) => self.selected_tab = (self.selected_tab + 1) % TABS.len(),
            _ if self.selected_tab == 0 => {
                self.plots.handle_ui_event(event);
            }
            _ => {
                self.logs.handle_ui_event(event);
            }
        }
    }

    fn progress(&self) -> f64 {
        if self.total_episodes == 0 {
            return 1.0;
        }
        (f64::from(self.episode) / f64::from(self.total_episodes)).clamp(0.0, 1.0)
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        match self.selected_tab {
            0 => self.plots.render_ref(main_area, buf),
            _ => self.logs.render_ref(main_area, buf),
        }

        let title = match self.state {
            State::Finished => "Training finished (q to close)",
            _ => "Progress",
        };
        Gauge::default()
            .block(Block::bordered().border_type(BorderType::Rounded).title(title))
            .gauge_style(Color::Cyan)
            .label(format!("{}/{}", self.episode, self.total_episodes))
            .ratio(self.progress())
            .render(progress_area, buf);

        if self.show_help {
            render_help(main_area, buf, self.selected_tab);
        }
    }
}
