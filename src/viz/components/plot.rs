use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::Component;
use crate::viz::{util::pressed_key, Update, METRICS};

/// A single metric charted against episode
pub struct Plot {
    title: &'static str,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    points: Vec<(f64, f64)>,
}

impl Plot {
    /// Rates and epsilon all live in `[0, 1]`, so the y axis is fixed
    pub fn new(title: &'static str, total_episodes: u32) -> Self {
        Self {
            title,
            x_bounds: [0.0, f64::from(total_episodes.max(1))],
            y_bounds: [0.0, 1.0],
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, episode: u32, value: f64) {
        self.points.push((f64::from(episode), value));
    }

    pub fn latest(&self) -> Option<f64> {
        self.points.last().map(|&(_, y)| y)
    }

    fn labels(bounds: [f64; 2], precision: usize) -> Vec<Span<'static>> {
        let mid = (bounds[0] + bounds[1]) / 2.0;
        [bounds[0], mid, bounds[1]]
            .into_iter()
            .map(|v| Span::from(format!("{v:.precision$}")).bold())
            .collect()
    }
}

impl WidgetRef for Plot {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let dataset = Dataset::default()
            .name(self.title)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .cyan()
            .data(&self.points);

        let title = match self.latest() {
            Some(v) => format!("{} ({v:.3})", self.title),
            None => self.title.to_string(),
        };

        Chart::new(vec![dataset])
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title(title)
                    .padding(Padding::uniform(1)),
            )
            .x_axis(
                Axis::default()
                    .title("Episode")
                    .dark_gray()
                    .labels(Self::labels(self.x_bounds, 0))
                    .bounds(self.x_bounds),
            )
            .y_axis(
                Axis::default()
                    .dark_gray()
                    .labels(Self::labels(self.y_bounds, 2))
                    .bounds(self.y_bounds),
            )
            .render(area, buf);
    }
}

/// One [`Plot`] per metric, one visible at a time
pub struct Plots {
    plots: Vec<Plot>,
    selected: usize,
}

impl Plots {
    pub fn new(total_episodes: u32) -> Self {
        Self {
            plots: METRICS
                .iter()
                .map(|&name| Plot::new(name, total_episodes))
                .collect(),
            selected: 0,
        }
    }

    pub fn next_plot(&mut self) {
        self.selected = (self.selected + 1) % self.plots.len();
    }

    pub fn prev_plot(&mut self) {
        let len = self.plots.len();
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn update(&mut self, update: &Update) {
        for (plot, value) in self.plots.iter_mut().zip(update.metrics()) {
            plot.push(update.episode, value);
        }
    }
}

impl WidgetRef for Plots {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, chart_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(METRICS)
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        self.plots[self.selected].render_ref(chart_area, buf);
    }
}

impl Component for Plots {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        match pressed_key(event) {
            Some(KeyCode::Left) => self.prev_plot(),
            Some(KeyCode::Right) => self.next_plot(),
            _ => return false,
        }
        true
    }
}
