use ratatui::{prelude::*, widgets::*};

const GLOBAL_KEYS: [(&str, &str); 3] = [
    ("  q  ", "Close the dashboard (training continues)"),
    ("  h  ", "Toggle this help"),
    (" Tab ", "Switch between Plots and Logs"),
];

const PLOT_KEYS: [(&str, &str); 1] = [("← / →", "Previous / next metric")];

const LOG_KEYS: [(&str, &str); 6] = [
    ("  s  ", "Show or hide the target selector"),
    ("  f  ", "Focus on the selected target"),
    ("↑ / ↓", "Select log target"),
    ("← / →", "Show one level less / more"),
    ("- / +", "Capture one level less / more"),
    ("PgUp ", "Scroll back through history (Esc to leave)"),
];

/// Centered popup listing the key bindings of the selected tab
pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let tab_keys: &[(&str, &str)] = match selected_tab {
        0 => &PLOT_KEYS,
        _ => &LOG_KEYS,
    };
    let lines: Vec<Line> = GLOBAL_KEYS
        .iter()
        .chain(tab_keys)
        .map(|&(key, action)| {
            Line::from(vec![
                Span::from(key).light_cyan().bold(),
                Span::raw(" : "),
                Span::raw(action),
            ])
        })
        .collect();

    let [_, row, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(lines.len() as u16 + 4),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, popup, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(64),
        Constraint::Fill(1),
    ])
    .areas(row);

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::horizontal(1))
                .title("Help"),
        )
        .render(popup, buf);
}
