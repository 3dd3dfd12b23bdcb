pub mod status_row;
pub mod tree_view;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, Pane};

/// Main render function: two tree panes side by side over a status row
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // pane area
            Constraint::Length(1), // status row
        ])
        .split(area);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[0]);

    tree_view::render_pane(frame, app, Pane::Workspaces, panes[0]);
    tree_view::render_pane(frame, app, Pane::Todos, panes[1]);

    status_row::render_status_row(frame, app, chunks[1]);
}
