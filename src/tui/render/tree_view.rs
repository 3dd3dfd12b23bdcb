use chrono::Local;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::tui::app::{App, EditField, Mode, Pane};
use crate::tui::flatten::{NodeData, Row};
use crate::tui::format::{FieldValue, FormatCtx};
use crate::tui::input;

/// Render one tree pane (bordered, focused pane gets the highlight border)
pub fn render_pane(frame: &mut Frame, app: &mut App, pane: Pane, area: Rect) {
    let focused = app.pane == pane;
    let theme = app.theme.clone();
    let border_style = if focused {
        Style::default().fg(theme.highlight)
    } else {
        Style::default().fg(theme.dim)
    };

    let title = match pane {
        Pane::Workspaces => " workspaces ",
        Pane::Todos => " todos ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            title,
            Style::default()
                .fg(if focused { theme.text_bright } else { theme.dim })
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner.height as usize;
    let ctx = FormatCtx {
        today: Local::now().date_naive(),
    };

    // Keep the highlight inside the viewport
    let state = match pane {
        Pane::Workspaces => &mut app.workspaces,
        Pane::Todos => &mut app.todos,
    };
    if let Some(index) = state.highlight_index() {
        if index < state.scroll_offset {
            state.scroll_offset = index;
        } else if visible > 0 && index >= state.scroll_offset + visible {
            state.scroll_offset = index + 1 - visible;
        }
    }
    let scroll = state.scroll_offset;

    let highlight_index = state.highlight_index();
    let rows: Vec<Row> = state
        .rows
        .iter()
        .skip(scroll)
        .take(visible)
        .cloned()
        .collect();

    let editing = (app.mode == Mode::Edit).then(|| app.edit.clone()).flatten();

    let mut lines = Vec::with_capacity(rows.len());
    for (offset, row) in rows.iter().enumerate() {
        let index = scroll + offset;
        let selected = focused && highlight_index == Some(index);
        let mut spans = Vec::new();
        let row_bg = if selected {
            theme.selection_bg
        } else {
            theme.background
        };
        let base = Style::default()
            .fg(if selected { theme.text_bright } else { theme.text })
            .bg(row_bg);
        let dim = Style::default().fg(theme.dim).bg(row_bg);

        spans.push(Span::styled(guide_prefix(row), dim));

        let marker = if row.has_children {
            if row.is_expanded { "\u{25BE} " } else { "\u{25B8} " }
        } else {
            "  "
        };
        spans.push(Span::styled(marker.to_string(), dim));

        let inline_edit = editing
            .as_ref()
            .filter(|e| e.node == row.data.id() && e.field == EditField::Description);

        if let NodeData::Todo(todo) = &row.data {
            let checkbox = app
                .formatters
                .format_value(&FieldValue::Flag(todo.pending), &row.data, &ctx);
            let checkbox_style = if todo.pending {
                base
            } else {
                Style::default().fg(theme.green).bg(row_bg)
            };
            spans.push(Span::styled(format!("{} ", checkbox), checkbox_style));
        }

        match inline_edit {
            Some(edit) => {
                push_edit_buffer(&mut spans, &edit.buffer, edit.cursor, base, &theme, row_bg);
            }
            None => {
                let description = app.formatters.format_value(
                    &FieldValue::Text(row.data.description()),
                    &row.data,
                    &ctx,
                );
                let style = match &row.data {
                    NodeData::Todo(todo) if !todo.pending => {
                        base.add_modifier(Modifier::CROSSED_OUT)
                    }
                    _ => base,
                };
                spans.push(Span::styled(description, style));
            }
        }

        if let NodeData::Todo(todo) = &row.data {
            let due = app
                .formatters
                .format_value(&FieldValue::Date(todo.due), &row.data, &ctx);
            if !due.is_empty() {
                let due_style = if todo.is_overdue() && todo.pending {
                    Style::default().fg(theme.red).bg(row_bg)
                } else {
                    Style::default().fg(theme.yellow).bg(row_bg)
                };
                spans.push(Span::styled(format!("  {}", due), due_style));
            }
            if todo.effort > 0 || todo.urgency > 0 {
                let effort = app
                    .formatters
                    .format_value(&FieldValue::Number(todo.effort), &row.data, &ctx);
                let urgency = app
                    .formatters
                    .format_value(&FieldValue::Number(todo.urgency), &row.data, &ctx);
                spans.push(Span::styled(
                    format!("  e:{} u:{}", effort, urgency),
                    Style::default().fg(theme.cyan).bg(row_bg),
                ));
            }
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Tree continuation guides built from each ancestor's last-sibling flag.
/// The immediate parent's column holds the branch symbol, so its flag is
/// skipped here.
fn guide_prefix(row: &Row) -> String {
    let mut prefix = String::new();
    let ancestors = row.ancestor_last.len().saturating_sub(1);
    for last in row.ancestor_last.iter().take(ancestors) {
        prefix.push_str(if *last { "  " } else { "\u{2502} " });
    }
    if row.depth > 0 {
        prefix.push_str(if row.is_last_sibling {
            "\u{2514} "
        } else {
            "\u{251C} "
        });
    }
    prefix
}

/// Edit buffer split around a block cursor
fn push_edit_buffer(
    spans: &mut Vec<Span<'static>>,
    buffer: &str,
    cursor: usize,
    base: Style,
    theme: &crate::tui::theme::Theme,
    bg: ratatui::style::Color,
) {
    let offset = input::byte_offset(buffer, cursor);
    let (before, after) = buffer.split_at(offset);
    spans.push(Span::styled(before.to_string(), base));
    spans.push(Span::styled(
        "\u{258C}".to_string(),
        Style::default().fg(theme.highlight).bg(bg),
    ));
    spans.push(Span::styled(after.to_string(), base));
}
