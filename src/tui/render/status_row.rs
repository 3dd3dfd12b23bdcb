use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, EditField, Mode, StatusKind};

/// Render the status row (bottom of screen). Priority order: confirm prompt,
/// field edit prompt, filter prompt, transient message, then key hints.
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let line = match app.mode {
        Mode::Confirm => {
            let message = app
                .confirm
                .as_ref()
                .map(|c| c.message.as_str())
                .unwrap_or("");
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(app.theme.yellow).bg(bg),
            ))
        }
        Mode::Edit => {
            // Description edits render inline in the tree; the scheduling
            // fields get a prompt here instead
            match app.edit.as_ref().filter(|e| e.field != EditField::Description) {
                Some(edit) => {
                    let spans = vec![
                        Span::styled(
                            format!("{}: {}", edit.field.label(), edit.buffer),
                            Style::default().fg(app.theme.text_bright).bg(bg),
                        ),
                        Span::styled(
                            "\u{258C}",
                            Style::default().fg(app.theme.highlight).bg(bg),
                        ),
                    ];
                    with_hint(spans, "Enter save  Esc cancel", app, width)
                }
                None => {
                    let spans = Vec::new();
                    with_hint(spans, "Enter save  Esc cancel", app, width)
                }
            }
        }
        Mode::Filter => {
            let spans = vec![
                Span::styled(
                    format!("/{}", app.filter),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
            ];
            with_hint(spans, "Enter keep  Esc clear", app, width)
        }
        Mode::Navigate => {
            if let Some(status) = &app.status {
                let fg = match status.kind {
                    StatusKind::Info => app.theme.dim,
                    StatusKind::Error => app.theme.red,
                };
                Line::from(Span::styled(
                    status.text.clone(),
                    Style::default().fg(fg).bg(bg),
                ))
            } else if !app.filter.is_empty() {
                let spans = vec![Span::styled(
                    format!("/{}", app.filter),
                    Style::default().fg(app.theme.dim).bg(bg),
                )];
                with_hint(spans, "Esc clear filter", app, width)
            } else if app.show_key_hints {
                Line::from(Span::styled(
                    "j/k move  Tab pane  z expand  a add  A add child  i edit  c done  x delete  / filter  q quit",
                    Style::default().fg(app.theme.dim).bg(bg),
                ))
            } else {
                Line::from(Span::styled(" ".repeat(width), Style::default().bg(bg)))
            }
        }
    };

    let paragraph = Paragraph::new(line).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Right-align a dim hint after the given spans when it fits
fn with_hint<'a>(mut spans: Vec<Span<'a>>, hint: &'a str, app: &App, width: usize) -> Line<'a> {
    let bg = app.theme.background;
    let content_width: usize = spans.iter().map(|s| s.content.width()).sum();
    let hint_width = hint.width();
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }
    Line::from(spans)
}
