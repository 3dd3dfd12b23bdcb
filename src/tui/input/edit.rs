use chrono::{NaiveDate, NaiveDateTime};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_segmentation::UnicodeSegmentation;

use crate::model::NodeId;
use crate::ops::order_ops::OpsError;

use crate::tui::app::{App, EditField, EditState, Mode};

/// Begin editing one field of `node`, seeding the buffer from the store
pub(crate) fn start_edit(app: &mut App, node: NodeId, field: EditField) {
    let seeded = seed_buffer(app, node, field);
    let buffer = match seeded {
        Ok(buffer) => buffer,
        Err(e) => {
            app.report_error(&e);
            return;
        }
    };
    let cursor = grapheme_len(&buffer);
    app.edit = Some(EditState {
        node,
        field,
        buffer,
        cursor,
    });
    app.mode = Mode::Edit;
}

fn seed_buffer(app: &App, node: NodeId, field: EditField) -> Result<String, OpsError> {
    match node {
        NodeId::Workspace(id) => {
            let ws = app.store.get_workspace(id)?.ok_or(OpsError::NotFound)?;
            Ok(ws.description)
        }
        NodeId::Todo(id) => {
            let todo = app.store.get_todo(id)?.ok_or(OpsError::NotFound)?;
            Ok(match field {
                EditField::Description => todo.description,
                EditField::Due => todo
                    .due
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                EditField::Effort => todo.effort.to_string(),
                EditField::Urgency => todo.urgency.to_string(),
            })
        }
    }
}

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    let Some(edit) = &mut app.edit else {
        app.mode = Mode::Navigate;
        return;
    };

    match (key.modifiers, key.code) {
        (_, KeyCode::Enter) => {
            commit_edit(app);
        }
        (_, KeyCode::Esc) => {
            app.edit = None;
            app.mode = Mode::Navigate;
        }
        (_, KeyCode::Left) => {
            edit.cursor = edit.cursor.saturating_sub(1);
        }
        (_, KeyCode::Right) => {
            edit.cursor = (edit.cursor + 1).min(grapheme_len(&edit.buffer));
        }
        (_, KeyCode::Home) => {
            edit.cursor = 0;
        }
        (_, KeyCode::End) => {
            edit.cursor = grapheme_len(&edit.buffer);
        }
        (_, KeyCode::Backspace) => {
            if edit.cursor > 0 {
                let start = byte_offset(&edit.buffer, edit.cursor - 1);
                let end = byte_offset(&edit.buffer, edit.cursor);
                edit.buffer.replace_range(start..end, "");
                edit.cursor -= 1;
            }
        }
        (_, KeyCode::Delete) => {
            if edit.cursor < grapheme_len(&edit.buffer) {
                let start = byte_offset(&edit.buffer, edit.cursor);
                let end = byte_offset(&edit.buffer, edit.cursor + 1);
                edit.buffer.replace_range(start..end, "");
            }
        }
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            let offset = byte_offset(&edit.buffer, edit.cursor);
            edit.buffer.insert(offset, c);
            edit.cursor += 1;
        }
        _ => {}
    }
}

/// Write the buffer back to the edited field. A buffer that does not parse
/// for its field is reported and discarded; the stored value stays.
fn commit_edit(app: &mut App) {
    let Some(edit) = app.edit.take() else {
        return;
    };
    app.mode = Mode::Navigate;

    let result = apply_edit(app, &edit);
    match result {
        Ok(()) => app.refresh(),
        Err(e) => app.report_error(&e),
    }
}

fn apply_edit(app: &mut App, edit: &EditState) -> Result<(), CommitError> {
    match edit.node {
        NodeId::Workspace(id) => {
            let mut ws = app
                .store
                .get_workspace(id)
                .map_err(OpsError::from)?
                .ok_or(OpsError::NotFound)?;
            ws.description = edit.buffer.clone();
            app.store.update_workspace(&ws).map_err(OpsError::from)?;
        }
        NodeId::Todo(id) => {
            let mut todo = app
                .store
                .get_todo(id)
                .map_err(OpsError::from)?
                .ok_or(OpsError::NotFound)?;
            match edit.field {
                EditField::Description => todo.description = edit.buffer.clone(),
                EditField::Due => todo.due = parse_due(&edit.buffer)?,
                EditField::Effort => todo.effort = parse_number(&edit.buffer, edit.field)?,
                EditField::Urgency => todo.urgency = parse_number(&edit.buffer, edit.field)?,
            }
            app.store.update_todo(&todo).map_err(OpsError::from)?;
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum CommitError {
    #[error("due must be YYYY-MM-DD or YYYY-MM-DD HH:MM, got \"{0}\"")]
    BadDue(String),
    #[error("{0} must be a non-negative number, got \"{1}\"")]
    BadNumber(&'static str, String),
    #[error(transparent)]
    Ops(#[from] OpsError),
}

/// Empty clears the date; a bare date means midnight
fn parse_due(input: &str) -> Result<Option<NaiveDateTime>, CommitError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(Some(dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(Some(date.and_time(chrono::NaiveTime::MIN)));
    }
    Err(CommitError::BadDue(input.to_string()))
}

fn parse_number(input: &str, field: EditField) -> Result<u32, CommitError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0);
    }
    input
        .parse()
        .map_err(|_| CommitError::BadNumber(field.label(), input.to_string()))
}

// ---------------------------------------------------------------------------
// Grapheme-indexed cursor helpers
// ---------------------------------------------------------------------------

pub(crate) fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Byte offset of the `index`th grapheme (end of string past the last one)
pub(crate) fn byte_offset(s: &str, index: usize) -> usize {
    s.grapheme_indices(true)
        .nth(index)
        .map(|(offset, _)| offset)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn due_parses_date_and_datetime() {
        assert_eq!(parse_due("").unwrap(), None);
        assert_eq!(parse_due("  ").unwrap(), None);
        let midnight = parse_due("2026-08-23").unwrap().unwrap();
        assert_eq!(midnight.format("%H:%M:%S").to_string(), "00:00:00");
        let timed = parse_due("2026-08-23 09:30").unwrap().unwrap();
        assert_eq!(timed.format("%Y-%m-%d %H:%M").to_string(), "2026-08-23 09:30");
        assert!(parse_due("tomorrow").is_err());
    }

    #[test]
    fn numbers_parse_with_empty_as_zero() {
        assert_eq!(parse_number("", EditField::Effort).unwrap(), 0);
        assert_eq!(parse_number("7", EditField::Urgency).unwrap(), 7);
        assert!(parse_number("-1", EditField::Effort).is_err());
        assert!(parse_number("high", EditField::Urgency).is_err());
    }

    #[test]
    fn cursor_helpers_count_graphemes_not_bytes() {
        let s = "a\u{301}bc"; // "a" + combining accent is one grapheme
        assert_eq!(grapheme_len(s), 3);
        assert_eq!(byte_offset(s, 1), 3);
        assert_eq!(byte_offset(s, 99), s.len());
    }
}
