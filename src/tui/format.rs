//! Formatter registry: an ordered chain of pure functions. The most recently
//! added enabled formatter gets the first shot at a value; the first one to
//! return `Some` wins. A built-in default sits at the bottom so every value
//! formats to something.

use chrono::{NaiveDate, NaiveDateTime};

use super::flatten::NodeData;

/// A field value handed to the formatter chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Date(Option<NaiveDateTime>),
    Number(u32),
    Flag(bool),
}

/// Fixed context passed to every formatter
#[derive(Debug, Clone, Copy)]
pub struct FormatCtx {
    pub today: NaiveDate,
}

pub type FormatterFn = fn(&FieldValue<'_>, &NodeData, &FormatCtx) -> Option<String>;

struct Formatter {
    name: String,
    func: FormatterFn,
    disabled: bool,
}

pub struct FormatterStore {
    formatters: Vec<Formatter>,
}

impl Default for FormatterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatterStore {
    /// A store holding only the default formatter
    pub fn new() -> Self {
        let mut store = FormatterStore {
            formatters: Vec::new(),
        };
        store.add("default", default_format);
        store
    }

    /// The chain the TUI starts with: default, then due dates, then the
    /// pending checkbox (added last, so tried first).
    pub fn with_builtins() -> Self {
        let mut store = Self::new();
        store.add("due", format_due);
        store.add("checkbox", format_checkbox);
        store
    }

    /// Register a formatter; it becomes the first one consulted.
    /// Re-adding a name replaces the old entry at the new position.
    pub fn add(&mut self, name: &str, func: FormatterFn) {
        self.remove(name);
        self.formatters.push(Formatter {
            name: name.to_string(),
            func,
            disabled: false,
        });
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.formatters.len();
        self.formatters.retain(|f| f.name != name);
        self.formatters.len() != before
    }

    pub fn disable(&mut self, name: &str) -> bool {
        self.set_disabled(name, true)
    }

    pub fn enable(&mut self, name: &str) -> bool {
        self.set_disabled(name, false)
    }

    fn set_disabled(&mut self, name: &str, disabled: bool) -> bool {
        match self.formatters.iter_mut().find(|f| f.name == name) {
            Some(formatter) => {
                formatter.disabled = disabled;
                true
            }
            None => false,
        }
    }

    /// Run the chain, newest first; the caller never interprets the result
    pub fn format_value(&self, value: &FieldValue<'_>, node: &NodeData, ctx: &FormatCtx) -> String {
        for formatter in self.formatters.iter().rev() {
            if formatter.disabled {
                continue;
            }
            if let Some(text) = (formatter.func)(value, node, ctx) {
                return text;
            }
        }
        "???".to_string()
    }
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

fn default_format(value: &FieldValue<'_>, _node: &NodeData, _ctx: &FormatCtx) -> Option<String> {
    Some(match value {
        FieldValue::Text(text) => (*text).to_string(),
        FieldValue::Date(Some(due)) => due.format("%Y-%m-%d %H:%M").to_string(),
        FieldValue::Date(None) => String::new(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Flag(true) => "x".to_string(),
        FieldValue::Flag(false) => "o".to_string(),
    })
}

/// Dates render compactly: "today" for the current day, date-only when the
/// time is midnight.
fn format_due(value: &FieldValue<'_>, _node: &NodeData, ctx: &FormatCtx) -> Option<String> {
    let FieldValue::Date(due) = value else {
        return None;
    };
    let due = (*due)?;
    if due.date() == ctx.today {
        return Some("today".to_string());
    }
    if due.time() == chrono::NaiveTime::MIN {
        return Some(due.format("%Y-%m-%d").to_string());
    }
    Some(due.format("%Y-%m-%d %H:%M").to_string())
}

fn format_checkbox(value: &FieldValue<'_>, _node: &NodeData, _ctx: &FormatCtx) -> Option<String> {
    match value {
        FieldValue::Flag(pending) => Some(if *pending { "[ ]" } else { "[x]" }.to_string()),
        _ => None,
    }
}
