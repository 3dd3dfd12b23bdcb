use std::collections::HashSet;
use std::error::Error;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::model::{Config, NodeId, WorkspaceId};
use crate::store::Store;

use super::flatten::{PaneKind, Row, flatten, row_index};
use super::format::FormatterStore;
use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Edit,
    Filter,
    Confirm,
}

/// Which pane has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Workspaces,
    Todos,
}

impl Pane {
    pub fn kind(self) -> PaneKind {
        match self {
            Pane::Workspaces => PaneKind::Workspaces,
            Pane::Todos => PaneKind::Todos,
        }
    }
}

/// Editable fields of the highlighted node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Description,
    Due,
    Effort,
    Urgency,
}

impl EditField {
    pub fn label(self) -> &'static str {
        match self {
            EditField::Description => "description",
            EditField::Due => "due",
            EditField::Effort => "effort",
            EditField::Urgency => "urgency",
        }
    }
}

/// In-progress edit of one field, with a grapheme-indexed cursor
#[derive(Debug, Clone)]
pub struct EditState {
    pub node: NodeId,
    pub field: EditField,
    pub buffer: String,
    pub cursor: usize,
}

/// A destructive action waiting for explicit confirmation
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteNode(NodeId),
}

#[derive(Debug, Clone)]
pub struct ConfirmState {
    pub message: String,
    pub action: ConfirmAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Transient status-row message; purely presentational
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub expires_at: Instant,
}

/// Per-pane view state: highlight tracked by node id, expand set, and the
/// cached flattened rows (recomputed after every mutation)
#[derive(Debug, Clone, Default)]
pub struct TreeState {
    pub highlighted: Option<NodeId>,
    pub expanded: HashSet<NodeId>,
    pub rows: Vec<Row>,
    /// First visible row (maintained by the renderer)
    pub scroll_offset: usize,
}

impl TreeState {
    pub fn highlight_index(&self) -> Option<usize> {
        self.highlighted.and_then(|id| row_index(&self.rows, id))
    }

    pub fn current_row(&self) -> Option<&Row> {
        self.highlight_index().map(|i| &self.rows[i])
    }

    /// Install a freshly flattened row list, keeping the highlight on the
    /// same node when it is still visible. When it is gone, fall back to
    /// the row that took its index (after a delete that is the sibling that
    /// moved up), else the last row, else nothing.
    pub fn apply_rows(&mut self, rows: Vec<Row>) {
        let old_index = self.highlight_index();
        self.rows = rows;
        let still_visible = self
            .highlighted
            .is_some_and(|id| row_index(&self.rows, id).is_some());
        if !still_visible {
            self.highlighted = match old_index {
                Some(i) if !self.rows.is_empty() => {
                    Some(self.rows[i.min(self.rows.len() - 1)].data.id())
                }
                _ => self.rows.first().map(|row| row.data.id()),
            };
        }
    }

    /// Move the highlight by `delta` rows, clamped to the list
    pub fn move_highlight(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.highlighted = None;
            return;
        }
        let current = self.highlight_index().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, self.rows.len() as isize - 1) as usize;
        self.highlighted = Some(self.rows[next].data.id());
    }

    pub fn highlight_id(&mut self, id: NodeId) {
        self.highlighted = Some(id);
    }
}

/// Main application state
pub struct App {
    pub store: Store,
    pub root: WorkspaceId,
    pub mode: Mode,
    pub pane: Pane,
    pub workspaces: TreeState,
    pub todos: TreeState,
    /// Workspace the todo pane is currently rooted in
    pub todos_root: Option<WorkspaceId>,
    pub filter: String,
    pub edit: Option<EditState>,
    pub confirm: Option<ConfirmState>,
    pub status: Option<StatusMessage>,
    pub formatters: FormatterStore,
    pub theme: Theme,
    pub show_key_hints: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: Store, config: &Config) -> Result<Self, Box<dyn Error>> {
        let root = store.root_workspace()?.id;
        let mut app = App {
            store,
            root,
            mode: Mode::Navigate,
            pane: Pane::Workspaces,
            workspaces: TreeState::default(),
            todos: TreeState::default(),
            todos_root: None,
            filter: String::new(),
            edit: None,
            confirm: None,
            status: None,
            formatters: FormatterStore::with_builtins(),
            theme: Theme::from_config(&config.ui),
            show_key_hints: config.ui.show_key_hints,
            should_quit: false,
        };
        app.refresh();
        Ok(app)
    }

    pub fn focused_state(&self) -> &TreeState {
        match self.pane {
            Pane::Workspaces => &self.workspaces,
            Pane::Todos => &self.todos,
        }
    }

    pub fn focused_state_mut(&mut self) -> &mut TreeState {
        match self.pane {
            Pane::Workspaces => &mut self.workspaces,
            Pane::Todos => &mut self.todos,
        }
    }

    /// Workspace whose todos the right pane shows
    pub fn selected_workspace(&self) -> Option<WorkspaceId> {
        match self.workspaces.highlighted {
            Some(NodeId::Workspace(id)) => Some(id),
            _ => None,
        }
    }

    /// Filter text for one pane; only the focused pane is filtered
    fn pane_filter(&self, pane: Pane) -> Option<&str> {
        (self.pane == pane && !self.filter.is_empty()).then_some(self.filter.as_str())
    }

    /// Recompute both panes' visible rows from the store. Called after every
    /// mutation and after expand/filter changes; on a store failure the old
    /// rows stay and the error lands on the status row.
    pub fn refresh(&mut self) {
        let ws_rows = flatten(
            &self.store,
            PaneKind::Workspaces,
            self.root,
            &self.workspaces.expanded,
            self.pane_filter(Pane::Workspaces),
        );
        match ws_rows {
            Ok(rows) => self.workspaces.apply_rows(rows),
            Err(e) => {
                self.report_error(&e);
                return;
            }
        }

        let selected = self.selected_workspace();
        if selected != self.todos_root {
            // The todo pane switched to a different workspace; its highlight
            // belongs to the old tree.
            self.todos.highlighted = None;
            self.todos.scroll_offset = 0;
            self.todos_root = selected;
        }
        let todo_rows = match selected {
            Some(ws) => flatten(
                &self.store,
                PaneKind::Todos,
                ws,
                &self.todos.expanded,
                self.pane_filter(Pane::Todos),
            ),
            None => Ok(Vec::new()),
        };
        match todo_rows {
            Ok(rows) => self.todos.apply_rows(rows),
            Err(e) => self.report_error(&e),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Info,
            expires_at: Instant::now() + Duration::from_millis(2500),
        });
    }

    pub fn report_error(&mut self, err: &dyn std::fmt::Display) {
        self.status = Some(StatusMessage {
            text: err.to_string(),
            kind: StatusKind::Error,
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    /// Expire the transient status message
    pub fn tick(&mut self) {
        if let Some(status) = &self.status
            && status.expires_at <= Instant::now()
        {
            self.status = None;
        }
    }
}

/// Run the TUI application
pub fn run(db_override: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let store = Store::open(&config.resolve_db_path(db_override))?;
    let mut app = App::new(store, &config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        app.tick();
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
