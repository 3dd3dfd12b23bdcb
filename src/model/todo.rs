use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::entity::{NodeId, ParentRef, TodoId, extract_tags};

/// A task node. Lives under a workspace or under another todo (sub-task),
/// forming a strict forest rooted inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub parent: ParentRef,
    pub order_index: i64,
    pub description: String,
    pub due: Option<NaiveDateTime>,
    pub effort: u32,
    pub urgency: u32,
    /// A todo starts incomplete
    pub pending: bool,
}

impl Todo {
    pub fn node_id(&self) -> NodeId {
        NodeId::Todo(self.id)
    }

    /// `@`-tags derived from the description; recomputed on every read
    pub fn tags(&self) -> Vec<String> {
        extract_tags(&self.description)
    }

    pub fn toggle_complete(&mut self) {
        self.pending = !self.pending;
    }

    pub fn has_due_date(&self) -> bool {
        self.due.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_completed(&self) -> bool {
        !self.pending
    }

    /// Overdue ⇔ still pending and the due timestamp has passed
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Local::now().naive_local())
    }

    pub fn is_overdue_at(&self, now: NaiveDateTime) -> bool {
        match self.due {
            Some(due) => self.pending && due < now,
            None => false,
        }
    }

    /// Compares only the calendar day, ignoring the time of day
    pub fn is_due_today(&self) -> bool {
        self.is_due_on(Local::now().date_naive())
    }

    pub fn is_due_on(&self, today: NaiveDate) -> bool {
        match self.due {
            Some(due) => due.date() == today,
            None => false,
        }
    }
}
