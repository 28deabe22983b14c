use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One task, owned by the user who created it.
///
/// Records are never physically removed; `is_deleted` hides them from every
/// caller-facing query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

/// Input for a new record; ownership and audit fields come from the caller.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub owner: Uuid,
    pub title: String,
    pub description: String,
}

/// Mutable fields to overwrite. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl Todo {
    pub fn new(new: NewTodo, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: new.owner,
            title: new.title,
            description: new.description,
            completed: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            created_by: Some(new.owner),
            updated_by: None,
        }
    }

    /// Whether `caller` may see this record at all.
    pub fn is_visible_to(&self, caller: Uuid) -> bool {
        self.owner == caller && !self.is_deleted
    }

    pub fn apply(&mut self, changes: TodoChanges, actor: Uuid, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        if let Some(is_deleted) = changes.is_deleted {
            self.is_deleted = is_deleted;
        }
        self.updated_at = now;
        self.updated_by = Some(actor);
    }
}

impl TodoChanges {
    pub fn soft_delete() -> Self {
        Self {
            is_deleted: Some(true),
            ..Default::default()
        }
    }

    pub fn mark_done() -> Self {
        Self {
            completed: Some(true),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for Todo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}
