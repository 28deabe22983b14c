use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{NewTodo, Todo, TodoChanges, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Access layer for todos.
///
/// Every caller-facing read and write goes through the visible set: records
/// where `owner == caller` and `is_deleted == false`, in insertion order.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn visible_todos(&self, owner: Uuid) -> Result<Vec<Todo>, StoreError>;

    async fn visible_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError>;

    async fn insert_todo(&self, new: NewTodo) -> Result<Todo, StoreError>;

    /// Apply `changes` to a visible record and stamp `updated_at`/`updated_by`.
    /// Returns `None` when the record is not in the owner's visible set.
    async fn update_visible_todo(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoChanges,
        actor: Uuid,
    ) -> Result<Option<Todo>, StoreError>;

    /// Internal lookup ignoring ownership and the soft-delete flag.
    async fn todo_by_id(&self, id: Uuid) -> Result<Option<Todo>, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `StoreError::Conflict` when the username is taken.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store: TodoRepository + UserRepository {
    async fn health_check(&self) -> Result<(), StoreError>;
}
