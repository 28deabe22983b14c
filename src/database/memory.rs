use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{NewTodo, Todo, TodoChanges, User};
use crate::database::repository::{Store, StoreError, TodoRepository, UserRepository};

/// Process-local store. Vectors keep insertion order, which is the order
/// the visible set is returned in.
#[derive(Debug, Default)]
pub struct MemoryStore {
    todos: RwLock<Vec<Todo>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for MemoryStore {
    async fn visible_todos(&self, owner: Uuid) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().filter(|t| t.is_visible_to(owner)).cloned().collect())
    }

    async fn visible_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .find(|t| t.id == id && t.is_visible_to(owner))
            .cloned())
    }

    async fn insert_todo(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let todo = Todo::new(new, Utc::now());
        self.todos.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn update_visible_todo(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoChanges,
        actor: Uuid,
    ) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.write().await;
        let Some(todo) = todos.iter_mut().find(|t| t.id == id && t.is_visible_to(owner)) else {
            return Ok(None);
        };
        todo.apply(changes, actor, Utc::now());
        Ok(Some(todo.clone()))
    }

    async fn todo_by_id(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == username) {
            return Err(StoreError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }
        let user = User::new(username, password_hash);
        users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
