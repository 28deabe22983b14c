use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{NewTodo, Todo, TodoChanges, User};
use crate::database::repository::{Store, StoreError, TodoRepository, UserRepository};
use crate::database::schema::{TODOS, USERS};

/// Store backed by PostgreSQL. Each mutation is a single statement, so
/// concurrent writers are serialized by the database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TodoRepository for PgStore {
    async fn visible_todos(&self, owner: Uuid) -> Result<Vec<Todo>, StoreError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE owner = $1 AND is_deleted = FALSE ORDER BY created_at, id",
            TODOS.select_list(),
            TODOS.name
        );
        let rows = sqlx::query_as::<_, Todo>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn visible_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE id = $1 AND owner = $2 AND is_deleted = FALSE",
            TODOS.select_list(),
            TODOS.name
        );
        let row = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_todo(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let sql = format!(
            "INSERT INTO \"{}\" (id, owner, title, description, created_by) \
             VALUES ($1, $2, $3, $4, $2) RETURNING {}",
            TODOS.name,
            TODOS.select_list()
        );
        let row = sqlx::query_as::<_, Todo>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.owner)
            .bind(new.title)
            .bind(new.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_visible_todo(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoChanges,
        actor: Uuid,
    ) -> Result<Option<Todo>, StoreError> {
        let sql = format!(
            "UPDATE \"{}\" SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                completed = COALESCE($5, completed), \
                is_deleted = COALESCE($6, is_deleted), \
                updated_at = NOW(), \
                updated_by = $7 \
             WHERE id = $1 AND owner = $2 AND is_deleted = FALSE \
             RETURNING {}",
            TODOS.name,
            TODOS.select_list()
        );
        let row = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.completed)
            .bind(changes.is_deleted)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn todo_by_id(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE id = $1",
            TODOS.select_list(),
            TODOS.name
        );
        let row = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO \"{}\" (id, username, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USERS.name,
            USERS.select_list()
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Conflict(
                "A user with that username already exists.".to_string(),
            )),
            Err(other) => Err(other.into()),
        }
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM \"{}\" WHERE id = $1", USERS.select_list(), USERS.name);
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE username = $1",
            USERS.select_list(),
            USERS.name
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
