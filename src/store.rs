use std::time::Duration;

use thiserror::Error;

use crate::models::{
    MonthGoal, NewTask, Note, Principal, Rule, Session, Task, TaskFilter, TaskPatch,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,
    #[error("Record belongs to another user")]
    Forbidden,
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// Owner-scoped persistence for the four planner record types.
///
/// Mutations that take a `user_id` check ownership themselves and fail with
/// [`StoreError::Forbidden`] rather than touching another user's row.
pub trait PlannerStore: Send + Sync {
    fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;
    fn get_task(&self, id: i64) -> Result<Task, StoreError>;
    fn create_task(&self, user_id: &str, task: &NewTask) -> Result<Task, StoreError>;
    fn update_task(&self, id: i64, user_id: &str, patch: &TaskPatch) -> Result<Task, StoreError>;
    fn delete_task(&self, id: i64, user_id: &str) -> Result<(), StoreError>;

    fn list_rules(&self, user_id: &str) -> Result<Vec<Rule>, StoreError>;
    fn get_rule(&self, id: i64) -> Result<Rule, StoreError>;
    fn create_rule(&self, user_id: &str, content: &str) -> Result<Rule, StoreError>;
    fn delete_rule(&self, id: i64, user_id: &str) -> Result<(), StoreError>;

    fn get_note(&self, user_id: &str, date: &str) -> Result<Option<Note>, StoreError>;
    fn upsert_note(&self, user_id: &str, date: &str, content: &str) -> Result<Note, StoreError>;

    fn get_month_goal(&self, user_id: &str, month: &str) -> Result<Option<MonthGoal>, StoreError>;
    fn upsert_month_goal(
        &self,
        user_id: &str,
        month: &str,
        content: &str,
    ) -> Result<MonthGoal, StoreError>;
}

/// Sessions issued on behalf of the identity provider.
pub trait SessionStore: Send + Sync {
    fn create_session(&self, user_id: &str, ttl: Duration) -> Result<Session, StoreError>;
    /// Expired or unknown tokens resolve to `None`.
    fn resolve_session(&self, token: &str) -> Result<Option<Principal>, StoreError>;
    fn revoke_session(&self, token: &str) -> Result<bool, StoreError>;
    fn purge_expired_sessions(&self) -> Result<usize, StoreError>;
}
