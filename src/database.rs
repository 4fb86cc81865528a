use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::models::{
    MonthGoal, NewTask, Note, Principal, Rule, Session, Task, TaskFilter, TaskPatch,
};
use crate::store::{PlannerStore, SessionStore, StoreError};
use crate::utils::{format_timestamp, max_timestamp, now_timestamp};

const TASK_COLUMNS: &str = "id, user_id, date, content, completed, created_at";

/// SQLite-backed store. One connection, serialized behind a mutex.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests and throwaway servers
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.initialize_schema()?;
        tracing::debug!("database schema ready");
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id              TEXT PRIMARY KEY,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token           TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL,
                expires_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                date            TEXT NOT NULL,
                content         TEXT NOT NULL,
                completed       INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS rules (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                content         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                date            TEXT NOT NULL,
                content         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS month_goals (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                month           TEXT NOT NULL,
                content         TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_user_date ON tasks(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_rules_user ON rules(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_notes_user_date ON notes(user_id, date);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_month_goals_user_month
                ON month_goals(user_id, month);",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Helper function to map a row to a Task
    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        Ok(Task {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            content: row.get(3)?,
            completed: row.get::<_, i64>(4)? != 0,
            created_at: row.get(5)?,
        })
    }

    fn row_to_rule(row: &rusqlite::Row) -> Result<Rule, rusqlite::Error> {
        Ok(Rule {
            id: row.get(0)?,
            user_id: row.get(1)?,
            content: row.get(2)?,
        })
    }

    fn row_to_note(row: &rusqlite::Row) -> Result<Note, rusqlite::Error> {
        Ok(Note {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            content: row.get(3)?,
        })
    }

    fn row_to_month_goal(row: &rusqlite::Row) -> Result<MonthGoal, rusqlite::Error> {
        Ok(MonthGoal {
            id: row.get(0)?,
            user_id: row.get(1)?,
            month: row.get(2)?,
            content: row.get(3)?,
        })
    }

    /// Look up the owner of a row and fail unless it is `user_id`
    fn check_owner(
        conn: &Connection,
        table: &str,
        id: i64,
        user_id: &str,
    ) -> Result<(), StoreError> {
        let owner: Option<String> = conn
            .query_row(
                &format!("SELECT user_id FROM {table} WHERE id = ?1"),
                rusqlite::params![id],
                |row| row.get(0),
            )
            .optional()?;
        match owner {
            None => Err(StoreError::NotFound),
            Some(owner) if owner != user_id => Err(StoreError::Forbidden),
            Some(_) => Ok(()),
        }
    }

    /// Delete a row by ID after verifying ownership, in one transaction
    fn delete_owned(&self, table: &str, id: i64, user_id: &str) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::check_owner(&tx, table, id, user_id)?;
        tx.execute(
            &format!("DELETE FROM {table} WHERE id = ?1"),
            rusqlite::params![id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn not_found(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::from(other),
    }
}

impl PlannerStore for Database {
    /// Tasks ordered by date then id. Both bounds compare as plain strings.
    fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let conn = self.lock()?;
        if let Some((start, end)) = filter.bounds() {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC, id ASC"
            ))?;
            let tasks = stmt
                .query_map(rusqlite::params![user_id, start, end], Self::row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(tasks);
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY date ASC, id ASC"
        ))?;
        let tasks = stmt
            .query_map(rusqlite::params![user_id], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn get_task(&self, id: i64) -> Result<Task, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            rusqlite::params![id],
            Self::row_to_task,
        )
        .map_err(not_found)
    }

    fn create_task(&self, user_id: &str, task: &NewTask) -> Result<Task, StoreError> {
        let conn = self.lock()?;
        let created_at = now_timestamp();
        conn.execute(
            "INSERT INTO tasks (user_id, date, content, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                user_id,
                task.date,
                task.content,
                if task.completed { 1 } else { 0 },
                created_at
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(task_id = id, user_id, "task created");
        Ok(Task {
            id,
            user_id: user_id.to_string(),
            date: task.date.clone(),
            content: task.content.clone(),
            completed: task.completed,
            created_at,
        })
    }

    fn update_task(&self, id: i64, user_id: &str, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::check_owner(&tx, "tasks", id, user_id)?;
        let mut task = tx
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                rusqlite::params![id],
                Self::row_to_task,
            )
            .map_err(not_found)?;
        patch.apply_to(&mut task);
        tx.execute(
            "UPDATE tasks SET date = ?1, content = ?2, completed = ?3 WHERE id = ?4",
            rusqlite::params![
                task.date,
                task.content,
                if task.completed { 1 } else { 0 },
                id
            ],
        )?;
        tx.commit()?;
        Ok(task)
    }

    fn delete_task(&self, id: i64, user_id: &str) -> Result<(), StoreError> {
        self.delete_owned("tasks", id, user_id)
    }

    fn list_rules(&self, user_id: &str) -> Result<Vec<Rule>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, content FROM rules WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let rules = stmt
            .query_map(rusqlite::params![user_id], Self::row_to_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    fn get_rule(&self, id: i64) -> Result<Rule, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, user_id, content FROM rules WHERE id = ?1",
            rusqlite::params![id],
            Self::row_to_rule,
        )
        .map_err(not_found)
    }

    fn create_rule(&self, user_id: &str, content: &str) -> Result<Rule, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO rules (user_id, content) VALUES (?1, ?2)",
            rusqlite::params![user_id, content],
        )?;
        Ok(Rule {
            id: conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            content: content.to_string(),
        })
    }

    fn delete_rule(&self, id: i64, user_id: &str) -> Result<(), StoreError> {
        self.delete_owned("rules", id, user_id)
    }

    fn get_note(&self, user_id: &str, date: &str) -> Result<Option<Note>, StoreError> {
        let conn = self.lock()?;
        let note = conn
            .query_row(
                "SELECT id, user_id, date, content FROM notes WHERE user_id = ?1 AND date = ?2",
                rusqlite::params![user_id, date],
                Self::row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    fn upsert_note(&self, user_id: &str, date: &str, content: &str) -> Result<Note, StoreError> {
        let conn = self.lock()?;
        let note = conn.query_row(
            "INSERT INTO notes (user_id, date, content) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, date) DO UPDATE SET content = excluded.content
             RETURNING id, user_id, date, content",
            rusqlite::params![user_id, date, content],
            Self::row_to_note,
        )?;
        Ok(note)
    }

    fn get_month_goal(&self, user_id: &str, month: &str) -> Result<Option<MonthGoal>, StoreError> {
        let conn = self.lock()?;
        let goal = conn
            .query_row(
                "SELECT id, user_id, month, content FROM month_goals
                 WHERE user_id = ?1 AND month = ?2",
                rusqlite::params![user_id, month],
                Self::row_to_month_goal,
            )
            .optional()?;
        Ok(goal)
    }

    fn upsert_month_goal(
        &self,
        user_id: &str,
        month: &str,
        content: &str,
    ) -> Result<MonthGoal, StoreError> {
        let conn = self.lock()?;
        let goal = conn.query_row(
            "INSERT INTO month_goals (user_id, month, content) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, month) DO UPDATE SET content = excluded.content
             RETURNING id, user_id, month, content",
            rusqlite::params![user_id, month, content],
            Self::row_to_month_goal,
        )?;
        Ok(goal)
    }
}

impl SessionStore for Database {
    fn create_session(&self, user_id: &str, ttl: Duration) -> Result<Session, StoreError> {
        let now = chrono::Utc::now();
        let latest = max_timestamp();
        let expires = chrono::TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .map_or(latest, |at| at.min(latest));
        let session = Session {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            created_at: format_timestamp(now),
            expires_at: format_timestamp(expires),
        };

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
            rusqlite::params![session.user_id, session.created_at],
        )?;
        tx.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                session.token,
                session.user_id,
                session.created_at,
                session.expires_at
            ],
        )?;
        tx.commit()?;
        tracing::info!(user_id, expires_at = %session.expires_at, "session issued");
        Ok(session)
    }

    fn resolve_session(&self, token: &str) -> Result<Option<Principal>, StoreError> {
        let conn = self.lock()?;
        let user_id: Option<String> = conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > ?2",
                rusqlite::params![token, now_timestamp()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id.map(|id| Principal { id }))
    }

    fn revoke_session(&self, token: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE token = ?1",
            rusqlite::params![token],
        )?;
        Ok(removed > 0)
    }

    fn purge_expired_sessions(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            rusqlite::params![now_timestamp()],
        )?;
        Ok(removed)
    }
}
