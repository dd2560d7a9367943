//! Database layer for the task board engine.

pub mod boards;
pub mod columns;
pub mod field_values;
pub mod groups;
pub mod members;
pub mod tasks;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new entity id (UUIDv7, time ordered).
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Ordered sibling sets. Positions within a scope are dense and 0-based.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Siblings {
    /// Columns of a board.
    Columns,
    /// Groups of a board.
    Groups,
    /// Tasks of a group.
    Tasks,
}

impl Siblings {
    fn table(self) -> &'static str {
        match self {
            Siblings::Columns => "board_columns",
            Siblings::Groups => "board_groups",
            Siblings::Tasks => "tasks",
        }
    }

    fn scope(self) -> &'static str {
        match self {
            Siblings::Columns | Siblings::Groups => "board_id",
            Siblings::Tasks => "group_id",
        }
    }

    fn ordered_ids(self, conn: &Connection, scope_id: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1 ORDER BY position, created_at, id",
            self.table(),
            self.scope()
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![scope_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn write_positions(self, conn: &Connection, ids: &[String]) -> Result<()> {
        let sql = format!("UPDATE {} SET position = ?1 WHERE id = ?2", self.table());
        let mut stmt = conn.prepare(&sql)?;
        for (position, id) in ids.iter().enumerate() {
            stmt.execute(params![position as i32, id])?;
        }
        Ok(())
    }

    /// Position for an item appended at the end of the scope.
    pub(crate) fn next_position(self, conn: &Connection, scope_id: &str) -> Result<i32> {
        let sql = format!(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM {} WHERE {} = ?1",
            self.table(),
            self.scope()
        );
        Ok(conn.query_row(&sql, params![scope_id], |row| row.get(0))?)
    }

    /// Renumber the scope 0..n, keeping relative order.
    pub(crate) fn compact(self, conn: &Connection, scope_id: &str) -> Result<()> {
        let ids = self.ordered_ids(conn, scope_id)?;
        self.write_positions(conn, &ids)
    }

    /// Move `item_id` (already in the scope) to `position`, clamped to the
    /// valid range. Returns the position it landed on.
    pub(crate) fn place_at(
        self,
        conn: &Connection,
        scope_id: &str,
        item_id: &str,
        position: i32,
    ) -> Result<i32> {
        let mut ids = self.ordered_ids(conn, scope_id)?;
        ids.retain(|id| id != item_id);
        let index = position.clamp(0, ids.len() as i32) as usize;
        ids.insert(index, item_id.to_string());
        self.write_positions(conn, &ids)?;
        Ok(index as i32)
    }
}
