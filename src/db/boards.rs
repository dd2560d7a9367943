//! Board persistence and the board-wide cascade delete.

use super::columns::list_columns_internal;
use super::groups::list_groups_internal;
use super::members::list_members_internal;
use super::tasks::list_board_tasks_internal;
use super::{Database, new_id, now_ms};
use crate::error::BoardError;
use crate::types::{Board, BoardKind, BoardPatch, Column, GroupView, Member};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Everything stored for one board, loaded under a single lock.
#[derive(Debug, Clone)]
pub struct BoardTree {
    pub board: Board,
    pub columns: Vec<Column>,
    pub groups: Vec<GroupView>,
    pub members: Vec<Member>,
}

pub fn parse_board_row(row: &Row) -> rusqlite::Result<Board> {
    let kind: String = row.get("kind")?;
    Ok(Board {
        id: row.get("id")?,
        tenant_id: row.get("tenant_id")?,
        name: row.get("name")?,
        kind: BoardKind::from_str(&kind).unwrap_or_default(),
        public_readable: row.get("public_readable")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_board_internal(conn: &Connection, board_id: &str) -> Result<Option<Board>> {
    let board = conn
        .query_row(
            "SELECT * FROM boards WHERE id = ?1",
            params![board_id],
            parse_board_row,
        )
        .optional()?;
    Ok(board)
}

fn board_via(conn: &Connection, sql: &str, id: &str) -> Result<Option<Board>> {
    Ok(conn.query_row(sql, params![id], parse_board_row).optional()?)
}

impl Database {
    pub fn create_board(
        &self,
        tenant_id: &str,
        name: &str,
        kind: BoardKind,
        public_readable: bool,
    ) -> Result<Board> {
        let now = now_ms();
        let board = Board {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            kind,
            public_readable,
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO boards (id, tenant_id, name, kind, public_readable, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    &board.id,
                    &board.tenant_id,
                    &board.name,
                    board.kind.as_str(),
                    board.public_readable,
                    board.created_at,
                    board.updated_at,
                ],
            )?;
            Ok(())
        })?;

        Ok(board)
    }

    pub fn get_board(&self, board_id: &str) -> Result<Option<Board>> {
        self.with_conn(|conn| get_board_internal(conn, board_id))
    }

    /// All boards of a tenant, oldest first.
    pub fn list_boards(&self, tenant_id: &str) -> Result<Vec<Board>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM boards WHERE tenant_id = ?1 ORDER BY created_at, id",
            )?;
            let boards = stmt
                .query_map(params![tenant_id], parse_board_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(boards)
        })
    }

    pub fn update_board(&self, board_id: &str, patch: &BoardPatch) -> Result<Board> {
        let now = now_ms();
        self.with_conn(|conn| {
            let board = get_board_internal(conn, board_id)?
                .ok_or_else(|| BoardError::not_found("Board", board_id))?;
            let name = patch.name.clone().unwrap_or(board.name);
            let kind = patch.kind.unwrap_or(board.kind);
            let public_readable = patch.public_readable.unwrap_or(board.public_readable);

            conn.execute(
                "UPDATE boards SET name = ?1, kind = ?2, public_readable = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![name, kind.as_str(), public_readable, now, board_id],
            )?;

            get_board_internal(conn, board_id)?
                .ok_or_else(|| anyhow::Error::from(BoardError::not_found("Board", board_id)))
        })
    }

    /// Delete a board and everything it owns, leaves first:
    /// field values, tasks, groups, columns, then the board.
    pub fn delete_board(&self, board_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "DELETE FROM field_values WHERE task_id IN (
                    SELECT t.id FROM tasks t
                    INNER JOIN board_groups g ON t.group_id = g.id
                    WHERE g.board_id = ?1
                 ) OR column_id IN (SELECT id FROM board_columns WHERE board_id = ?1)",
                params![board_id],
            )?;
            tx.execute(
                "DELETE FROM tasks WHERE group_id IN (
                    SELECT id FROM board_groups WHERE board_id = ?1
                 )",
                params![board_id],
            )?;
            tx.execute("DELETE FROM board_groups WHERE board_id = ?1", params![board_id])?;
            tx.execute("DELETE FROM board_columns WHERE board_id = ?1", params![board_id])?;
            let deleted = tx.execute("DELETE FROM boards WHERE id = ?1", params![board_id])?;

            tx.commit()?;
            Ok(deleted > 0)
        })
    }

    /// Load schema, groups, tasks, values and the tenant's members in one pass.
    pub fn load_board_tree(&self, board_id: &str) -> Result<Option<BoardTree>> {
        self.with_conn(|conn| {
            let Some(board) = get_board_internal(conn, board_id)? else {
                return Ok(None);
            };
            let columns = list_columns_internal(conn, board_id)?;
            let mut tasks = list_board_tasks_internal(conn, board_id)?;
            let groups = list_groups_internal(conn, board_id)?
                .into_iter()
                .map(|group| {
                    let tasks = tasks.remove(&group.id).unwrap_or_default();
                    GroupView { group, tasks }
                })
                .collect();
            let members = list_members_internal(conn, &board.tenant_id)?;

            Ok(Some(BoardTree {
                board,
                columns,
                groups,
                members,
            }))
        })
    }

    pub fn board_for_group(&self, group_id: &str) -> Result<Option<Board>> {
        self.with_conn(|conn| {
            board_via(
                conn,
                "SELECT b.* FROM boards b
                 INNER JOIN board_groups g ON g.board_id = b.id
                 WHERE g.id = ?1",
                group_id,
            )
        })
    }

    pub fn board_for_task(&self, task_id: &str) -> Result<Option<Board>> {
        self.with_conn(|conn| {
            board_via(
                conn,
                "SELECT b.* FROM boards b
                 INNER JOIN board_groups g ON g.board_id = b.id
                 INNER JOIN tasks t ON t.group_id = g.id
                 WHERE t.id = ?1",
                task_id,
            )
        })
    }

    pub fn board_for_column(&self, column_id: &str) -> Result<Option<Board>> {
        self.with_conn(|conn| {
            board_via(
                conn,
                "SELECT b.* FROM boards b
                 INNER JOIN board_columns c ON c.board_id = b.id
                 WHERE c.id = ?1",
                column_id,
            )
        })
    }
}
