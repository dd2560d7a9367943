//! Group store: ordered, collapsible containers of tasks within a board.

use super::{Database, Siblings, new_id, now_ms};
use crate::error::BoardError;
use crate::types::{Group, GroupPatch};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Colors handed out to new groups, cycling by position.
pub const GROUP_COLORS: [&str; 8] = [
    "#579BFC", "#A25DDC", "#00C875", "#FDAB3D", "#E2445C", "#037F4C", "#FF642E", "#784BD1",
];

pub fn parse_group_row(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        collapsed: row.get("collapsed")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_group_internal(conn: &Connection, group_id: &str) -> Result<Option<Group>> {
    let group = conn
        .query_row(
            "SELECT * FROM board_groups WHERE id = ?1",
            params![group_id],
            parse_group_row,
        )
        .optional()?;
    Ok(group)
}

pub(crate) fn list_groups_internal(conn: &Connection, board_id: &str) -> Result<Vec<Group>> {
    let mut stmt =
        conn.prepare("SELECT * FROM board_groups WHERE board_id = ?1 ORDER BY position")?;
    let groups = stmt
        .query_map(params![board_id], parse_group_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(groups)
}

impl Database {
    /// Append a group at the end of the board.
    pub fn create_group(&self, board_id: &str, name: &str) -> Result<Group> {
        let now = now_ms();
        let id = new_id();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let position = Siblings::Groups.next_position(&tx, board_id)?;
            let color = GROUP_COLORS[position as usize % GROUP_COLORS.len()];

            tx.execute(
                "INSERT INTO board_groups (id, board_id, name, color, collapsed, position, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7)",
                params![&id, board_id, name, color, position, now, now],
            )?;
            tx.commit()?;

            Ok(Group {
                id,
                board_id: board_id.to_string(),
                name: name.to_string(),
                color: color.to_string(),
                collapsed: false,
                position,
                created_at: now,
                updated_at: now,
            })
        })
    }

    pub fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        self.with_conn(|conn| get_group_internal(conn, group_id))
    }

    /// Groups of a board in display order, without their tasks.
    pub fn list_groups(&self, board_id: &str) -> Result<Vec<Group>> {
        self.with_conn(|conn| list_groups_internal(conn, board_id))
    }

    pub fn update_group(&self, group_id: &str, patch: &GroupPatch) -> Result<Group> {
        let now = now_ms();
        self.with_conn(|conn| {
            let group = get_group_internal(conn, group_id)?
                .ok_or_else(|| BoardError::not_found("Group", group_id))?;

            conn.execute(
                "UPDATE board_groups SET name = ?1, color = ?2, collapsed = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    patch.name.as_deref().unwrap_or(&group.name),
                    patch.color.as_deref().unwrap_or(&group.color),
                    patch.collapsed.unwrap_or(group.collapsed),
                    now,
                    group_id,
                ],
            )?;

            get_group_internal(conn, group_id)?
                .ok_or_else(|| anyhow::Error::from(BoardError::not_found("Group", group_id)))
        })
    }

    /// Reorder a group within its board.
    pub fn move_group(&self, group_id: &str, position: i32) -> Result<Group> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let group = get_group_internal(&tx, group_id)?
                .ok_or_else(|| BoardError::not_found("Group", group_id))?;
            Siblings::Groups.place_at(&tx, &group.board_id, group_id, position)?;
            let moved = get_group_internal(&tx, group_id)?
                .ok_or_else(|| BoardError::not_found("Group", group_id))?;
            tx.commit()?;
            Ok(moved)
        })
    }

    /// Delete a group with its tasks and their field values, leaves first,
    /// then close the gap in the board's group order.
    pub fn delete_group(&self, group_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(group) = get_group_internal(&tx, group_id)? else {
                return Ok(false);
            };

            tx.execute(
                "DELETE FROM field_values WHERE task_id IN (
                    SELECT id FROM tasks WHERE group_id = ?1
                 )",
                params![group_id],
            )?;
            tx.execute("DELETE FROM tasks WHERE group_id = ?1", params![group_id])?;
            tx.execute("DELETE FROM board_groups WHERE id = ?1", params![group_id])?;
            Siblings::Groups.compact(&tx, &group.board_id)?;

            tx.commit()?;
            Ok(true)
        })
    }
}
