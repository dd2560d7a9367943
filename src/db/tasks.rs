//! Task store: ordered rows within a group.

use super::columns::list_columns_internal;
use super::field_values::{load_board_values, load_task_values};
use super::groups::get_group_internal;
use super::{Database, Siblings, new_id, now_ms};
use crate::error::BoardError;
use crate::types::{ColumnType, Task, TaskPatch};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::{BTreeMap, HashMap};

/// Parse a task row. Field values are attached separately.
pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        group_id: row.get("group_id")?,
        name: row.get("name")?,
        position: row.get("position")?,
        values: BTreeMap::new(),
        comment_count: row.get("comment_count")?,
        subitem_count: row.get("subitem_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn column_types(conn: &Connection, board_id: &str) -> Result<HashMap<String, ColumnType>> {
    Ok(list_columns_internal(conn, board_id)?
        .into_iter()
        .map(|c| (c.id, c.column_type))
        .collect())
}

/// Internal helper to get a task with its values using an existing connection.
pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .optional()?;

    let Some(mut task) = task else {
        return Ok(None);
    };
    if let Some(group) = get_group_internal(conn, &task.group_id)? {
        let types = column_types(conn, &group.board_id)?;
        task.values = load_task_values(conn, &task.id, &types)?;
    }
    Ok(Some(task))
}

/// Every task of a board with its values, keyed by group id, each list in position order.
pub(crate) fn list_board_tasks_internal(
    conn: &Connection,
    board_id: &str,
) -> Result<HashMap<String, Vec<Task>>> {
    let mut stmt = conn.prepare(
        "SELECT t.* FROM tasks t
         INNER JOIN board_groups g ON t.group_id = g.id
         WHERE g.board_id = ?1
         ORDER BY t.group_id, t.position",
    )?;
    let tasks = stmt
        .query_map(params![board_id], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let types = column_types(conn, board_id)?;
    let mut values = load_board_values(conn, board_id, &types)?;

    let mut by_group: HashMap<String, Vec<Task>> = HashMap::new();
    for mut task in tasks {
        task.values = values.remove(&task.id).unwrap_or_default();
        by_group.entry(task.group_id.clone()).or_default().push(task);
    }
    Ok(by_group)
}

impl Database {
    /// Append a task at the end of the group (position = max + 1).
    pub fn create_task(&self, group_id: &str, name: &str) -> Result<Task> {
        let now = now_ms();
        let id = new_id();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let position = Siblings::Tasks.next_position(&tx, group_id)?;

            tx.execute(
                "INSERT INTO tasks (id, group_id, name, position, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![&id, group_id, name, position, now, now],
            )?;
            tx.commit()?;

            Ok(Task {
                id,
                group_id: group_id.to_string(),
                name: name.to_string(),
                position,
                values: BTreeMap::new(),
                comment_count: 0,
                subitem_count: 0,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Get a task with its field values.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Tasks of one group in position order, with their field values.
    pub fn list_tasks(&self, group_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let Some(group) = get_group_internal(conn, group_id)? else {
                return Ok(Vec::new());
            };
            let mut by_group = list_board_tasks_internal(conn, &group.board_id)?;
            Ok(by_group.remove(group_id).unwrap_or_default())
        })
    }

    /// Rename and/or move a task.
    ///
    /// A new `group_id` moves the task to that group (same board only),
    /// appended unless `position` is also given. Positions are clamped.
    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| BoardError::not_found("Task", task_id))?;

            if let Some(ref name) = patch.name {
                tx.execute(
                    "UPDATE tasks SET name = ?1, updated_at = ?2 WHERE id = ?3",
                    params![name, now, task_id],
                )?;
            }

            let target_group = patch
                .group_id
                .as_deref()
                .filter(|g| *g != task.group_id);

            if let Some(target) = target_group {
                let from = get_group_internal(&tx, &task.group_id)?
                    .ok_or_else(|| BoardError::not_found("Group", &task.group_id))?;
                let to = get_group_internal(&tx, target)?
                    .ok_or_else(|| BoardError::not_found("Group", target))?;
                if to.board_id != from.board_id {
                    return Err(BoardError::invalid_value(
                        "group_id",
                        "tasks cannot move between boards",
                    )
                    .into());
                }

                let end = Siblings::Tasks.next_position(&tx, target)?;
                tx.execute(
                    "UPDATE tasks SET group_id = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
                    params![target, end, now, task_id],
                )?;
                Siblings::Tasks.compact(&tx, &from.id)?;
                if let Some(position) = patch.position {
                    Siblings::Tasks.place_at(&tx, target, task_id, position)?;
                }
            } else if let Some(position) = patch.position {
                Siblings::Tasks.place_at(&tx, &task.group_id, task_id, position)?;
                tx.execute(
                    "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
                    params![now, task_id],
                )?;
            }

            let updated = get_task_internal(&tx, task_id)?
                .ok_or_else(|| BoardError::not_found("Task", task_id))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Delete a task and its field values, then close the gap in its group.
    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let group_id: Option<String> = tx
                .query_row(
                    "SELECT group_id FROM tasks WHERE id = ?1",
                    params![task_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(group_id) = group_id else {
                return Ok(false);
            };

            tx.execute("DELETE FROM field_values WHERE task_id = ?1", params![task_id])?;
            tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Siblings::Tasks.compact(&tx, &group_id)?;

            tx.commit()?;
            Ok(true)
        })
    }

    /// Overwrite the denormalized counters. Called by the comment and
    /// sub-item subsystems, never by board editors.
    pub fn set_task_counters(&self, task_id: &str, comments: i64, subitems: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks SET comment_count = MAX(?1, 0), subitem_count = MAX(?2, 0)
                 WHERE id = ?3",
                params![comments, subitems, task_id],
            )?;
            Ok(updated > 0)
        })
    }

    /// Adjust the counters by a delta, floored at zero.
    pub fn adjust_task_counters(
        &self,
        task_id: &str,
        comments_delta: i64,
        subitems_delta: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks SET
                    comment_count = MAX(comment_count + ?1, 0),
                    subitem_count = MAX(subitem_count + ?2, 0)
                 WHERE id = ?3",
                params![comments_delta, subitems_delta, task_id],
            )?;
            Ok(updated > 0)
        })
    }
}
