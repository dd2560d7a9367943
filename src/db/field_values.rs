//! Field value store: one validated value per (task, column), upserted.

use super::columns::get_column_internal;
use super::{Database, now_ms};
use crate::error::BoardError;
use crate::types::{Column, ColumnSettings, ColumnType, FieldValue, StoredValue};
use crate::values::{decode_stored, validate};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

fn current_version(conn: &Connection, task_id: &str, column_id: &str) -> Result<i64> {
    let version: Option<i64> = conn
        .query_row(
            "SELECT version FROM field_values WHERE task_id = ?1 AND column_id = ?2",
            params![task_id, column_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.unwrap_or(0))
}

/// Load every reachable field value for the tasks of a board, keyed by task id.
/// Values whose column is no longer in `column_types` are skipped.
pub(crate) fn load_board_values(
    conn: &Connection,
    board_id: &str,
    column_types: &HashMap<String, ColumnType>,
) -> Result<HashMap<String, BTreeMap<String, StoredValue>>> {
    let mut stmt = conn.prepare(
        "SELECT fv.task_id, fv.column_id, fv.value, fv.version, fv.updated_at
         FROM field_values fv
         INNER JOIN tasks t ON fv.task_id = t.id
         INNER JOIN board_groups g ON t.group_id = g.id
         WHERE g.board_id = ?1",
    )?;

    let rows = stmt
        .query_map(params![board_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut out: HashMap<String, BTreeMap<String, StoredValue>> = HashMap::new();
    for (task_id, column_id, raw, version, updated_at) in rows {
        let Some(column_type) = column_types.get(&column_id) else {
            continue;
        };
        let raw: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        if let Some(value) = decode_stored(*column_type, &raw) {
            out.entry(task_id).or_default().insert(
                column_id,
                StoredValue {
                    value,
                    version,
                    updated_at,
                },
            );
        }
    }
    Ok(out)
}

/// Load the values of a single task for the given columns.
pub(crate) fn load_task_values(
    conn: &Connection,
    task_id: &str,
    column_types: &HashMap<String, ColumnType>,
) -> Result<BTreeMap<String, StoredValue>> {
    let mut stmt = conn.prepare(
        "SELECT column_id, value, version, updated_at FROM field_values WHERE task_id = ?1",
    )?;
    let rows = stmt
        .query_map(params![task_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut values = BTreeMap::new();
    for (column_id, raw, version, updated_at) in rows {
        let Some(column_type) = column_types.get(&column_id) else {
            continue;
        };
        let raw: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        if let Some(value) = decode_stored(*column_type, &raw) {
            values.insert(
                column_id,
                StoredValue {
                    value,
                    version,
                    updated_at,
                },
            );
        }
    }
    Ok(values)
}

/// Reset STATUS values that reference an option no longer in `settings`.
/// Returns how many values were cleared.
pub(crate) fn clear_removed_status_values(
    conn: &Connection,
    column_id: &str,
    settings: &ColumnSettings,
) -> Result<usize> {
    let mut stmt =
        conn.prepare("SELECT task_id, value FROM field_values WHERE column_id = ?1")?;
    let rows = stmt
        .query_map(params![column_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let now = now_ms();
    let mut cleared = 0;
    for (task_id, raw) in rows {
        let raw: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        let stale = match raw.as_str() {
            Some(id) => settings.option(id).is_none(),
            None => false,
        };
        if stale {
            conn.execute(
                "UPDATE field_values SET value = 'null', version = version + 1, updated_at = ?1
                 WHERE task_id = ?2 AND column_id = ?3",
                params![now, task_id, column_id],
            )?;
            cleared += 1;
        }
    }
    Ok(cleared)
}

/// Version check for a write. A stored null counts as "no value", so it also
/// matches an expected version of 0.
fn check_version(
    conn: &Connection,
    task_id: &str,
    column_id: &str,
    expected: i64,
) -> Result<()> {
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT value, version FROM field_values WHERE task_id = ?1 AND column_id = ?2",
            params![task_id, column_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (actual, unset) = match row {
        Some((raw, version)) => (version, raw == "null"),
        None => (0, true),
    };
    if actual == expected || (expected == 0 && unset) {
        Ok(())
    } else {
        Err(BoardError::version_conflict(task_id, column_id, expected, actual).into())
    }
}

/// Resolve the column inside the write transaction. A missing task or
/// column is NotFound.
fn live_column(conn: &Connection, task_id: &str, column_id: &str) -> Result<Column> {
    let task_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        params![task_id],
        |row| row.get(0),
    )?;
    if !task_exists {
        return Err(BoardError::not_found("Task", task_id).into());
    }
    get_column_internal(conn, column_id)?
        .ok_or_else(|| BoardError::not_found("Column", column_id).into())
}

/// Write a raw JSON value: version 1 on insert, +1 on overwrite.
fn write_raw(conn: &Connection, task_id: &str, column_id: &str, raw: &str, now: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO field_values (task_id, column_id, value, version, updated_at)
         VALUES (?1, ?2, ?3, 1, ?4)
         ON CONFLICT(task_id, column_id) DO UPDATE SET
            value = excluded.value,
            version = field_values.version + 1,
            updated_at = excluded.updated_at",
        params![task_id, column_id, raw, now],
    )?;
    current_version(conn, task_id, column_id)
}

impl Database {
    /// Insert or overwrite the value for (task, column).
    ///
    /// The value is re-checked against the column as it stands inside the
    /// transaction. With `expected_version` the write only succeeds if the
    /// stored version still matches (0 meaning "no value"); without it, last
    /// write wins.
    pub fn upsert_field_value(
        &self,
        task_id: &str,
        column_id: &str,
        value: &FieldValue,
        expected_version: Option<i64>,
    ) -> Result<StoredValue> {
        let now = now_ms();
        let raw_value = value.to_raw();
        let raw = serde_json::to_string(&raw_value)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let column = live_column(&tx, task_id, column_id)?;
            validate(&column, &raw_value).map_err(BoardError::from)?;
            if let Some(expected) = expected_version {
                check_version(&tx, task_id, column_id, expected)?;
            }

            let version = write_raw(&tx, task_id, column_id, &raw, now)?;
            tx.commit()?;

            Ok(StoredValue {
                value: value.clone(),
                version,
                updated_at: now,
            })
        })
    }

    /// The current value for (task, column). Absent values, and values of
    /// deleted columns, read as None.
    pub fn get_field_value(&self, task_id: &str, column_id: &str) -> Result<Option<StoredValue>> {
        self.with_conn(|conn| {
            let Some(column) = get_column_internal(conn, column_id)? else {
                return Ok(None);
            };
            let row = conn
                .query_row(
                    "SELECT value, version, updated_at FROM field_values
                     WHERE task_id = ?1 AND column_id = ?2",
                    params![task_id, column_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                        ))
                    },
                )
                .optional()?;

            Ok(row.and_then(|(raw, version, updated_at)| {
                let raw: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
                decode_stored(column.column_type, &raw).map(|value| StoredValue {
                    value,
                    version,
                    updated_at,
                })
            }))
        })
    }

    /// Make the value for (task, column) unset. The row is kept as a null
    /// with its version bumped, so stale tokens still conflict afterwards.
    /// Returns the new version.
    pub fn clear_field_value(
        &self,
        task_id: &str,
        column_id: &str,
        expected_version: Option<i64>,
    ) -> Result<i64> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            live_column(&tx, task_id, column_id)?;
            if let Some(expected) = expected_version {
                check_version(&tx, task_id, column_id, expected)?;
            }

            let version = write_raw(&tx, task_id, column_id, "null", now)?;
            tx.commit()?;
            Ok(version)
        })
    }

    /// Number of stored rows keyed to a task, reachable or not.
    pub fn count_field_values(&self, task_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM field_values WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}
