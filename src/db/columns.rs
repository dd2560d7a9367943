//! Column registry: the typed schema of a board.

use super::field_values::clear_removed_status_values;
use super::{Database, Siblings, new_id, now_ms};
use crate::config::StatusOptionRemoval;
use crate::error::BoardError;
use crate::types::{Column, ColumnPatch, ColumnSettings, ColumnType};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

pub fn parse_column_row(row: &Row) -> rusqlite::Result<Column> {
    let type_str: String = row.get("column_type")?;
    let settings_json: String = row.get("settings")?;

    let column_type = ColumnType::from_str(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown column type: {}", type_str).into(),
        )
    })?;

    Ok(Column {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        name: row.get("name")?,
        column_type,
        settings: serde_json::from_str(&settings_json).unwrap_or_default(),
        width: row.get("width")?,
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_column_internal(conn: &Connection, column_id: &str) -> Result<Option<Column>> {
    let column = conn
        .query_row(
            "SELECT * FROM board_columns WHERE id = ?1",
            params![column_id],
            parse_column_row,
        )
        .optional()?;
    Ok(column)
}

pub(crate) fn list_columns_internal(conn: &Connection, board_id: &str) -> Result<Vec<Column>> {
    let mut stmt =
        conn.prepare("SELECT * FROM board_columns WHERE board_id = ?1 ORDER BY position")?;
    let columns = stmt
        .query_map(params![board_id], parse_column_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

impl Database {
    /// Columns of a board in display order.
    pub fn list_columns(&self, board_id: &str) -> Result<Vec<Column>> {
        self.with_conn(|conn| list_columns_internal(conn, board_id))
    }

    pub fn get_column(&self, column_id: &str) -> Result<Option<Column>> {
        self.with_conn(|conn| get_column_internal(conn, column_id))
    }

    /// Append a column at the end of the board's column order.
    pub fn add_column(
        &self,
        board_id: &str,
        name: &str,
        column_type: ColumnType,
        settings: ColumnSettings,
        width: i32,
    ) -> Result<Column> {
        let now = now_ms();
        let settings_json = serde_json::to_string(&settings)?;
        let id = new_id();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let position = Siblings::Columns.next_position(&tx, board_id)?;

            tx.execute(
                "INSERT INTO board_columns (
                    id, board_id, name, column_type, settings, width, position, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    &id,
                    board_id,
                    name,
                    column_type.as_str(),
                    settings_json,
                    width,
                    position,
                    now,
                    now,
                ],
            )?;
            tx.commit()?;

            Ok(Column {
                id,
                board_id: board_id.to_string(),
                name: name.to_string(),
                column_type,
                settings,
                width,
                position,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Apply a name/width/settings/position patch. The type never changes.
    ///
    /// Under [`StatusOptionRemoval::Clear`], values that referenced an option
    /// dropped by the new settings are reset to unset in the same transaction.
    pub fn update_column(
        &self,
        column_id: &str,
        patch: &ColumnPatch,
        removal: StatusOptionRemoval,
    ) -> Result<Column> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let column = get_column_internal(&tx, column_id)?
                .ok_or_else(|| BoardError::not_found("Column", column_id))?;

            let name = patch.name.clone().unwrap_or(column.name.clone());
            let width = patch.width.unwrap_or(column.width);
            let settings = patch.settings.clone().unwrap_or(column.settings.clone());
            let settings_json = serde_json::to_string(&settings)?;

            tx.execute(
                "UPDATE board_columns SET name = ?1, width = ?2, settings = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![name, width, settings_json, now, column_id],
            )?;

            if let Some(position) = patch.position {
                Siblings::Columns.place_at(&tx, &column.board_id, column_id, position)?;
            }

            if patch.settings.is_some()
                && column.column_type == ColumnType::Status
                && removal == StatusOptionRemoval::Clear
            {
                let cleared = clear_removed_status_values(&tx, column_id, &settings)?;
                if cleared > 0 {
                    debug!(column_id, cleared, "cleared values for removed status options");
                }
            }

            let updated = get_column_internal(&tx, column_id)?
                .ok_or_else(|| BoardError::not_found("Column", column_id))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Delete a column. Field values keyed to it are left in place, unreachable.
    pub fn delete_column(&self, column_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(column) = get_column_internal(&tx, column_id)? else {
                return Ok(false);
            };
            tx.execute("DELETE FROM board_columns WHERE id = ?1", params![column_id])?;
            Siblings::Columns.compact(&tx, &column.board_id)?;
            tx.commit()?;
            Ok(true)
        })
    }
}
