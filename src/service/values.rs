//! Field value entry points.

use super::BoardService;
use crate::config::ConcurrencyMode;
use crate::error::{BoardError, BoardResult};
use crate::types::{Actor, Board, Column, StoredValue};
use crate::values::validate;
use serde_json::Value;
use tracing::debug;

impl BoardService {
    /// The token to enforce under the configured concurrency mode.
    fn expected_version(&self, given: Option<i64>) -> BoardResult<Option<i64>> {
        match self.config.concurrency {
            ConcurrencyMode::LastWriteWins => Ok(None),
            ConcurrencyMode::Versioned => given
                .map(Some)
                .ok_or_else(|| BoardError::missing_field("expected_version")),
        }
    }

    /// The column, if it belongs to `board`. Columns of other boards are not found.
    fn board_column(&self, board: &Board, column_id: &str) -> BoardResult<Column> {
        match self.db.get_column(column_id)? {
            Some(column) if column.board_id == board.id => Ok(column),
            _ => Err(BoardError::not_found("Column", column_id)),
        }
    }

    /// Validate and upsert the value of one cell.
    ///
    /// Under [`ConcurrencyMode::Versioned`] the caller must pass the version
    /// it last saw (0 for an empty or cleared cell); otherwise the token is
    /// ignored and the later write wins.
    pub fn set_field_value(
        &self,
        actor: &Actor,
        task_id: &str,
        column_id: &str,
        raw: &Value,
        expected_version: Option<i64>,
    ) -> BoardResult<StoredValue> {
        let board = self.editable(actor, self.db.board_for_task(task_id)?, "Task", task_id)?;
        let column = self.board_column(&board, column_id)?;
        let value = validate(&column, raw)?;

        let expected = self.expected_version(expected_version)?;

        let stored = self
            .db
            .upsert_field_value(task_id, column_id, &value, expected)?;
        debug!(task_id, column_id, version = stored.version, "field value set");
        Ok(stored)
    }

    /// Unset one cell. Returns the cell's new version, which a later
    /// versioned write must name.
    pub fn clear_field_value(
        &self,
        actor: &Actor,
        task_id: &str,
        column_id: &str,
        expected_version: Option<i64>,
    ) -> BoardResult<i64> {
        let board = self.editable(actor, self.db.board_for_task(task_id)?, "Task", task_id)?;
        self.board_column(&board, column_id)?;
        let expected = self.expected_version(expected_version)?;

        let version = self.db.clear_field_value(task_id, column_id, expected)?;
        debug!(task_id, column_id, version, "field value cleared");
        Ok(version)
    }

    /// The value of one cell; None when unset.
    pub fn get_field_value(
        &self,
        actor: &Actor,
        task_id: &str,
        column_id: &str,
    ) -> BoardResult<Option<StoredValue>> {
        let board = self.visible(actor, self.db.board_for_task(task_id)?, "Task", task_id)?;
        self.board_column(&board, column_id)?;
        Ok(self.db.get_field_value(task_id, column_id)?)
    }
}
