//! Column registry entry points.

use super::BoardService;
use crate::error::{BoardError, BoardResult};
use crate::types::{Actor, Column, ColumnPatch, ColumnSettings, ColumnType};
use crate::values::validate_settings;
use tracing::info;

fn check_width(width: i32) -> BoardResult<i32> {
    if width <= 0 {
        return Err(BoardError::invalid_value("width", "width must be positive"));
    }
    Ok(width)
}

impl BoardService {
    pub fn list_columns(&self, actor: &Actor, board_id: &str) -> BoardResult<Vec<Column>> {
        self.visible(actor, self.db.get_board(board_id)?, "Board", board_id)?;
        Ok(self.db.list_columns(board_id)?)
    }

    /// Append a typed column to a board.
    pub fn add_column(
        &self,
        actor: &Actor,
        board_id: &str,
        name: &str,
        column_type: ColumnType,
        settings: Option<ColumnSettings>,
        width: Option<i32>,
    ) -> BoardResult<Column> {
        self.editable(actor, self.db.get_board(board_id)?, "Board", board_id)?;
        let name = self.clean_name("name", name)?;
        let settings = settings.unwrap_or_default();
        validate_settings(column_type, &settings)
            .map_err(|e| BoardError::invalid_value("settings", e.to_string()))?;
        let width = check_width(width.unwrap_or(self.config.default_column_width))?;

        let column = self
            .db
            .add_column(board_id, &name, column_type, settings, width)?;
        info!(board_id, column_id = %column.id, column_type = column_type.as_str(), "column added");
        Ok(column)
    }

    /// Update name, width, settings or position. The column type cannot change.
    pub fn update_column_settings(
        &self,
        actor: &Actor,
        column_id: &str,
        patch: ColumnPatch,
    ) -> BoardResult<Column> {
        self.editable(actor, self.db.board_for_column(column_id)?, "Column", column_id)?;
        let column = self
            .db
            .get_column(column_id)?
            .ok_or_else(|| BoardError::not_found("Column", column_id))?;

        if let Some(ref settings) = patch.settings {
            validate_settings(column.column_type, settings)
                .map_err(|e| BoardError::invalid_value("settings", e.to_string()))?;
        }
        let patch = ColumnPatch {
            name: patch
                .name
                .map(|n| self.clean_name("name", &n))
                .transpose()?,
            width: patch.width.map(check_width).transpose()?,
            ..patch
        };

        Ok(self
            .db
            .update_column(column_id, &patch, self.config.status_option_removal)?)
    }

    /// Delete a column. Values stored under it stay behind, unreachable.
    pub fn delete_column(&self, actor: &Actor, column_id: &str) -> BoardResult<()> {
        self.editable(actor, self.db.board_for_column(column_id)?, "Column", column_id)?;
        self.db.delete_column(column_id)?;
        info!(column_id, "column deleted");
        Ok(())
    }
}
