//! Aggregation queries for dashboards.

use super::BoardService;
use crate::aggregate::{count_by_status_column, stage_breakdown};
use crate::error::{BoardError, BoardResult};
use crate::types::{Actor, BoardView, Column, ColumnType, StageBreakdown, Task};
use std::collections::HashMap;

fn status_column<'a>(view: &'a BoardView, column_id: &str) -> BoardResult<&'a Column> {
    let column = view
        .column(column_id)
        .ok_or_else(|| BoardError::not_found("Column", column_id))?;
    if column.column_type != ColumnType::Status {
        return Err(BoardError::invalid_value(
            "column_id",
            format!("column {} is not a STATUS column", column_id),
        ));
    }
    Ok(column)
}

impl BoardService {
    /// Task counts per option of a STATUS column, zero-filled.
    pub fn count_by_status(
        &self,
        actor: &Actor,
        board_id: &str,
        column_id: &str,
    ) -> BoardResult<HashMap<String, usize>> {
        let view = self.get_board_view(actor, board_id, None)?;
        let column = status_column(&view, column_id)?;
        let tasks: Vec<Task> = view.tasks().cloned().collect();
        Ok(count_by_status_column(
            &tasks,
            column_id,
            &column.settings.option_ids(),
        ))
    }

    /// Ordered per-stage counts with labels and colors.
    pub fn stage_breakdown(
        &self,
        actor: &Actor,
        board_id: &str,
        column_id: &str,
    ) -> BoardResult<StageBreakdown> {
        let view = self.get_board_view(actor, board_id, None)?;
        let column = status_column(&view, column_id)?;
        let tasks: Vec<Task> = view.tasks().cloned().collect();
        Ok(stage_breakdown(column, &tasks))
    }
}
