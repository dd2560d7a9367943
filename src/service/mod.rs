//! Actor-facing entry points.
//!
//! Every call resolves the target to its board, folds "missing" and "other
//! tenant" into one not-found error, and re-checks edit rights on mutation.
//! Nothing is cached between calls.

mod boards;
mod columns;
mod groups;
mod stats;
mod tasks;
mod values;

use crate::access;
use crate::config::BoardConfig;
use crate::db::Database;
use crate::error::{BoardError, BoardResult};
use crate::types::{Actor, Board};
use std::sync::Arc;
use tracing::warn;

/// Board engine entry points over a shared database.
#[derive(Clone)]
pub struct BoardService {
    db: Arc<Database>,
    config: BoardConfig,
}

impl BoardService {
    pub fn new(db: Arc<Database>, config: BoardConfig) -> Self {
        Self { db, config }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Trim a required name, rejecting blanks when configured to.
    fn clean_name(&self, field: &str, name: &str) -> BoardResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() && self.config.reject_blank_names {
            return Err(BoardError::missing_field(field));
        }
        Ok(trimmed.to_string())
    }

    /// The board, if the actor may see it; not-found otherwise.
    fn visible(&self, actor: &Actor, board: Option<Board>, kind: &str, id: &str) -> BoardResult<Board> {
        match board {
            Some(board) if access::can_view(actor, &board) => Ok(board),
            _ => Err(BoardError::not_found(kind, id)),
        }
    }

    /// The board, if the actor may edit it.
    fn editable(&self, actor: &Actor, board: Option<Board>, kind: &str, id: &str) -> BoardResult<Board> {
        let board = self.visible(actor, board, kind, id)?;
        if !access::can_edit(actor, &board) {
            warn!(
                actor = %actor.actor_id,
                role = actor.role.as_str(),
                board_id = %board.id,
                "rejected mutation from read-only actor"
            );
            return Err(BoardError::unauthorized(&actor.actor_id, &board.id));
        }
        Ok(board)
    }
}
