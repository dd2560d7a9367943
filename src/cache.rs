//! Client-side board state container.
//!
//! Holds the last fetched [`BoardView`]. Structural mutations always refetch
//! the whole board. Field edits are patched into the local view before the
//! write is sent; a failed write rolls the patch back. Under
//! [`FieldEditPolicy::Optimistic`] a successful edit is not followed by a
//! refetch, so the view shows the last applied value, which may be stale if
//! another editor wrote the same cell. [`BoardCache::possibly_stale`]
//! reports that window.

use crate::config::FieldEditPolicy;
use crate::db::now_ms;
use crate::error::{BoardError, BoardResult};
use crate::service::BoardService;
use crate::types::{Actor, BoardView, StoredValue};
use crate::values::validate;
use serde_json::Value;
use tracing::debug;

pub struct BoardCache {
    service: BoardService,
    actor: Actor,
    board_id: String,
    view: BoardView,
    policy: FieldEditPolicy,
    /// Optimistic edits applied since the last full fetch.
    unreconciled: usize,
}

impl BoardCache {
    /// Fetch the board and start tracking it.
    pub fn open(service: BoardService, actor: Actor, board_id: &str) -> BoardResult<Self> {
        let view = service.get_board_view(&actor, board_id, None)?;
        let policy = service.config().field_edits;
        Ok(Self {
            service,
            actor,
            board_id: board_id.to_string(),
            view,
            policy,
            unreconciled: 0,
        })
    }

    pub fn with_policy(mut self, policy: FieldEditPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    pub fn policy(&self) -> FieldEditPolicy {
        self.policy
    }

    /// True when local field edits have not been confirmed by a full fetch.
    pub fn possibly_stale(&self) -> bool {
        self.unreconciled > 0
    }

    /// Replace the local view with a fresh server copy.
    pub fn refresh(&mut self) -> BoardResult<()> {
        self.view = self
            .service
            .get_board_view(&self.actor, &self.board_id, None)?;
        self.unreconciled = 0;
        Ok(())
    }

    /// Run a structural mutation, then refetch on success.
    pub fn mutate<F, T>(&mut self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&BoardService, &Actor) -> BoardResult<T>,
    {
        let out = f(&self.service, &self.actor)?;
        self.refresh()?;
        Ok(out)
    }

    /// Edit one cell: patch locally, write with the local version as token,
    /// then confirm or roll back.
    pub fn edit_field(&mut self, task_id: &str, column_id: &str, raw: Value) -> BoardResult<StoredValue> {
        let column = self
            .view
            .column(column_id)
            .cloned()
            .ok_or_else(|| BoardError::not_found("Column", column_id))?;
        let value = validate(&column, &raw)?;

        let task = self
            .view
            .task_mut(task_id)
            .ok_or_else(|| BoardError::not_found("Task", task_id))?;
        let previous = task.values.get(column_id).cloned();
        let expected = previous.as_ref().map(|v| v.version).unwrap_or(0);

        task.values.insert(
            column_id.to_string(),
            StoredValue {
                value,
                version: expected,
                updated_at: now_ms(),
            },
        );

        let result = self
            .service
            .set_field_value(&self.actor, task_id, column_id, &raw, Some(expected));

        match result {
            Ok(stored) => {
                if let Some(task) = self.view.task_mut(task_id) {
                    task.values.insert(column_id.to_string(), stored.clone());
                }
                match self.policy {
                    FieldEditPolicy::Optimistic => self.unreconciled += 1,
                    FieldEditPolicy::Reconcile => self.refresh()?,
                }
                Ok(stored)
            }
            Err(err) => {
                debug!(task_id, column_id, code = ?err.code, "rolling back field edit");
                if let Some(task) = self.view.task_mut(task_id) {
                    match previous {
                        Some(prev) => {
                            task.values.insert(column_id.to_string(), prev);
                        }
                        None => {
                            task.values.remove(column_id);
                        }
                    }
                }
                Err(err)
            }
        }
    }
}
