//! Task entry points.

use super::BoardService;
use crate::error::{BoardError, BoardResult};
use crate::types::{Actor, Task, TaskPatch};
use tracing::{debug, info};

impl BoardService {
    /// Append a task at the end of a group.
    pub fn create_task(&self, actor: &Actor, group_id: &str, name: &str) -> BoardResult<Task> {
        self.editable(actor, self.db.board_for_group(group_id)?, "Group", group_id)?;
        let name = self.clean_name("name", name)?;
        let task = self.db.create_task(group_id, &name)?;
        debug!(group_id, task_id = %task.id, position = task.position, "task created");
        Ok(task)
    }

    pub fn get_task(&self, actor: &Actor, task_id: &str) -> BoardResult<Task> {
        self.visible(actor, self.db.board_for_task(task_id)?, "Task", task_id)?;
        self.db
            .get_task(task_id)?
            .ok_or_else(|| BoardError::not_found("Task", task_id))
    }

    /// Rename, reorder, or move a task to another group of the same board.
    pub fn update_task(&self, actor: &Actor, task_id: &str, patch: TaskPatch) -> BoardResult<Task> {
        self.editable(actor, self.db.board_for_task(task_id)?, "Task", task_id)?;
        let patch = TaskPatch {
            name: patch
                .name
                .map(|n| self.clean_name("name", &n))
                .transpose()?,
            ..patch
        };
        let moved = patch.group_id.is_some() || patch.position.is_some();
        let task = self.db.update_task(task_id, &patch)?;
        if moved {
            info!(task_id, group_id = %task.group_id, position = task.position, "task moved");
        }
        Ok(task)
    }

    /// Delete a task together with its field values.
    pub fn delete_task(&self, actor: &Actor, task_id: &str) -> BoardResult<()> {
        self.editable(actor, self.db.board_for_task(task_id)?, "Task", task_id)?;
        self.db.delete_task(task_id)?;
        info!(task_id, "task deleted");
        Ok(())
    }
}
