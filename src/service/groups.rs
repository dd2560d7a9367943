//! Group entry points.

use super::BoardService;
use crate::error::{BoardError, BoardResult};
use crate::types::{Actor, Group, GroupPatch};
use tracing::info;

impl BoardService {
    /// Append a group to a board. Without a name it gets the configured default.
    pub fn create_group(&self, actor: &Actor, board_id: &str, name: Option<&str>) -> BoardResult<Group> {
        self.editable(actor, self.db.get_board(board_id)?, "Board", board_id)?;
        let name = match name {
            Some(n) => self.clean_name("name", n)?,
            None => self.config.default_group_name.clone(),
        };
        let group = self.db.create_group(board_id, &name)?;
        info!(board_id, group_id = %group.id, "group created");
        Ok(group)
    }

    pub fn update_group(&self, actor: &Actor, group_id: &str, patch: GroupPatch) -> BoardResult<Group> {
        self.editable(actor, self.db.board_for_group(group_id)?, "Group", group_id)?;
        if patch.color.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(BoardError::invalid_value("color", "color must not be blank"));
        }
        let patch = GroupPatch {
            name: patch
                .name
                .map(|n| self.clean_name("name", &n))
                .transpose()?,
            ..patch
        };
        Ok(self.db.update_group(group_id, &patch)?)
    }

    pub fn move_group(&self, actor: &Actor, group_id: &str, position: i32) -> BoardResult<Group> {
        self.editable(actor, self.db.board_for_group(group_id)?, "Group", group_id)?;
        Ok(self.db.move_group(group_id, position)?)
    }

    /// Delete a group, its tasks and their values. Irreversible; callers
    /// are expected to confirm with the user first.
    pub fn delete_group(&self, actor: &Actor, group_id: &str) -> BoardResult<()> {
        self.editable(actor, self.db.board_for_group(group_id)?, "Group", group_id)?;
        self.db.delete_group(group_id)?;
        info!(group_id, "group deleted");
        Ok(())
    }
}
