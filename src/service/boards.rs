//! Board lifecycle and the board assembler.

use super::BoardService;
use crate::access;
use crate::error::{BoardError, BoardResult};
use crate::filter::filter_board;
use crate::types::{Actor, Board, BoardKind, BoardPatch, BoardView};
use tracing::{debug, info};

impl BoardService {
    /// Create a board in the actor's tenant.
    pub fn create_board(
        &self,
        actor: &Actor,
        name: &str,
        kind: BoardKind,
        public_readable: bool,
    ) -> BoardResult<Board> {
        if !access::can_edit_tenant(actor) {
            return Err(BoardError::unauthorized(&actor.actor_id, "(new)"));
        }
        let name = self.clean_name("name", name)?;
        let board = self
            .db
            .create_board(&actor.tenant_id, &name, kind, public_readable)?;
        info!(board_id = %board.id, tenant = %board.tenant_id, "board created");
        Ok(board)
    }

    /// Boards of the actor's tenant that the actor can see.
    pub fn list_boards(&self, actor: &Actor) -> BoardResult<Vec<Board>> {
        let boards = self.db.list_boards(&actor.tenant_id)?;
        Ok(boards
            .into_iter()
            .filter(|b| access::can_view(actor, b))
            .collect())
    }

    pub fn update_board(&self, actor: &Actor, board_id: &str, patch: BoardPatch) -> BoardResult<Board> {
        self.editable(actor, self.db.get_board(board_id)?, "Board", board_id)?;
        let patch = BoardPatch {
            name: patch
                .name
                .map(|n| self.clean_name("name", &n))
                .transpose()?,
            ..patch
        };
        Ok(self.db.update_board(board_id, &patch)?)
    }

    /// Delete a board with all of its groups, tasks, columns and values.
    pub fn delete_board(&self, actor: &Actor, board_id: &str) -> BoardResult<()> {
        self.editable(actor, self.db.get_board(board_id)?, "Board", board_id)?;
        self.db.delete_board(board_id)?;
        info!(board_id, "board deleted");
        Ok(())
    }

    /// Assemble the full board tree for an actor, optionally filtered by a
    /// task-name query. One complete load per call.
    pub fn get_board_view(
        &self,
        actor: &Actor,
        board_id: &str,
        query: Option<&str>,
    ) -> BoardResult<BoardView> {
        let tree = self.db.load_board_tree(board_id)?;
        let tree = match tree {
            Some(tree) if access::can_view(actor, &tree.board) => tree,
            _ => return Err(BoardError::not_found("Board", board_id)),
        };

        let can_edit = access::can_edit(actor, &tree.board);
        let groups = match query {
            Some(q) => filter_board(&tree.groups, q),
            None => tree.groups,
        };
        debug!(board_id, groups = groups.len(), can_edit, "board view assembled");

        Ok(BoardView {
            board: tree.board,
            columns: tree.columns,
            groups,
            members: tree.members,
            can_edit,
        })
    }
}
