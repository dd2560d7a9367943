//! Board visibility and edit-rights derivation.
//!
//! A board outside the actor's tenant is indistinguishable from a missing one;
//! callers turn a failed [`can_view`] into a not-found error.

use crate::types::{Actor, Board};

/// Whether the actor may see the board at all.
pub fn can_view(actor: &Actor, board: &Board) -> bool {
    if actor.tenant_id != board.tenant_id {
        return false;
    }
    !actor.role.is_customer_scoped() || board.public_readable
}

/// Whether the actor holds edit rights in its own tenant.
///
/// Customer-scoped roles never edit, even with an override. For everyone
/// else an explicit override from the session layer wins over the role.
pub fn can_edit_tenant(actor: &Actor) -> bool {
    if actor.role.is_customer_scoped() {
        return false;
    }
    actor
        .can_edit_override
        .unwrap_or_else(|| actor.role.is_elevated())
}

/// Whether the actor may mutate the board.
pub fn can_edit(actor: &Actor, board: &Board) -> bool {
    can_view(actor, board) && can_edit_tenant(actor)
}
