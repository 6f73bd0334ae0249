//! Stack frame sizing.
//!
//! The prologue must reserve room for every local the body will ever
//! declare. Slots are 8 bytes, handed out in declaration order, and never
//! reused when a scope ends, so the frame size is simply the total
//! declaration count, aligned up to 16 bytes to keep `rsp` aligned at
//! call sites.

use crate::ast::{Statement, StatementKind};

/// Number of local slots a statement declares, recursively.
///
/// Nested function statements are not emitted as part of the surrounding
/// body, so they contribute nothing here.
pub(super) fn slots_in(statement: &Statement) -> usize {
    match &statement.kind {
        StatementKind::Let { .. } => 1,
        StatementKind::If {
            then_branch,
            else_branch,
            ..
        } => slots_in_all(then_branch) + slots_in_all(else_branch),
        StatementKind::While { body, .. } => slots_in_all(body),
        StatementKind::For {
            init,
            update,
            body,
            ..
        } => slots_in(init) + slots_in(update) + slots_in_all(body),
        StatementKind::Assign { .. }
        | StatementKind::Expr(_)
        | StatementKind::Return { .. }
        | StatementKind::Break
        | StatementKind::Continue
        | StatementKind::Function { .. }
        | StatementKind::Import { .. } => 0,
    }
}

/// Total local slots declared by a statement list.
pub(super) fn slots_in_all(statements: &[Statement]) -> usize {
    statements.iter().map(slots_in).sum()
}

/// Frame bytes for a slot count: 8 bytes per slot, aligned up to 16.
pub(super) fn frame_bytes(slots: usize) -> i64 {
    let raw = slots as i64 * 8;
    (raw + 15) & !15
}
