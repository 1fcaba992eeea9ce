mod session;

pub(crate) use session::{Session, SessionSigner};

use anyhow::Result;

use crate::db::Database;
use crate::error::AppError;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Permission {
    /// Read anything in the workspace.
    View,
    /// Create and delete ledger rows, budgets, categories, templates, debts.
    Edit,
    /// Change membership, delete the workspace.
    Manage,
}

impl Permission {
    pub(crate) fn allows(&self, role: Role) -> bool {
        match self {
            Self::View => true,
            Self::Edit => role.can_edit(),
            Self::Manage => role.can_manage(),
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Manage => "manage members",
        }
    }
}

/// Check that the session's user may act on the workspace and return their
/// role. Nothing is read from the workspace before this passes.
pub(crate) fn authorize(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    needed: Permission,
) -> Result<Role> {
    if db.get_workspace(workspace_id)?.is_none() {
        return Err(AppError::NotFound {
            kind: "workspace",
            id: workspace_id,
        }
        .into());
    }
    let role = db
        .get_member_role(workspace_id, session.user_id)?
        .ok_or(AppError::NotMember(workspace_id))?;
    if !needed.allows(role) {
        tracing::debug!(workspace_id, user_id = session.user_id, %role, ?needed, "permission denied");
        return Err(AppError::Forbidden {
            workspace_id,
            role,
            action: needed.action(),
        }
        .into());
    }
    Ok(role)
}
