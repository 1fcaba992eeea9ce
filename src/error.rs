use thiserror::Error;

use crate::models::Role;

/// Domain failures surfaced to the caller. Storage and I/O problems travel as
/// plain `anyhow` errors; these can be recovered with `downcast_ref`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AppError {
    #[error("invalid session: {0}")]
    InvalidSession(String),
    #[error("not a member of workspace {0}")]
    NotMember(i64),
    #[error("{role} role cannot {action} in workspace {workspace_id}")]
    Forbidden {
        workspace_id: i64,
        role: Role,
        action: &'static str,
    },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("{0}")]
    Validation(String),
    #[error("workspace {0} must keep at least one owner")]
    LastOwner(i64),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
