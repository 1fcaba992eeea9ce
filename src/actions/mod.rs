//! User-facing operations. Each one takes the caller's `Session`
//! explicitly, authorizes against the workspace, validates its input, and
//! only then reads or writes.

mod debts;
mod ledger;
mod recurring;
mod workspaces;

pub(crate) use debts::*;
pub(crate) use ledger::*;
pub(crate) use recurring::*;
pub(crate) use workspaces::*;

use anyhow::Result;

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Category, TxnKind};

/// Resolve an optional category reference, insisting that it belongs to the
/// workspace (and has the expected kind, when one is given).
fn check_category(
    db: &Database,
    workspace_id: i64,
    category_id: Option<i64>,
    kind: Option<TxnKind>,
) -> Result<Option<Category>> {
    let Some(id) = category_id else {
        return Ok(None);
    };
    let category = db
        .get_category_by_id(id)?
        .filter(|c| c.workspace_id == workspace_id)
        .ok_or(AppError::NotFound {
            kind: "category",
            id,
        })?;
    if let Some(kind) = kind {
        if category.kind != kind {
            return Err(AppError::validation(format!(
                "category '{}' is for {} entries, not {kind}",
                category.name, category.kind
            ))
            .into());
        }
    }
    Ok(Some(category))
}

#[cfg(test)]
mod tests;
