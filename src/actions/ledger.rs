use anyhow::Result;

use super::check_category;
use crate::auth::{authorize, Permission, Session};
use crate::db::{Database, TransactionQuery};
use crate::error::AppError;
use crate::models::*;
use crate::report::{self, BudgetLine, Summary};

// ── Categories ────────────────────────────────────────────────

pub(crate) fn list_categories(db: &Database, session: &Session, workspace_id: i64) -> Result<Vec<Category>> {
    authorize(db, session, workspace_id, Permission::View)?;
    db.get_categories(workspace_id)
}

pub(crate) fn add_category(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    name: &str,
    kind: TxnKind,
) -> Result<Category> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("category name is required").into());
    }
    let existing = db.get_categories(workspace_id)?;
    if Category::find_by_name(&existing, name).is_some() {
        return Err(AppError::validation(format!("category '{name}' already exists")).into());
    }
    let mut category = Category::new(workspace_id, name.to_string(), kind);
    category.id = Some(db.insert_category(&category)?);
    Ok(category)
}

pub(crate) fn delete_category(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    category_id: i64,
) -> Result<()> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    check_category(db, workspace_id, Some(category_id), None)?;
    db.delete_category(category_id)
}

// ── Transactions ──────────────────────────────────────────────

pub(crate) fn add_transaction(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    mut txn: Transaction,
) -> Result<Transaction> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    txn.workspace_id = workspace_id;
    txn.recurring_id = None;
    txn.validate()?;
    check_category(db, workspace_id, txn.category_id, Some(txn.kind))?;
    txn.id = Some(db.insert_transaction(&txn)?);
    tracing::info!(workspace_id, transaction_id = ?txn.id, "recorded transaction");
    Ok(txn)
}

pub(crate) fn list_transactions(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    query: &TransactionQuery,
) -> Result<Vec<Transaction>> {
    authorize(db, session, workspace_id, Permission::View)?;
    if let Some(month) = &query.month {
        parse_month(month)?;
    }
    db.get_transactions(workspace_id, query)
}

pub(crate) fn delete_transaction(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    transaction_id: i64,
) -> Result<Transaction> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    let txn = db
        .get_transaction(transaction_id)?
        .filter(|t| t.workspace_id == workspace_id)
        .ok_or(AppError::NotFound {
            kind: "transaction",
            id: transaction_id,
        })?;
    db.delete_transaction(transaction_id)?;
    Ok(txn)
}

// ── Budgets ───────────────────────────────────────────────────

pub(crate) fn set_budget(db: &Database, session: &Session, mut budget: Budget) -> Result<Budget> {
    authorize(db, session, budget.workspace_id, Permission::Edit)?;
    budget.validate()?;
    check_category(
        db,
        budget.workspace_id,
        Some(budget.category_id),
        Some(TxnKind::Expense),
    )?;
    budget.id = Some(db.upsert_budget(&budget)?);
    Ok(budget)
}

/// Budgets of the month with what was actually spent against them.
pub(crate) fn budget_report(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    month: &str,
) -> Result<Vec<BudgetLine>> {
    authorize(db, session, workspace_id, Permission::View)?;
    parse_month(month)?;
    let budgets = db.get_budgets(workspace_id, month)?;
    let categories = db.get_categories(workspace_id)?;
    let txns = db.get_transactions(
        workspace_id,
        &TransactionQuery {
            month: Some(month.to_string()),
            kind: Some(TxnKind::Expense),
            ..Default::default()
        },
    )?;
    Ok(report::budget_vs_actual(&budgets, &categories, &txns))
}

pub(crate) fn delete_budget(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    budget_id: i64,
) -> Result<()> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    db.get_budget(budget_id)?
        .filter(|b| b.workspace_id == workspace_id)
        .ok_or(AppError::NotFound {
            kind: "budget",
            id: budget_id,
        })?;
    db.delete_budget(budget_id)
}

// ── Reports ───────────────────────────────────────────────────

pub(crate) fn monthly_summary(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    month: &str,
) -> Result<Summary> {
    authorize(db, session, workspace_id, Permission::View)?;
    parse_month(month)?;
    let txns = db.get_transactions(
        workspace_id,
        &TransactionQuery {
            month: Some(month.to_string()),
            ..Default::default()
        },
    )?;
    let categories = db.get_categories(workspace_id)?;
    Ok(report::summarize(&txns, &categories))
}

pub(crate) fn export_transactions(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    month: Option<&str>,
    path: &std::path::Path,
) -> Result<usize> {
    let txns = list_transactions(
        db,
        session,
        workspace_id,
        &TransactionQuery {
            month: month.map(str::to_string),
            ..Default::default()
        },
    )?;
    let categories = db.get_categories(workspace_id)?;
    crate::export::export_to_file(path, &txns, &categories)
}
