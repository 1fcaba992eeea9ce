use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::auth::{authorize, Permission, Session};
use crate::db::Database;
use crate::error::AppError;
use crate::models::*;

pub(crate) fn add_debt(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    mut debt: Debt,
) -> Result<Debt> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    debt.workspace_id = workspace_id;
    debt.balance = debt.principal;
    debt.validate()?;
    debt.id = Some(db.insert_debt(&debt)?);
    Ok(debt)
}

pub(crate) fn list_debts(db: &Database, session: &Session, workspace_id: i64) -> Result<Vec<Debt>> {
    authorize(db, session, workspace_id, Permission::View)?;
    db.get_debts(workspace_id)
}

fn load_debt(db: &Database, workspace_id: i64, debt_id: i64) -> Result<Debt> {
    Ok(db
        .get_debt(debt_id)?
        .filter(|d| d.workspace_id == workspace_id)
        .ok_or(AppError::NotFound {
            kind: "debt",
            id: debt_id,
        })?)
}

/// Pay down a debt and log the payment as an expense in the ledger. The
/// ledger entry uses the workspace's "Debt Payments" category when present.
pub(crate) fn pay_debt(
    db: &mut Database,
    session: &Session,
    workspace_id: i64,
    debt_id: i64,
    amount: Decimal,
    date: NaiveDate,
) -> Result<(Debt, Transaction)> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    let mut debt = load_debt(db, workspace_id, debt_id)?;
    let applied = debt.apply_payment(amount)?;

    let currency = db.get_preferences(session.user_id)?.currency;
    let categories = db.get_categories(workspace_id)?;
    let mut payment = Transaction::new(
        workspace_id,
        TxnKind::Expense,
        applied,
        date,
        format!("Debt payment: {}", debt.name),
    );
    payment.currency = currency;
    payment.category_id = Category::find_by_name(&categories, "Debt Payments")
        .filter(|c| c.kind == TxnKind::Expense)
        .and_then(|c| c.id);

    payment.id = Some(db.record_debt_payment(&debt, &payment)?);
    tracing::info!(workspace_id, debt_id, %applied, balance = %debt.balance, "recorded debt payment");
    Ok((debt, payment))
}

pub(crate) fn delete_debt(
    db: &Database,
    session: &Session,
    workspace_id: i64,
    debt_id: i64,
) -> Result<()> {
    authorize(db, session, workspace_id, Permission::Edit)?;
    load_debt(db, workspace_id, debt_id)?;
    db.delete_debt(debt_id)
}
