use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use super::{decimal_col, fmt_date, Database};
use crate::models::*;

const DEBT_COLUMNS: &str = "id, workspace_id, name, lender, principal, balance, interest_rate,
     minimum_payment, due_day, notes, created_at";

fn debt_from_row(row: &Row<'_>) -> rusqlite::Result<Debt> {
    Ok(Debt {
        id: Some(row.get(0)?),
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        lender: row.get(3)?,
        principal: decimal_col(row, 4)?,
        balance: decimal_col(row, 5)?,
        interest_rate: decimal_col(row, 6)?,
        minimum_payment: decimal_col(row, 7)?,
        due_day: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl Database {
    // ── Debts ─────────────────────────────────────────────────

    pub(crate) fn insert_debt(&self, debt: &Debt) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO debts (workspace_id, name, lender, principal, balance, interest_rate,
                 minimum_payment, due_day, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                debt.workspace_id,
                debt.name,
                debt.lender,
                debt.principal.to_string(),
                debt.balance.to_string(),
                debt.interest_rate.to_string(),
                debt.minimum_payment.to_string(),
                debt.due_day,
                debt.notes,
                debt.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_debts(&self, workspace_id: i64) -> Result<Vec<Debt>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts WHERE workspace_id = ?1 ORDER BY name"
        ))?;
        let rows = stmt.query_map(params![workspace_id], debt_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_debt(&self, id: i64) -> Result<Option<Debt>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {DEBT_COLUMNS} FROM debts WHERE id = ?1"),
                params![id],
                debt_from_row,
            )
            .optional()?)
    }

    /// Store the new balance and the matching ledger expense together.
    pub(crate) fn record_debt_payment(&mut self, debt: &Debt, payment: &Transaction) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE debts SET balance = ?1 WHERE id = ?2",
            params![debt.balance.to_string(), debt.id],
        )?;
        tx.execute(
            "INSERT INTO transactions (workspace_id, kind, amount, currency, category_id, date, description, notes, recurring_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
            params![
                payment.workspace_id,
                payment.kind.as_str(),
                payment.amount.to_string(),
                payment.currency,
                payment.category_id,
                fmt_date(payment.date),
                payment.description,
                payment.notes,
                payment.created_at,
            ],
        )?;
        let txn_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(txn_id)
    }

    pub(crate) fn delete_debt(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM debts WHERE id = ?1", params![id])?;
        Ok(())
    }
}
