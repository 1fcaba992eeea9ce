use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use super::{date_col, decimal_col, enum_col, fmt_date, Database};
use crate::models::*;

/// Filters for listing ledger transactions. `None` means "any".
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionQuery {
    /// "YYYY-MM"
    pub(crate) month: Option<String>,
    pub(crate) category_id: Option<i64>,
    pub(crate) kind: Option<TxnKind>,
    pub(crate) limit: Option<u32>,
}

const TXN_COLUMNS: &str = "t.id, t.workspace_id, t.kind, t.amount, t.currency, t.category_id,
     t.date, t.description, t.notes, t.recurring_id, t.created_at";

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: Some(row.get(0)?),
        workspace_id: row.get(1)?,
        kind: enum_col(row, 2, TxnKind::parse)?,
        amount: decimal_col(row, 3)?,
        currency: row.get(4)?,
        category_id: row.get(5)?,
        date: date_col(row, 6)?,
        description: row.get(7)?,
        notes: row.get(8)?,
        recurring_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get(0)?),
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        kind: enum_col(row, 3, TxnKind::parse)?,
    })
}

impl Database {
    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self, workspace_id: i64) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, workspace_id, name, kind FROM categories WHERE workspace_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![workspace_id], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, workspace_id, name, kind FROM categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()?)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (workspace_id, name, kind) VALUES (?1, ?2, ?3)",
            params![cat.workspace_id, cat.name, cat.kind.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn delete_category(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (workspace_id, kind, amount, currency, category_id, date, description, notes, recurring_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                txn.workspace_id,
                txn.kind.as_str(),
                txn.amount.to_string(),
                txn.currency,
                txn.category_id,
                fmt_date(txn.date),
                txn.description,
                txn.notes,
                txn.recurring_id,
                txn.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {TXN_COLUMNS} FROM transactions t WHERE t.id = ?1"),
                params![id],
                transaction_from_row,
            )
            .optional()?)
    }

    /// Newest first.
    pub(crate) fn get_transactions(
        &self,
        workspace_id: i64,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {TXN_COLUMNS} FROM transactions t WHERE t.workspace_id = ?1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(workspace_id)];

        if let Some(m) = &query.month {
            sql.push_str(&format!(" AND t.date LIKE ?{}", param_values.len() + 1));
            param_values.push(Box::new(format!("{m}-%")));
        }
        if let Some(cid) = query.category_id {
            sql.push_str(&format!(" AND t.category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid));
        }
        if let Some(kind) = query.kind {
            sql.push_str(&format!(" AND t.kind = ?{}", param_values.len() + 1));
            param_values.push(Box::new(kind.as_str()));
        }

        sql.push_str(" ORDER BY t.date DESC, t.id DESC");

        if let Some(l) = query.limit {
            sql.push_str(&format!(" LIMIT {l}"));
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_transaction(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn get_budgets(&self, workspace_id: i64, month: &str) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, workspace_id, category_id, month, limit_amount FROM budgets
             WHERE workspace_id = ?1 AND month = ?2",
        )?;
        let rows = stmt.query_map(params![workspace_id, month], budget_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_budget(&self, id: i64) -> Result<Option<Budget>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, workspace_id, category_id, month, limit_amount FROM budgets WHERE id = ?1",
                params![id],
                budget_from_row,
            )
            .optional()?)
    }

    /// Insert or update the limit for (category, month). Returns the row id.
    pub(crate) fn upsert_budget(&self, budget: &Budget) -> Result<i64> {
        Ok(self.conn.query_row(
            "INSERT INTO budgets (workspace_id, category_id, month, limit_amount)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(category_id, month) DO UPDATE SET limit_amount = ?4
             RETURNING id",
            params![
                budget.workspace_id,
                budget.category_id,
                budget.month,
                budget.limit_amount.to_string(),
            ],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn delete_budget(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM budgets WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: Some(row.get(0)?),
        workspace_id: row.get(1)?,
        category_id: row.get(2)?,
        month: row.get(3)?,
        limit_amount: decimal_col(row, 4)?,
    })
}
