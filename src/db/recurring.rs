use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{date_col, decimal_col, enum_col, fmt_date, opt_date_col, opt_timestamp_col, Database};
use crate::models::*;
use crate::recurring::{LedgerStore, TemplateStore};

const RECURRING_COLUMNS: &str = "id, workspace_id, name, category_id, kind, amount, currency,
     frequency, start_date, end_date, next_due_date, last_processed_at, is_active, notes, created_at, completed_at";

fn recurring_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringTransaction> {
    Ok(RecurringTransaction {
        id: Some(row.get(0)?),
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        category_id: row.get(3)?,
        kind: enum_col(row, 4, TxnKind::parse)?,
        amount: decimal_col(row, 5)?,
        currency: row.get(6)?,
        frequency: enum_col(row, 7, Frequency::parse)?,
        start_date: date_col(row, 8)?,
        end_date: opt_date_col(row, 9)?,
        next_due_date: date_col(row, 10)?,
        last_processed_at: opt_timestamp_col(row, 11)?,
        is_active: row.get(12)?,
        notes: row.get(13)?,
        created_at: row.get(14)?,
        completed_at: opt_timestamp_col(row, 15)?,
    })
}

impl Database {
    // ── Recurring templates ───────────────────────────────────

    pub(crate) fn insert_recurring(&self, template: &RecurringTransaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO recurring_transactions (workspace_id, name, category_id, kind, amount, currency,
                 frequency, start_date, end_date, next_due_date, last_processed_at, is_active, notes, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                template.workspace_id,
                template.name,
                template.category_id,
                template.kind.as_str(),
                template.amount.to_string(),
                template.currency,
                template.frequency.as_str(),
                fmt_date(template.start_date),
                template.end_date.map(fmt_date),
                fmt_date(template.next_due_date),
                template.last_processed_at.map(|t| t.to_rfc3339()),
                template.is_active,
                template.notes,
                template.created_at,
                template.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_recurring(&self, id: i64) -> Result<Option<RecurringTransaction>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {RECURRING_COLUMNS} FROM recurring_transactions WHERE id = ?1"),
                params![id],
                recurring_from_row,
            )
            .optional()?)
    }

    /// Active templates first, then by next due date.
    pub(crate) fn get_recurring_list(&self, workspace_id: i64) -> Result<Vec<RecurringTransaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transactions
             WHERE workspace_id = ?1
             ORDER BY is_active DESC, next_due_date, name"
        ))?;
        let rows = stmt.query_map(params![workspace_id], recurring_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn set_recurring_active(&self, id: i64, active: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE recurring_transactions SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(())
    }

    pub(crate) fn delete_recurring(&self, id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM recurring_transactions WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}

impl TemplateStore for Database {
    fn list_active_due_before(
        &self,
        workspace_id: i64,
        today: NaiveDate,
    ) -> Result<Vec<RecurringTransaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transactions
             WHERE workspace_id = ?1 AND is_active = 1 AND completed_at IS NULL
               AND next_due_date <= ?2
             ORDER BY next_due_date, id"
        ))?;
        let rows = stmt.query_map(params![workspace_id, fmt_date(today)], recurring_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn advance(
        &self,
        template_id: i64,
        next_due_date: NaiveDate,
        last_processed_at: DateTime<Utc>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE recurring_transactions SET next_due_date = ?1, last_processed_at = ?2 WHERE id = ?3",
            params![
                fmt_date(next_due_date),
                last_processed_at.to_rfc3339(),
                template_id
            ],
        )?;
        if changed == 0 {
            anyhow::bail!("Recurring template {template_id} no longer exists");
        }
        Ok(())
    }

    fn deactivate(&self, template_id: i64, last_processed_at: DateTime<Utc>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE recurring_transactions
             SET is_active = 0, last_processed_at = ?1, completed_at = ?1
             WHERE id = ?2",
            params![last_processed_at.to_rfc3339(), template_id],
        )?;
        if changed == 0 {
            anyhow::bail!("Recurring template {template_id} no longer exists");
        }
        Ok(())
    }
}

impl LedgerStore for Database {
    fn append(&self, txn: &Transaction) -> Result<Transaction> {
        let id = self.insert_transaction(txn)?;
        self.get_transaction(id)?
            .with_context(|| format!("Transaction {id} vanished after insert"))
    }
}
