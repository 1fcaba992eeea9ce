mod debts;
mod ledger;
mod recurring;
mod schema;

pub(crate) use ledger::TransactionQuery;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

const DATE_FMT: &str = "%Y-%m-%d";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            tracing::debug!(version = schema::CURRENT_VERSION, "creating fresh schema");
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tx.commit()?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                tracing::debug!(from_version, "applying migration");
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────

    /// Insert the user, or refresh the display name of an existing email.
    pub(crate) fn upsert_user(&self, user: &User) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (email, name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET name = excluded.name",
            params![user.email, user.name, user.created_at],
        )?;
        self.get_user_by_email(&user.email)?
            .with_context(|| format!("User {} vanished after upsert", user.email))
    }

    pub(crate) fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, name, created_at FROM users WHERE email = ?1",
                params![email.trim().to_lowercase()],
                user_from_row,
            )
            .optional()?)
    }

    pub(crate) fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, name, created_at FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()?)
    }

    // ── Preferences ───────────────────────────────────────────

    pub(crate) fn get_preferences(&self, user_id: i64) -> Result<Preferences> {
        let stored = self
            .conn
            .query_row(
                "SELECT user_id, currency, default_workspace_id FROM preferences WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Preferences {
                        user_id: row.get(0)?,
                        currency: row.get(1)?,
                        default_workspace_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(stored.unwrap_or_else(|| Preferences::new(user_id)))
    }

    pub(crate) fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        self.conn.execute(
            "INSERT INTO preferences (user_id, currency, default_workspace_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET currency = ?2, default_workspace_id = ?3",
            params![prefs.user_id, prefs.currency, prefs.default_workspace_id],
        )?;
        Ok(())
    }

    // ── Workspaces ────────────────────────────────────────────

    /// Create the workspace, make its creator the owner, and seed the
    /// default categories, all in one transaction.
    pub(crate) fn create_workspace(&mut self, workspace: &Workspace) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO workspaces (name, created_by, created_at) VALUES (?1, ?2, ?3)",
            params![workspace.name, workspace.created_by, workspace.created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO members (workspace_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                workspace.created_by,
                Role::Owner.as_str(),
                workspace.created_at
            ],
        )?;
        for (name, kind) in Category::defaults() {
            tx.execute(
                "INSERT OR IGNORE INTO categories (workspace_id, name, kind) VALUES (?1, ?2, ?3)",
                params![id, name, kind.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(id)
    }

    pub(crate) fn get_workspace(&self, id: i64) -> Result<Option<Workspace>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, created_by, created_at FROM workspaces WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Workspace {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                        created_by: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    pub(crate) fn get_workspaces_for_user(&self, user_id: i64) -> Result<Vec<(Workspace, Role)>> {
        let mut stmt = self.conn.prepare(
            "SELECT w.id, w.name, w.created_by, w.created_at, m.role
             FROM workspaces w JOIN members m ON m.workspace_id = w.id
             WHERE m.user_id = ?1
             ORDER BY w.name, w.id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                Workspace {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    created_by: row.get(2)?,
                    created_at: row.get(3)?,
                },
                enum_col(row, 4, Role::parse)?,
            ))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_workspace(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM workspaces WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Members ───────────────────────────────────────────────

    pub(crate) fn get_member_role(&self, workspace_id: i64, user_id: i64) -> Result<Option<Role>> {
        Ok(self
            .conn
            .query_row(
                "SELECT role FROM members WHERE workspace_id = ?1 AND user_id = ?2",
                params![workspace_id, user_id],
                |row| enum_col(row, 0, Role::parse),
            )
            .optional()?)
    }

    pub(crate) fn get_members(&self, workspace_id: i64) -> Result<Vec<Member>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.workspace_id, m.user_id, u.email, u.name, m.role
             FROM members m JOIN users u ON u.id = m.user_id
             WHERE m.workspace_id = ?1
             ORDER BY u.email",
        )?;
        let rows = stmt.query_map(params![workspace_id], |row| {
            Ok(Member {
                workspace_id: row.get(0)?,
                user_id: row.get(1)?,
                email: row.get(2)?,
                name: row.get(3)?,
                role: enum_col(row, 4, Role::parse)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn upsert_member(&self, workspace_id: i64, user_id: i64, role: Role) -> Result<()> {
        self.conn.execute(
            "INSERT INTO members (workspace_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(workspace_id, user_id) DO UPDATE SET role = ?3",
            params![workspace_id, user_id, role.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub(crate) fn remove_member(&self, workspace_id: i64, user_id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM members WHERE workspace_id = ?1 AND user_id = ?2",
            params![workspace_id, user_id],
        )?;
        Ok(())
    }

    pub(crate) fn count_owners(&self, workspace_id: i64) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM members WHERE workspace_id = ?1 AND role = ?2",
            params![workspace_id, Role::Owner.as_str()],
            |row| row.get(0),
        )?)
    }
}

// ── Row helpers ───────────────────────────────────────────────

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Some(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT).map_err(|e| conversion_error(idx, e))
}

fn opt_date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FMT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn opt_timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn enum_col<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("unexpected value '{raw}'")))
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}
