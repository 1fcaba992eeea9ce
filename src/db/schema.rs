pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS workspaces (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    created_by  INTEGER NOT NULL REFERENCES users(id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS members (
    workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role         TEXT NOT NULL,
    joined_at    TEXT NOT NULL,
    PRIMARY KEY (workspace_id, user_id)
);

CREATE TABLE IF NOT EXISTS preferences (
    user_id              INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    currency             TEXT NOT NULL DEFAULT 'USD',
    default_workspace_id INTEGER REFERENCES workspaces(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    kind         TEXT NOT NULL DEFAULT 'expense',
    UNIQUE(workspace_id, name)
);

CREATE TABLE IF NOT EXISTS recurring_transactions (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id      INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    name              TEXT NOT NULL,
    category_id       INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    kind              TEXT NOT NULL,
    amount            TEXT NOT NULL,
    currency          TEXT NOT NULL DEFAULT 'USD',
    frequency         TEXT NOT NULL,
    start_date        TEXT NOT NULL,
    end_date          TEXT,
    next_due_date     TEXT NOT NULL,
    last_processed_at TEXT,
    completed_at      TEXT,
    is_active         BOOLEAN NOT NULL DEFAULT 1,
    notes             TEXT NOT NULL DEFAULT '',
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recurring_due ON recurring_transactions(workspace_id, is_active, next_due_date);

CREATE TABLE IF NOT EXISTS transactions (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,
    amount       TEXT NOT NULL,
    currency     TEXT NOT NULL DEFAULT 'USD',
    category_id  INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    date         TEXT NOT NULL,
    description  TEXT NOT NULL,
    notes        TEXT NOT NULL DEFAULT '',
    recurring_id INTEGER REFERENCES recurring_transactions(id) ON DELETE SET NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(workspace_id, date);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);

CREATE TABLE IF NOT EXISTS budgets (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id  INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    category_id   INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    month         TEXT NOT NULL,
    limit_amount  TEXT NOT NULL,
    UNIQUE(category_id, month)
);

CREATE TABLE IF NOT EXISTS debts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    workspace_id    INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    lender          TEXT NOT NULL DEFAULT '',
    principal       TEXT NOT NULL,
    balance         TEXT NOT NULL,
    interest_rate   TEXT NOT NULL DEFAULT '0',
    minimum_payment TEXT NOT NULL DEFAULT '0',
    due_day         INTEGER,
    notes           TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL
);

"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
