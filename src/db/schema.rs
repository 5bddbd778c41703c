pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL,
    amount          TEXT NOT NULL,
    category        TEXT NOT NULL,
    date            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    notes           TEXT NOT NULL DEFAULT '',
    payment_method  TEXT NOT NULL DEFAULT 'cash',
    tags            TEXT NOT NULL DEFAULT '',
    import_hash     TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);
CREATE INDEX IF NOT EXISTS idx_expenses_user_category ON expenses(user_id, category);
CREATE UNIQUE INDEX IF NOT EXISTS idx_expenses_hash_unique
    ON expenses(user_id, import_hash) WHERE import_hash != '';

CREATE TABLE IF NOT EXISTS budget_periods (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          TEXT NOT NULL,
    month            TEXT NOT NULL,
    total_allocated  TEXT NOT NULL DEFAULT '0',
    total_spent      TEXT NOT NULL DEFAULT '0',
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    UNIQUE(user_id, month)
);

CREATE INDEX IF NOT EXISTS idx_budget_periods_user ON budget_periods(user_id);

CREATE TABLE IF NOT EXISTS budget_categories (
    period_id  INTEGER NOT NULL REFERENCES budget_periods(id) ON DELETE CASCADE,
    category   TEXT NOT NULL,
    allocated  TEXT NOT NULL DEFAULT '0',
    spent      TEXT NOT NULL DEFAULT '0',
    UNIQUE(period_id, category)
);

CREATE TABLE IF NOT EXISTS goals (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    target_amount   TEXT NOT NULL,
    current_amount  TEXT NOT NULL DEFAULT '0',
    due_date        TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'active',
    kind            TEXT NOT NULL DEFAULT 'savings',
    priority        TEXT NOT NULL DEFAULT 'medium',
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, due_date);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[
    // Future migrations go here:
    // (1, "ALTER TABLE goals ADD COLUMN archived BOOLEAN NOT NULL DEFAULT 0;"),
];
