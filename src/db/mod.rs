mod schema;
mod store;

pub(crate) use store::{BudgetStore, ExpenseStore};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::models::*;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::FromSqlConversionFailure(..) => StoreError::Corrupt(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Filter for expense listings. Empty fields don't constrain the query.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExpenseQuery {
    pub(crate) from: Option<NaiveDate>,
    pub(crate) to: Option<NaiveDate>,
    pub(crate) category: Option<Category>,
    pub(crate) search: Option<String>,
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

const EXPENSE_COLUMNS: &str = "id, user_id, amount, category, date, description, notes, \
     payment_method, tags, import_hash, created_at, updated_at";

const GOAL_COLUMNS: &str = "id, user_id, title, description, target_amount, current_amount, \
     due_date, status, kind, priority, created_at";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
        )
        .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "Database opened");
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
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
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

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO expenses (user_id, amount, category, date, description, notes,
                                   payment_method, tags, import_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                expense.user_id,
                expense.amount.to_string(),
                expense.category.as_str(),
                expense.date.format("%Y-%m-%d").to_string(),
                expense.description,
                expense.notes,
                expense.payment_method.as_str(),
                expense.tags_joined(),
                expense.import_hash,
                expense.created_at,
                expense.updated_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(expense_id = id, user = %expense.user_id, "Expense inserted");
        Ok(id)
    }

    /// Whether an expense with this import hash is already stored for the user.
    /// Empty hashes never match.
    pub(crate) fn has_import_hash(&self, user_id: &str, hash: &str) -> StoreResult<bool> {
        if hash.is_empty() {
            return Ok(false);
        }
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM expenses WHERE user_id = ?1 AND import_hash = ?2)",
            params![user_id, hash],
            |row| row.get(0),
        )?)
    }

    pub(crate) fn get_expense(&self, user_id: &str, id: i64) -> StoreResult<Option<Expense>> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = ?1 AND id = ?2");
        Ok(self
            .conn
            .query_row(&sql, params![user_id, id], expense_from_row)
            .optional()?)
    }

    pub(crate) fn update_expense(&self, expense: &Expense) -> StoreResult<()> {
        let id = expense
            .id
            .ok_or_else(|| StoreError::NotFound("expense without id".into()))?;
        let changed = self.conn.execute(
            "UPDATE expenses SET amount = ?1, category = ?2, date = ?3, description = ?4,
                    notes = ?5, payment_method = ?6, tags = ?7, updated_at = ?8
             WHERE id = ?9 AND user_id = ?10",
            params![
                expense.amount.to_string(),
                expense.category.as_str(),
                expense.date.format("%Y-%m-%d").to_string(),
                expense.description,
                expense.notes,
                expense.payment_method.as_str(),
                expense.tags_joined(),
                expense.updated_at,
                id,
                expense.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("expense {id}")));
        }
        debug!(expense_id = id, "Expense updated");
        Ok(())
    }

    pub(crate) fn delete_expense(&self, user_id: &str, id: i64) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        debug!(expense_id = id, deleted = changed > 0, "Expense delete");
        Ok(changed > 0)
    }

    pub(crate) fn query_expenses(
        &self,
        user_id: &str,
        query: &ExpenseQuery,
    ) -> StoreResult<Vec<Expense>> {
        let (where_sql, param_values) = expense_filter_sql(user_id, query);
        let mut sql =
            format!("SELECT {EXPENSE_COLUMNS} FROM expenses {where_sql} ORDER BY date DESC, id DESC");
        if let Some(l) = query.limit {
            sql.push_str(&format!(" LIMIT {l}"));
            if let Some(o) = query.offset {
                sql.push_str(&format!(" OFFSET {o}"));
            }
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn count_expenses(&self, user_id: &str, query: &ExpenseQuery) -> StoreResult<i64> {
        let (where_sql, param_values) = expense_filter_sql(user_id, query);
        let sql = format!("SELECT COUNT(*) FROM expenses {where_sql}");
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        Ok(self
            .conn
            .query_row(&sql, params_ref.as_slice(), |row| row.get(0))?)
    }

    pub(crate) fn recent_expenses(&self, user_id: &str, limit: u32) -> StoreResult<Vec<Expense>> {
        self.query_expenses(
            user_id,
            &ExpenseQuery {
                limit: Some(limit),
                ..Default::default()
            },
        )
    }

    // ── Goals ─────────────────────────────────────────────────

    pub(crate) fn insert_goal(&self, goal: &SavingsGoal) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO goals (user_id, title, description, target_amount, current_amount,
                                due_date, status, kind, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                goal.user_id,
                goal.title,
                goal.description,
                goal.target_amount.to_string(),
                goal.current_amount.to_string(),
                goal.due_date.format("%Y-%m-%d").to_string(),
                goal.status.as_str(),
                goal.kind.as_str(),
                goal.priority.as_str(),
                goal.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_goal(&self, user_id: &str, id: i64) -> StoreResult<Option<SavingsGoal>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 AND id = ?2");
        Ok(self
            .conn
            .query_row(&sql, params![user_id, id], goal_from_row)
            .optional()?)
    }

    pub(crate) fn get_goals(
        &self,
        user_id: &str,
        status: Option<GoalStatus>,
    ) -> StoreResult<Vec<SavingsGoal>> {
        let mut sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(user_id.to_string())];
        if let Some(s) = status {
            sql.push_str(" AND status = ?2");
            param_values.push(Box::new(s.as_str()));
        }
        sql.push_str(" ORDER BY due_date ASC, id ASC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), goal_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn update_goal(&self, goal: &SavingsGoal) -> StoreResult<()> {
        let id = goal
            .id
            .ok_or_else(|| StoreError::NotFound("goal without id".into()))?;
        let changed = self.conn.execute(
            "UPDATE goals SET title = ?1, description = ?2, target_amount = ?3,
                    current_amount = ?4, due_date = ?5, status = ?6, kind = ?7, priority = ?8
             WHERE id = ?9 AND user_id = ?10",
            params![
                goal.title,
                goal.description,
                goal.target_amount.to_string(),
                goal.current_amount.to_string(),
                goal.due_date.format("%Y-%m-%d").to_string(),
                goal.status.as_str(),
                goal.kind.as_str(),
                goal.priority.as_str(),
                id,
                goal.user_id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("goal {id}")));
        }
        Ok(())
    }

    pub(crate) fn delete_goal(&self, user_id: &str, id: i64) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM goals WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(changed > 0)
    }

    // ── Export ────────────────────────────────────────────────

    /// Write a user's expenses (optionally one month) to CSV. Returns the row count.
    pub(crate) fn export_to_csv(
        &self,
        user_id: &str,
        path: &str,
        month: Option<&MonthKey>,
    ) -> Result<usize> {
        let query = ExpenseQuery {
            from: month.map(|m| m.first_day()),
            to: month.map(|m| m.last_day()),
            ..Default::default()
        };
        let expenses = self.query_expenses(user_id, &query)?;
        if expenses.is_empty() {
            return Ok(0);
        }

        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create export file: {path}"))?;
        wtr.write_record(crate::import::EXPORT_HEADER)?;
        for e in &expenses {
            wtr.write_record([
                e.date.format("%Y-%m-%d").to_string(),
                e.description.clone(),
                e.category.as_str().to_string(),
                format!("{:.2}", e.amount),
                e.payment_method.as_str().to_string(),
                e.notes.clone(),
                e.tags_joined(),
            ])?;
        }
        wtr.flush().context("Failed to flush export file")?;
        Ok(expenses.len())
    }

    // ── Budget periods (row helpers used by the BudgetStore impl) ──

    fn load_period_categories(&self, period: &mut BudgetPeriod) -> StoreResult<()> {
        let Some(period_id) = period.id else {
            return Ok(());
        };
        let mut stmt = self.conn.prepare(
            "SELECT category, allocated, spent FROM budget_categories WHERE period_id = ?1",
        )?;
        let rows = stmt.query_map(params![period_id], |row| {
            Ok((
                category_col(row, 0)?,
                CategoryBudget {
                    allocated: decimal_col(row, 1)?,
                    spent: decimal_col(row, 2)?,
                },
            ))
        })?;
        for row in rows {
            let (category, budget) = row?;
            period.categories.insert(category, budget);
        }
        Ok(())
    }
}

fn expense_filter_sql(
    user_id: &str,
    query: &ExpenseQuery,
) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
    let mut sql = String::from("WHERE user_id = ?1");
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(user_id.to_string())];

    if let Some(from) = query.from {
        sql.push_str(&format!(" AND date >= ?{}", param_values.len() + 1));
        param_values.push(Box::new(from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = query.to {
        sql.push_str(&format!(" AND date <= ?{}", param_values.len() + 1));
        param_values.push(Box::new(to.format("%Y-%m-%d").to_string()));
    }
    if let Some(category) = query.category {
        sql.push_str(&format!(" AND category = ?{}", param_values.len() + 1));
        param_values.push(Box::new(category.as_str()));
    }
    if let Some(s) = query.search.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(&format!(
            " AND (description LIKE ?{0} OR notes LIKE ?{0} OR tags LIKE ?{0})",
            param_values.len() + 1
        ));
        param_values.push(Box::new(format!("%{s}%")));
    }
    (sql, param_values)
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn decimal_col(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    Decimal::from_str(&s).map_err(|e| conversion_error(idx, e))
}

fn date_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}

fn category_col(row: &Row, idx: usize) -> rusqlite::Result<Category> {
    let s: String = row.get(idx)?;
    Category::parse(&s).map_err(|e| conversion_error(idx, e))
}

fn month_col(row: &Row, idx: usize) -> rusqlite::Result<MonthKey> {
    let s: String = row.get(idx)?;
    MonthKey::parse(&s).map_err(|e| conversion_error(idx, e))
}

fn expense_from_row(row: &Row) -> rusqlite::Result<Expense> {
    let tags: String = row.get(8)?;
    Ok(Expense {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        amount: decimal_col(row, 2)?,
        category: category_col(row, 3)?,
        date: date_col(row, 4)?,
        description: row.get(5)?,
        notes: row.get(6)?,
        payment_method: PaymentMethod::parse(&row.get::<_, String>(7)?),
        tags: parse_tags(&tags),
        import_hash: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn goal_from_row(row: &Row) -> rusqlite::Result<SavingsGoal> {
    let status: String = row.get(7)?;
    Ok(SavingsGoal {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        target_amount: decimal_col(row, 4)?,
        current_amount: decimal_col(row, 5)?,
        due_date: date_col(row, 6)?,
        status: GoalStatus::parse(&status).map_err(|e| conversion_error(7, e))?,
        kind: GoalKind::parse(&row.get::<_, String>(8)?),
        priority: GoalPriority::parse(&row.get::<_, String>(9)?),
        created_at: row.get(10)?,
    })
}

fn period_from_row(row: &Row) -> rusqlite::Result<BudgetPeriod> {
    Ok(BudgetPeriod {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        month: month_col(row, 2)?,
        categories: Default::default(),
        total_allocated: decimal_col(row, 3)?,
        total_spent: decimal_col(row, 4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests;
