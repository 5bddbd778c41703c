//! Storage seams used by the budget ledger.

use chrono::NaiveDate;
use rusqlite::params;
use tracing::{debug, warn};

use super::{expense_from_row, period_from_row, Database, StoreError, StoreResult, EXPENSE_COLUMNS};
use crate::models::{BudgetPeriod, Category, Expense, MonthKey};

/// Read access to the expense table, scoped to one user.
pub(crate) trait ExpenseStore {
    /// Expenses dated within `from..=to`.
    fn expenses_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Expense>>;

    /// Per-category sums over `from..=to`, computed in exact decimal.
    fn category_sums_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<std::collections::BTreeMap<Category, rust_decimal::Decimal>> {
        let mut sums = std::collections::BTreeMap::new();
        for e in self.expenses_between(user_id, from, to)? {
            let slot: &mut rust_decimal::Decimal = sums.entry(e.category).or_default();
            *slot = slot.checked_add(e.amount).ok_or_else(|| {
                StoreError::Corrupt(format!("{} total overflows from {from} to {to}", e.category))
            })?;
        }
        Ok(sums)
    }
}

/// Persistence for budget periods. At most one period per (user, month).
pub(crate) trait BudgetStore {
    fn find_period(&self, user_id: &str, month: &MonthKey) -> StoreResult<Option<BudgetPeriod>>;

    /// Insert or replace the period and all of its category rows as one unit.
    /// Assigns `period.id` on first save.
    fn save_period(&mut self, period: &mut BudgetPeriod) -> StoreResult<()>;

    /// Returns false when there was nothing to delete.
    fn remove_period(&mut self, user_id: &str, month: &MonthKey) -> StoreResult<bool>;

    /// All periods for the user, newest month first.
    fn list_periods(&self, user_id: &str) -> StoreResult<Vec<BudgetPeriod>>;

    /// Run `f` inside one exclusive write transaction. Nested calls join the
    /// outer transaction. Any error rolls everything back.
    fn in_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>;
}

impl ExpenseStore for Database {
    fn expenses_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Expense>> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                user_id,
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string()
            ],
            expense_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl BudgetStore for Database {
    fn find_period(&self, user_id: &str, month: &MonthKey) -> StoreResult<Option<BudgetPeriod>> {
        let period = self
            .conn
            .query_row(
                "SELECT id, user_id, month, total_allocated, total_spent, created_at, updated_at
                 FROM budget_periods WHERE user_id = ?1 AND month = ?2",
                params![user_id, month.as_str()],
                period_from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match period {
            Some(mut p) => {
                self.load_period_categories(&mut p)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    fn save_period(&mut self, period: &mut BudgetPeriod) -> StoreResult<()> {
        let sp = self.conn.savepoint()?;
        sp.execute(
            "INSERT INTO budget_periods
                 (user_id, month, total_allocated, total_spent, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, month) DO UPDATE SET
                 total_allocated = excluded.total_allocated,
                 total_spent = excluded.total_spent,
                 updated_at = excluded.updated_at",
            params![
                period.user_id,
                period.month.as_str(),
                period.total_allocated.to_string(),
                period.total_spent.to_string(),
                period.created_at,
                period.updated_at,
            ],
        )?;
        let id: i64 = sp.query_row(
            "SELECT id FROM budget_periods WHERE user_id = ?1 AND month = ?2",
            params![period.user_id, period.month.as_str()],
            |row| row.get(0),
        )?;

        sp.execute(
            "DELETE FROM budget_categories WHERE period_id = ?1",
            params![id],
        )?;
        {
            let mut stmt = sp.prepare(
                "INSERT INTO budget_categories (period_id, category, allocated, spent)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (category, budget) in &period.categories {
                stmt.execute(params![
                    id,
                    category.as_str(),
                    budget.allocated.to_string(),
                    budget.spent.to_string(),
                ])?;
            }
        }
        sp.commit()?;

        period.id = Some(id);
        debug!(
            period_id = id,
            user = %period.user_id,
            month = %period.month,
            total_allocated = %period.total_allocated,
            total_spent = %period.total_spent,
            "Budget period saved"
        );
        Ok(())
    }

    fn remove_period(&mut self, user_id: &str, month: &MonthKey) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM budget_periods WHERE user_id = ?1 AND month = ?2",
            params![user_id, month.as_str()],
        )?;
        debug!(user = %user_id, month = %month, deleted = changed > 0, "Budget period delete");
        Ok(changed > 0)
    }

    fn list_periods(&self, user_id: &str) -> StoreResult<Vec<BudgetPeriod>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, month, total_allocated, total_spent, created_at, updated_at
             FROM budget_periods WHERE user_id = ?1 ORDER BY month DESC",
        )?;
        let rows = stmt.query_map(params![user_id], period_from_row)?;
        let mut periods = rows.collect::<Result<Vec<_>, _>>()?;
        for p in &mut periods {
            self.load_period_categories(p)?;
        }
        Ok(periods)
    }

    fn in_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        if !self.conn.is_autocommit() {
            return f(self);
        }

        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(StoreError::from)?;
        match f(self) {
            Ok(value) => {
                if let Err(e) = self.conn.execute_batch("COMMIT") {
                    if let Err(rb) = self.conn.execute_batch("ROLLBACK") {
                        warn!(error = %rb, "Rollback after failed commit also failed");
                    }
                    return Err(StoreError::from(e).into());
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rb) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rb, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
