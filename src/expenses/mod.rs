//! Expense lifecycle. Every mutation is paired with its budget delta inside
//! one transaction, so a period's spend moves together with the expense rows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::db::{BudgetStore, Database, ExpenseQuery};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::BudgetLedger;
use crate::models::{checked_total, Category, Expense, ExpenseUpdate, MonthKey, NewExpense};

pub(crate) const DEFAULT_PAGE_SIZE: u32 = 20;
pub(crate) const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default)]
pub(crate) struct ExpenseFilter {
    pub(crate) from: Option<NaiveDate>,
    pub(crate) to: Option<NaiveDate>,
    /// Shorthand for a from/to pair spanning one month. Explicit bounds win.
    pub(crate) month: Option<MonthKey>,
    pub(crate) category: Option<Category>,
    pub(crate) search: Option<String>,
}

impl ExpenseFilter {
    pub(crate) fn for_month(month: MonthKey) -> Self {
        Self {
            month: Some(month),
            ..Default::default()
        }
    }

    fn to_query(&self) -> ExpenseQuery {
        ExpenseQuery {
            from: self.from.or(self.month.as_ref().map(|m| m.first_day())),
            to: self.to.or(self.month.as_ref().map(|m| m.last_day())),
            category: self.category,
            search: self.search.clone(),
            limit: None,
            offset: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total: i64,
    pub(crate) pages: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub(crate) inserted: usize,
    pub(crate) duplicates: usize,
}

pub(crate) fn add(db: &mut Database, user_id: &str, new: NewExpense) -> LedgerResult<Expense> {
    let mut expense = Expense::from_new(user_id, new);
    expense.validate()?;

    db.in_transaction(|db| {
        let id = db.insert_expense(&expense)?;
        expense.id = Some(id);
        BudgetLedger::new(db).record_expense_delta(
            user_id,
            expense.date,
            expense.category,
            expense.amount,
        )?;
        Ok::<_, LedgerError>(())
    })?;

    info!(
        user = %user_id,
        expense_id = ?expense.id,
        amount = %expense.amount,
        category = %expense.category,
        date = %expense.date,
        "Expense added"
    );
    Ok(expense)
}

/// Apply a partial update. When the amount, category or date changes, the old
/// amount leaves its old bucket and the new amount enters the new one.
pub(crate) fn update(
    db: &mut Database,
    user_id: &str,
    id: i64,
    changes: &ExpenseUpdate,
) -> LedgerResult<Expense> {
    if changes.is_empty() {
        return Err(LedgerError::Validation("Nothing to update".into()));
    }

    let updated = db.in_transaction(|db| {
        let old = db
            .get_expense(user_id, id)?
            .ok_or_else(|| expense_not_found(id))?;
        let new = changes.apply(&old);
        new.validate()?;
        db.update_expense(&new)?;

        let moved = old.amount != new.amount || old.category != new.category || old.date != new.date;
        if moved {
            let mut ledger = BudgetLedger::new(db);
            ledger.record_expense_delta(user_id, old.date, old.category, -old.amount)?;
            ledger.record_expense_delta(user_id, new.date, new.category, new.amount)?;
        }
        Ok::<_, LedgerError>(new)
    })?;

    info!(user = %user_id, expense_id = id, "Expense updated");
    Ok(updated)
}

/// Delete an expense and return the removed record.
pub(crate) fn remove(db: &mut Database, user_id: &str, id: i64) -> LedgerResult<Expense> {
    let removed = db.in_transaction(|db| {
        let old = db
            .get_expense(user_id, id)?
            .ok_or_else(|| expense_not_found(id))?;
        db.delete_expense(user_id, id)?;
        BudgetLedger::new(db).record_expense_delta(user_id, old.date, old.category, -old.amount)?;
        Ok::<_, LedgerError>(old)
    })?;

    info!(user = %user_id, expense_id = id, amount = %removed.amount, "Expense deleted");
    Ok(removed)
}

pub(crate) fn get(db: &Database, user_id: &str, id: i64) -> LedgerResult<Expense> {
    db.get_expense(user_id, id)?
        .ok_or_else(|| expense_not_found(id))
}

/// Newest-first listing. `page` is 1-based; `limit` is clamped to 1..=100.
pub(crate) fn list(
    db: &Database,
    user_id: &str,
    filter: &ExpenseFilter,
    page: u32,
    limit: u32,
) -> LedgerResult<Page<Expense>> {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_SIZE);

    let mut query = filter.to_query();
    let total = db.count_expenses(user_id, &query)?;
    query.limit = Some(limit);
    query.offset = Some((page - 1).saturating_mul(limit));
    let items = db.query_expenses(user_id, &query)?;

    let pages = u32::try_from((total + i64::from(limit) - 1) / i64::from(limit)).unwrap_or(u32::MAX);
    Ok(Page {
        items,
        page,
        limit,
        total,
        pages,
    })
}

/// Insert a batch, skipping rows whose import hash is already stored.
/// The whole batch commits or none of it does.
pub(crate) fn import(
    db: &mut Database,
    user_id: &str,
    batch: Vec<NewExpense>,
) -> LedgerResult<ImportSummary> {
    let mut prepared = Vec::with_capacity(batch.len());
    for (row, new) in batch.into_iter().enumerate() {
        let expense = Expense::from_new(user_id, new);
        expense.validate().map_err(|e| match e {
            LedgerError::Validation(msg) => LedgerError::Validation(format!("Row {}: {msg}", row + 1)),
            other => other,
        })?;
        prepared.push(expense);
    }

    let summary = db.in_transaction(|db| {
        let mut summary = ImportSummary::default();
        for expense in &prepared {
            if db.has_import_hash(user_id, &expense.import_hash)? {
                summary.duplicates += 1;
                continue;
            }
            db.insert_expense(expense)?;
            BudgetLedger::new(&mut *db).record_expense_delta(
                user_id,
                expense.date,
                expense.category,
                expense.amount,
            )?;
            summary.inserted += 1;
        }
        Ok::<_, LedgerError>(summary)
    })?;

    if summary.duplicates > 0 {
        warn!(user = %user_id, skipped = summary.duplicates, "Duplicate import rows skipped");
    }
    info!(user = %user_id, inserted = summary.inserted, "Expenses imported");
    Ok(summary)
}

/// Sum of amounts, exact.
pub(crate) fn total(expenses: &[Expense]) -> Decimal {
    checked_total(expenses.iter().map(|e| e.amount)).unwrap_or(Decimal::MAX)
}

fn expense_not_found(id: i64) -> LedgerError {
    LedgerError::NotFound(format!("Expense {id} not found"))
}
