//! Per-(user, month, category) budget allocations and derived spend.
//!
//! `spent` is a cache of the expense table. `record_expense_delta` keeps it
//! current incrementally; `recalculate_from_scratch` rebuilds it and is the
//! source of truth. Both must agree when deltas mirror the expense mutations.
//!
//! Every read-modify-write of a period runs inside one store transaction, and
//! the ledger borrows its store mutably, so writes to a period never interleave.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::db::{BudgetStore, ExpenseStore};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    validate_amount, validate_date, BudgetPeriod, BudgetProgress, BudgetStatus, Category,
    MonthKey,
};

/// A category at or over the warning threshold.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetAlert {
    pub(crate) category: Category,
    pub(crate) status: BudgetStatus,
    pub(crate) allocated: Decimal,
    pub(crate) spent: Decimal,
    pub(crate) percentage_used: Decimal,
}

impl BudgetAlert {
    pub(crate) fn message(&self) -> String {
        match self.status {
            BudgetStatus::Exceeded => format!(
                "{} is over budget: spent {} of {} ({}%)",
                self.category, self.spent, self.allocated, self.percentage_used
            ),
            _ => format!(
                "{} is at {}% of its budget ({} of {})",
                self.category, self.percentage_used, self.spent, self.allocated
            ),
        }
    }
}

pub(crate) struct BudgetLedger<'a, S> {
    store: &'a mut S,
}

impl<'a, S: BudgetStore + ExpenseStore> BudgetLedger<'a, S> {
    pub(crate) fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Set one category's allocation, creating the period if needed.
    pub(crate) fn set_allocation(
        &mut self,
        user_id: &str,
        month: &str,
        category: Category,
        amount: Decimal,
    ) -> LedgerResult<BudgetPeriod> {
        self.set_allocations(user_id, month, &[(category, amount)])
    }

    /// Set several allocations in one atomic write. Either all apply or none do.
    pub(crate) fn set_allocations(
        &mut self,
        user_id: &str,
        month: &str,
        allocations: &[(Category, Decimal)],
    ) -> LedgerResult<BudgetPeriod> {
        let month = MonthKey::parse(month)?;
        for (_, amount) in allocations {
            validate_amount(*amount)?;
        }

        self.store.in_transaction(|store| {
            let mut period = match store.find_period(user_id, &month)? {
                Some(p) => p,
                None => {
                    // New periods start from the month's existing expenses
                    let mut p = BudgetPeriod::new(user_id, month.clone());
                    reconcile(&*store, &mut p)?;
                    info!(user = %user_id, month = %month, "Budget period created");
                    p
                }
            };
            for (category, amount) in allocations {
                period.set_allocation(*category, *amount)?;
            }
            period.touch();
            store.save_period(&mut period)?;
            info!(
                user = %user_id,
                month = %month,
                categories = allocations.len(),
                total_allocated = %period.total_allocated,
                "Allocations set"
            );
            Ok::<_, LedgerError>(period)
        })
    }

    /// Apply a signed spend change for the month containing `date`.
    ///
    /// Returns `None` without error when the user has no period for that month.
    /// The category's spend is floored at zero. `delta` is bounded like any
    /// other amount.
    pub(crate) fn record_expense_delta(
        &mut self,
        user_id: &str,
        date: NaiveDate,
        category: Category,
        delta: Decimal,
    ) -> LedgerResult<Option<BudgetPeriod>> {
        validate_amount(delta.abs())?;
        validate_date(date)?;
        let month = MonthKey::of(date);
        self.store.in_transaction(|store| {
            let Some(mut period) = store.find_period(user_id, &month)? else {
                debug!(user = %user_id, month = %month, "No budget period, delta ignored");
                return Ok(None);
            };
            if period.apply_spent_delta(category, delta)? {
                warn!(
                    user = %user_id,
                    month = %month,
                    category = %category,
                    delta = %delta,
                    "Spent clamped at zero"
                );
            }
            period.touch();
            store.save_period(&mut period)?;
            debug!(
                user = %user_id,
                month = %month,
                category = %category,
                delta = %delta,
                spent = %period.spent(category),
                "Expense delta applied"
            );
            Ok::<_, LedgerError>(Some(period))
        })
    }

    /// Rebuild every category's spend from the month's expenses.
    pub(crate) fn recalculate_from_scratch(
        &mut self,
        user_id: &str,
        month: &str,
    ) -> LedgerResult<BudgetPeriod> {
        let month = MonthKey::parse(month)?;
        self.store.in_transaction(|store| {
            let mut period = store
                .find_period(user_id, &month)?
                .ok_or_else(|| not_found(user_id, &month))?;
            let before = period.total_spent;
            reconcile(&*store, &mut period)?;
            period.touch();
            store.save_period(&mut period)?;
            info!(
                user = %user_id,
                month = %month,
                before = %before,
                after = %period.total_spent,
                "Budget period recalculated"
            );
            Ok::<_, LedgerError>(period)
        })
    }

    pub(crate) fn get_period(&self, user_id: &str, month: &str) -> LedgerResult<BudgetPeriod> {
        let month = MonthKey::parse(month)?;
        self.store
            .find_period(user_id, &month)?
            .ok_or_else(|| not_found(user_id, &month))
    }

    pub(crate) fn get_progress(&self, user_id: &str, month: &str) -> LedgerResult<BudgetProgress> {
        self.get_period(user_id, month)?.progress()
    }

    /// All of the user's periods, newest month first.
    pub(crate) fn list_periods(&self, user_id: &str) -> LedgerResult<Vec<BudgetPeriod>> {
        Ok(self.store.list_periods(user_id)?)
    }

    pub(crate) fn delete_budget_period(&mut self, user_id: &str, month: &str) -> LedgerResult<()> {
        let month = MonthKey::parse(month)?;
        let removed = self
            .store
            .in_transaction(|store| store.remove_period(user_id, &month))?;
        if !removed {
            return Err(not_found(user_id, &month));
        }
        info!(user = %user_id, month = %month, "Budget period deleted");
        Ok(())
    }

    /// Categories at warning or exceeded status, exceeded first, then by
    /// percentage used. Empty when the month has no period.
    pub(crate) fn alerts(&self, user_id: &str, month: &str) -> LedgerResult<Vec<BudgetAlert>> {
        let month = MonthKey::parse(month)?;
        let Some(period) = self.store.find_period(user_id, &month)? else {
            return Ok(Vec::new());
        };
        let mut alerts: Vec<BudgetAlert> = period
            .progress()?
            .categories
            .into_iter()
            .filter(|c| c.status != BudgetStatus::Good)
            .map(|c| BudgetAlert {
                category: c.category,
                status: c.status,
                allocated: c.allocated,
                spent: c.spent,
                percentage_used: c.percentage_used,
            })
            .collect();
        alerts.sort_by(|a, b| {
            let rank = |s: BudgetStatus| u8::from(s != BudgetStatus::Exceeded);
            rank(a.status)
                .cmp(&rank(b.status))
                .then(b.percentage_used.cmp(&a.percentage_used))
        });
        Ok(alerts)
    }
}

fn reconcile<S: ExpenseStore>(store: &S, period: &mut BudgetPeriod) -> LedgerResult<()> {
    let sums = store.category_sums_between(
        &period.user_id,
        period.month.first_day(),
        period.month.last_day(),
    )?;
    period.replace_spent(&sums)
}

fn not_found(user_id: &str, month: &MonthKey) -> LedgerError {
    LedgerError::NotFound(format!("No budget for {month} (user {user_id})"))
}
