use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

use super::{Category, MonthKey};
use crate::error::LedgerError;

/// Warning threshold, in percent of the allocation.
pub const WARNING_PERCENT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
pub const EXCEEDED_PERCENT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryBudget {
    pub allocated: Decimal,
    pub spent: Decimal,
}

/// Allocations and derived spend for one user and one calendar month.
///
/// `spent` values are a cache of the expense table; the mutators keep
/// `total_allocated`/`total_spent` in step with the per-category map.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetPeriod {
    pub id: Option<i64>,
    pub user_id: String,
    pub month: MonthKey,
    pub categories: BTreeMap<Category, CategoryBudget>,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub created_at: String,
    pub updated_at: String,
}

impl BudgetPeriod {
    pub fn new(user_id: &str, month: MonthKey) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: None,
            user_id: user_id.to_string(),
            month,
            categories: BTreeMap::new(),
            total_allocated: Decimal::ZERO,
            total_spent: Decimal::ZERO,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn allocated(&self, category: Category) -> Decimal {
        self.categories
            .get(&category)
            .map(|c| c.allocated)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn spent(&self, category: Category) -> Decimal {
        self.categories
            .get(&category)
            .map(|c| c.spent)
            .unwrap_or(Decimal::ZERO)
    }

    /// Set the allocation for `category`, keeping its current spend.
    /// Nothing changes on overflow.
    pub fn set_allocation(
        &mut self,
        category: Category,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let previous = self.allocated(category);
        self.categories.entry(category).or_default().allocated = amount;
        if let Err(e) = self.recompute_totals() {
            self.categories.entry(category).or_default().allocated = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Add a signed delta to the category's spend, floored at zero.
    /// Returns true when the floor was hit. Nothing changes on overflow.
    pub fn apply_spent_delta(
        &mut self,
        category: Category,
        delta: Decimal,
    ) -> Result<bool, LedgerError> {
        let current = self.spent(category);
        let raw = current
            .checked_add(delta)
            .ok_or_else(|| overflow(&format!("{category} spend")))?;
        let clamped = raw < Decimal::ZERO;
        self.categories.entry(category).or_default().spent = raw.max(Decimal::ZERO);
        if let Err(e) = self.recompute_totals() {
            self.categories.entry(category).or_default().spent = current;
            return Err(e);
        }
        Ok(clamped)
    }

    /// Replace all spend with the given per-category sums. Categories missing
    /// from `sums` are zeroed; new ones are added with no allocation.
    pub fn replace_spent(
        &mut self,
        sums: &BTreeMap<Category, Decimal>,
    ) -> Result<(), LedgerError> {
        for entry in self.categories.values_mut() {
            entry.spent = Decimal::ZERO;
        }
        for (category, amount) in sums {
            self.categories.entry(*category).or_default().spent = (*amount).max(Decimal::ZERO);
        }
        self.recompute_totals()
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    fn recompute_totals(&mut self) -> Result<(), LedgerError> {
        let allocated = checked_total(self.categories.values().map(|c| c.allocated))
            .ok_or_else(|| overflow("Total allocated"))?;
        let spent = checked_total(self.categories.values().map(|c| c.spent))
            .ok_or_else(|| overflow("Total spent"))?;
        self.total_allocated = allocated;
        self.total_spent = spent;
        Ok(())
    }

    pub fn progress(&self) -> Result<BudgetProgress, LedgerError> {
        let categories = self
            .categories
            .iter()
            .map(|(category, budget)| CategoryProgress::new(*category, budget))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BudgetProgress {
            month: self.month.clone(),
            total_allocated: self.total_allocated,
            total_spent: self.total_spent,
            total_remaining: remaining(self.total_allocated, self.total_spent),
            categories,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Good,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }

    pub fn from_percentage(allocated: Decimal, percentage: Decimal) -> Self {
        if allocated <= Decimal::ZERO {
            Self::Good
        } else if percentage >= EXCEEDED_PERCENT {
            Self::Exceeded
        } else if percentage >= WARNING_PERCENT {
            Self::Warning
        } else {
            Self::Good
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProgress {
    pub category: Category,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage_used: Decimal,
    pub status: BudgetStatus,
}

impl CategoryProgress {
    fn new(category: Category, budget: &CategoryBudget) -> Result<Self, LedgerError> {
        let percentage_used = percentage_of(budget.spent, budget.allocated)?;
        Ok(Self {
            category,
            allocated: budget.allocated,
            spent: budget.spent,
            remaining: remaining(budget.allocated, budget.spent),
            percentage_used,
            status: BudgetStatus::from_percentage(budget.allocated, percentage_used),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub month: MonthKey,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub total_remaining: Decimal,
    pub categories: Vec<CategoryProgress>,
}

impl BudgetProgress {
    pub fn category(&self, category: Category) -> Option<&CategoryProgress> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// `part / whole * 100` rounded half away from zero to 2 dp; 0 when `whole` is 0.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Result<Decimal, LedgerError> {
    if whole <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round2)
        .ok_or_else(|| overflow("Percentage used"))
}

/// Exact sum, `None` on overflow.
pub fn checked_total(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// `max(0, allocated - spent)`.
fn remaining(allocated: Decimal, spent: Decimal) -> Decimal {
    allocated
        .checked_sub(spent)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

fn overflow(what: &str) -> LedgerError {
    LedgerError::Validation(format!("{what} is out of range"))
}

pub fn round2(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
