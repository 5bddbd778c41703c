//! Read-only aggregations over a user's expenses. All sums are exact decimals.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::db::{BudgetStore, Database, ExpenseStore};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    checked_total, percentage_of, round2, Category, Expense, GoalStatus, MonthKey, SavingsGoal,
};

pub(crate) const DEFAULT_TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryTotal {
    pub(crate) category: Category,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
    pub(crate) average: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DayTotal {
    pub(crate) date: NaiveDate,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthTotal {
    pub(crate) month: MonthKey,
    pub(crate) total: Decimal,
    pub(crate) count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpenseTrend {
    pub(crate) month: MonthKey,
    pub(crate) current_total: Decimal,
    pub(crate) current_count: usize,
    pub(crate) previous_total: Decimal,
    pub(crate) previous_count: usize,
    /// Percent change from the previous month, 2 dp. 0 when there was no prior spend.
    pub(crate) change: Decimal,
    pub(crate) trend: Trend,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetOverview {
    pub(crate) budgeted: Decimal,
    pub(crate) spent: Decimal,
    pub(crate) remaining: Decimal,
    pub(crate) percentage: Decimal,
}

#[derive(Debug, Clone)]
pub(crate) struct Dashboard {
    pub(crate) month: MonthKey,
    pub(crate) month_total: Decimal,
    pub(crate) month_count: usize,
    pub(crate) previous_total: Decimal,
    pub(crate) change: Decimal,
    pub(crate) recent: Vec<Expense>,
    pub(crate) goals: Vec<SavingsGoal>,
    pub(crate) top_categories: Vec<CategoryTotal>,
    pub(crate) budget: Option<BudgetOverview>,
}

/// Per-category totals over `from..=to`, largest first.
pub(crate) fn category_breakdown(
    db: &Database,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> LedgerResult<Vec<CategoryTotal>> {
    let mut acc: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
    for e in db.expenses_between(user_id, from, to)? {
        let slot = acc.entry(e.category).or_default();
        slot.0 += e.amount;
        slot.1 += 1;
    }
    let mut out: Vec<CategoryTotal> = acc
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total,
            count,
            average: round2(total / Decimal::from(count)),
        })
        .collect();
    // Stable sort keeps category order for ties
    out.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(out)
}

pub(crate) fn top_categories(
    db: &Database,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
    limit: usize,
) -> LedgerResult<Vec<CategoryTotal>> {
    let mut out = category_breakdown(db, user_id, from, to)?;
    out.truncate(limit);
    Ok(out)
}

/// Days with spend in `from..=to`, ascending.
pub(crate) fn daily_totals(
    db: &Database,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> LedgerResult<Vec<DayTotal>> {
    let mut acc: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for e in db.expenses_between(user_id, from, to)? {
        let slot = acc.entry(e.date).or_default();
        slot.0 += e.amount;
        slot.1 += 1;
    }
    Ok(acc
        .into_iter()
        .map(|(date, (total, count))| DayTotal { date, total, count })
        .collect())
}

/// Months of `year` with spend, ascending.
pub(crate) fn monthly_totals(
    db: &Database,
    user_id: &str,
    year: i32,
) -> LedgerResult<Vec<MonthTotal>> {
    let (Some(from), Some(to)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return Ok(Vec::new());
    };
    let mut acc: BTreeMap<u32, (Decimal, usize)> = BTreeMap::new();
    for e in db.expenses_between(user_id, from, to)? {
        let slot = acc.entry(e.date.month()).or_default();
        slot.0 += e.amount;
        slot.1 += 1;
    }
    Ok(acc
        .into_iter()
        .filter_map(|(m, (total, count))| {
            NaiveDate::from_ymd_opt(year, m, 1).map(|d| MonthTotal {
                month: MonthKey::of(d),
                total,
                count,
            })
        })
        .collect())
}

/// Compare `month` against the month before it.
pub(crate) fn expense_trend(
    db: &Database,
    user_id: &str,
    month: &MonthKey,
) -> LedgerResult<ExpenseTrend> {
    let current = db.expenses_between(user_id, month.first_day(), month.last_day())?;
    let prev_month = month.prev();
    let previous = db.expenses_between(user_id, prev_month.first_day(), prev_month.last_day())?;

    let current_total = month_total(&current)?;
    let previous_total = month_total(&previous)?;
    let change = percent_change(current_total, previous_total)?;
    let trend = if change > Decimal::ZERO {
        Trend::Up
    } else if change < Decimal::ZERO {
        Trend::Down
    } else {
        Trend::Stable
    };

    Ok(ExpenseTrend {
        month: month.clone(),
        current_total,
        current_count: current.len(),
        previous_total,
        previous_count: previous.len(),
        change,
        trend,
    })
}

/// Snapshot for the month containing `today`.
pub(crate) fn dashboard(
    db: &Database,
    user_id: &str,
    today: NaiveDate,
    recent_limit: u32,
    goal_limit: usize,
) -> LedgerResult<Dashboard> {
    let month = MonthKey::of(today);
    let trend = expense_trend(db, user_id, &month)?;
    let recent = db.recent_expenses(user_id, recent_limit)?;

    let mut goals = db.get_goals(user_id, Some(GoalStatus::Active))?;
    goals.truncate(goal_limit);

    let top = top_categories(
        db,
        user_id,
        month.first_day(),
        month.last_day(),
        DEFAULT_TOP_CATEGORIES,
    )?;

    let budget = db
        .find_period(user_id, &month)?
        .map(|p| {
            Ok::<_, LedgerError>(BudgetOverview {
                budgeted: p.total_allocated,
                spent: p.total_spent,
                remaining: (p.total_allocated - p.total_spent).max(Decimal::ZERO),
                percentage: percentage_of(p.total_spent, p.total_allocated)?,
            })
        })
        .transpose()?;

    Ok(Dashboard {
        month,
        month_total: trend.current_total,
        month_count: trend.current_count,
        previous_total: trend.previous_total,
        change: trend.change,
        recent,
        goals,
        top_categories: top,
        budget,
    })
}

fn month_total(expenses: &[Expense]) -> LedgerResult<Decimal> {
    checked_total(expenses.iter().map(|e| e.amount))
        .ok_or_else(|| LedgerError::Validation("Monthly total is out of range".into()))
}

fn percent_change(current: Decimal, previous: Decimal) -> LedgerResult<Decimal> {
    if previous.is_zero() {
        return Ok(Decimal::ZERO);
    }
    current
        .checked_sub(previous)
        .and_then(|diff| diff.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round2)
        .ok_or_else(|| LedgerError::Validation("Month-over-month change is out of range".into()))
}
