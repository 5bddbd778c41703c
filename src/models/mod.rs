mod budget;
mod category;
mod expense;
mod goal;
mod month;

pub use budget::{
    checked_total, percentage_of, round2, BudgetPeriod, BudgetProgress, BudgetStatus,
    CategoryBudget, CategoryProgress,
};
pub use category::Category;
pub use expense::{
    parse_tags, validate_amount, Expense, ExpenseUpdate, NewExpense, PaymentMethod,
};
pub use goal::{GoalKind, GoalPriority, GoalStatus, SavingsGoal};
pub use month::{validate_date, MonthKey};

#[cfg(test)]
mod tests;
