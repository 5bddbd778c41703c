use anyhow::Result;
use chrono::{Local, NaiveDate};

use crate::config::Config;
use crate::db::Database;
use crate::error::LedgerError;
use crate::expenses::{self, ExpenseFilter, MAX_PAGE_SIZE};
use crate::goals::{self, GoalSummary};
use crate::insights::{self, Dashboard, DayTotal};
use crate::ledger::{BudgetAlert, BudgetLedger};
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Expenses,
    Budgets,
    Goals,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Expenses, Self::Budgets, Self::Goals]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Expenses => write!(f, "Expenses"),
            Self::Budgets => write!(f, "Budgets"),
            Self::Goals => write!(f, "Goals"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteExpense { id: i64, description: String },
    DeleteBudget { month: MonthKey },
    DeleteGoal { id: i64, title: String },
    AbandonGoal { id: i64, title: String },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) search_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) user: String,
    pub(crate) current_month: MonthKey,
    recent_limit: u32,
    goal_limit: usize,

    // Dashboard
    pub(crate) dashboard: Option<Dashboard>,
    pub(crate) daily: Vec<DayTotal>,

    // Expenses
    pub(crate) expenses: Vec<Expense>,
    pub(crate) expense_total: i64,
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,

    // Budgets
    pub(crate) progress: Option<BudgetProgress>,
    pub(crate) alerts: Vec<BudgetAlert>,
    pub(crate) budget_index: usize,
    pub(crate) budget_scroll: usize,

    // Goals
    pub(crate) goals: Vec<SavingsGoal>,
    pub(crate) goal_summary: GoalSummary,
    pub(crate) goal_index: usize,
    pub(crate) goal_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            search_input: String::new(),
            status_message: String::new(),
            show_help: false,
            user: config.user.clone(),
            current_month: MonthKey::current(),
            recent_limit: config.recent_expenses,
            goal_limit: config.dashboard_goals,

            dashboard: None,
            daily: Vec::new(),

            expenses: Vec::new(),
            expense_total: 0,
            expense_index: 0,
            expense_scroll: 0,

            progress: None,
            alerts: Vec::new(),
            budget_index: 0,
            budget_scroll: 0,

            goals: Vec::new(),
            goal_summary: GoalSummary::default(),
            goal_index: 0,
            goal_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    /// Day new expenses default to: today inside the current month, else its first day.
    pub(crate) fn default_expense_date(&self) -> NaiveDate {
        let today = Local::now().date_naive();
        if self.current_month.contains(today) {
            today
        } else {
            self.current_month.first_day()
        }
    }

    pub(crate) fn refresh_dashboard(&mut self, db: &Database) -> Result<()> {
        let today = Local::now().date_naive();
        let anchor = if self.current_month.contains(today) {
            today
        } else {
            self.current_month.last_day()
        };
        self.dashboard = Some(insights::dashboard(
            db,
            &self.user,
            anchor,
            self.recent_limit,
            self.goal_limit,
        )?);
        self.daily = insights::daily_totals(
            db,
            &self.user,
            self.current_month.first_day(),
            self.current_month.last_day(),
        )?;
        Ok(())
    }

    pub(crate) fn refresh_expenses(&mut self, db: &Database) -> Result<()> {
        let filter = ExpenseFilter {
            month: Some(self.current_month.clone()),
            search: (!self.search_input.is_empty()).then(|| self.search_input.clone()),
            ..Default::default()
        };
        let page = expenses::list(db, &self.user, &filter, 1, MAX_PAGE_SIZE)?;
        self.expenses = page.items;
        self.expense_total = page.total;
        clamp_cursor(&mut self.expense_index, &mut self.expense_scroll, self.expenses.len());
        Ok(())
    }

    pub(crate) fn refresh_budgets(&mut self, db: &mut Database) -> Result<()> {
        let ledger = BudgetLedger::new(db);
        self.progress = match ledger.get_progress(&self.user, self.current_month.as_str()) {
            Ok(p) => Some(p),
            Err(LedgerError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        self.alerts = ledger.alerts(&self.user, self.current_month.as_str())?;
        let len = self.progress.as_ref().map_or(0, |p| p.categories.len());
        clamp_cursor(&mut self.budget_index, &mut self.budget_scroll, len);
        Ok(())
    }

    pub(crate) fn refresh_goals(&mut self, db: &Database) -> Result<()> {
        self.goals = goals::list(db, &self.user, None)?;
        self.goal_summary = goals::summary(db, &self.user)?;
        clamp_cursor(&mut self.goal_index, &mut self.goal_scroll, self.goals.len());
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, db: &mut Database) -> Result<()> {
        self.refresh_dashboard(db)?;
        self.refresh_expenses(db)?;
        self.refresh_budgets(db)?;
        self.refresh_goals(db)?;
        Ok(())
    }

    /// Switch the month every screen shows and reload.
    pub(crate) fn set_month(&mut self, db: &mut Database, month: MonthKey) -> Result<()> {
        self.current_month = month;
        self.expense_index = 0;
        self.expense_scroll = 0;
        self.budget_index = 0;
        self.budget_scroll = 0;
        self.refresh_dashboard(db)?;
        self.refresh_expenses(db)?;
        self.refresh_budgets(db)?;
        Ok(())
    }

    pub(crate) fn selected_expense(&self) -> Option<&Expense> {
        self.expenses.get(self.expense_index)
    }

    pub(crate) fn selected_goal(&self) -> Option<&SavingsGoal> {
        self.goals.get(self.goal_index)
    }

    pub(crate) fn selected_budget_row(&self) -> Option<&CategoryProgress> {
        self.progress
            .as_ref()
            .and_then(|p| p.categories.get(self.budget_index))
    }

    /// Rows available to a bordered table (borders plus header).
    pub(crate) fn table_page(&self) -> usize {
        self.visible_rows.saturating_sub(3).max(1)
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    pub(crate) fn confirm(&mut self, message: String, action: PendingAction) {
        self.confirm_message = message;
        self.pending_action = Some(action);
        self.input_mode = InputMode::Confirm;
    }
}

fn clamp_cursor(index: &mut usize, scroll: &mut usize, len: usize) {
    if *index >= len {
        *index = len.saturating_sub(1);
    }
    if *scroll > *index {
        *scroll = *index;
    }
}
