use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use super::app::{App, InputMode, PendingAction, Screen};
use crate::config::expand_home;
use crate::db::Database;
use crate::expenses;
use crate::goals::{self, NewGoal};
use crate::ledger::BudgetLedger;
use crate::models::{Category, ExpenseUpdate, MonthKey, NewExpense};
use crate::ui::util::format_amount;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit cashcraft", cmd_quit, r);
    register_command!("quit", "Quit cashcraft", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("e", "Go to Expenses", cmd_expenses, r);
    register_command!("expenses", "Go to Expenses", cmd_expenses, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("g", "Go to Goals", cmd_goals, r);
    register_command!("goals", "Go to Goals", cmd_goals, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("month", "Set month (e.g. :month 2024-01)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2024-01)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!(
        "search",
        "Search expenses (e.g. :search coffee)",
        cmd_search,
        r
    );
    register_command!("s", "Search expenses (e.g. :s coffee)", cmd_search, r);
    register_command!(
        "add",
        "Add expense (e.g. :add 12.50 food Lunch)",
        cmd_add,
        r
    );
    register_command!("a", "Add expense (e.g. :a 12.50 food Lunch)", cmd_add, r);
    register_command!("amount", "Change amount of selected expense", cmd_amount, r);
    register_command!("recat", "Re-categorize selected expense", cmd_recat, r);
    register_command!(
        "redate",
        "Move selected expense (e.g. :redate 2024-01-15)",
        cmd_redate,
        r
    );
    register_command!("rename", "Rename selected expense", cmd_rename, r);
    register_command!("delete", "Delete selected expense", cmd_delete_expense, r);
    register_command!(
        "budget",
        "Set budget (e.g. :budget Food & Dining 500)",
        cmd_budget,
        r
    );
    register_command!(
        "delete-budget",
        "Delete this month's budget",
        cmd_delete_budget,
        r
    );
    register_command!(
        "recalc",
        "Rebuild this month's spend from expenses",
        cmd_recalc,
        r
    );
    register_command!(
        "goal",
        "Create goal (e.g. :goal 5000 2025-12-31 New car)",
        cmd_goal,
        r
    );
    register_command!(
        "contribute",
        "Add savings to selected goal (e.g. :contribute 100)",
        cmd_contribute,
        r
    );
    register_command!("abandon", "Abandon selected goal", cmd_abandon, r);
    register_command!("delete-goal", "Delete selected goal", cmd_delete_goal, r);
    register_command!(
        "export",
        "Export expenses to CSV (e.g. :export ~/spend.csv)",
        cmd_export,
        r
    );

    r
});

/// Run one `:` command. Failures land in the status bar; the session keeps going.
pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        if let Err(e) = (cmd.run)(args, app, db) {
            warn!(command = cmd_name, error = %e, "Command failed");
            app.set_status(format!("{e}"));
        }
    } else {
        // Try fuzzy match
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

pub(crate) fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| (levenshtein(input, k), **k))
        .unwrap_or(&"help")
        .to_string()
}

pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim().trim_start_matches('$')).ok()
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh_dashboard(db)
}

fn cmd_expenses(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Expenses;
    app.refresh_expenses(db)
}

fn cmd_budgets(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Budgets;
    app.refresh_budgets(db)
}

fn cmd_goals(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Goals;
    app.refresh_goals(db)
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_month(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_month(db, MonthKey::current())?;
        app.set_status(format!("Month: {}", app.current_month));
        return Ok(());
    }

    // Accept "2024-01" or a bare month number within the current year
    let candidate = if args.len() <= 2 {
        format!("{}-{args:0>2}", app.current_month.year())
    } else {
        args.to_string()
    };

    match MonthKey::parse(&candidate) {
        Ok(month) => {
            app.set_month(db, month)?;
            app.set_status(format!("Switched to month: {}", app.current_month));
        }
        Err(_) => app.set_status("Invalid month format. Use YYYY-MM (e.g. 2024-01)"),
    }
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let month = app.current_month.next();
    app.set_month(db, month)?;
    app.set_status(format!("Month: {}", app.current_month));
    Ok(())
}

fn cmd_prev_month(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let month = app.current_month.prev();
    app.set_month(db, month)?;
    app.set_status(format!("Month: {}", app.current_month));
    Ok(())
}

fn cmd_search(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.search_input = args.to_string();
    app.screen = Screen::Expenses;
    app.expense_index = 0;
    app.expense_scroll = 0;
    app.refresh_expenses(db)?;

    if args.is_empty() {
        app.set_status("Search cleared");
    } else {
        app.set_status(format!("Searching: {args}"));
    }
    Ok(())
}

/// Reload everything an expense mutation can move.
fn after_expense_change(app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.refresh_expenses(db)?;
    app.refresh_budgets(db)?;
    app.refresh_dashboard(db)
}

fn cmd_add(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let mut parts = args.splitn(3, ' ');
    let (Some(amount_str), Some(category_str)) = (parts.next(), parts.next()) else {
        app.set_status("Usage: :add <amount> <category> [description]");
        return Ok(());
    };
    let description = parts.next().unwrap_or("").trim();

    let Some(amount) = parse_amount(amount_str) else {
        app.set_status(format!("Invalid amount: {amount_str}"));
        return Ok(());
    };
    let category = Category::parse(category_str)?;

    let new = NewExpense::new(amount, category, app.default_expense_date())
        .with_description(description);
    let user = app.user.clone();
    let expense = expenses::add(db, &user, new)?;
    after_expense_change(app, db)?;
    app.set_status(format!(
        "Added {} {} on {}",
        format_amount(expense.amount),
        expense.category,
        expense.date
    ));
    Ok(())
}

/// Apply `changes` to the expense under the cursor.
fn update_selected(app: &mut App, db: &mut Database, changes: ExpenseUpdate) -> anyhow::Result<()> {
    let Some(id) = app.selected_expense().and_then(|e| e.id) else {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    };
    let user = app.user.clone();
    let updated = expenses::update(db, &user, id, &changes)?;
    after_expense_change(app, db)?;
    app.set_status(format!(
        "Updated: {} {} {} on {}",
        updated.description,
        format_amount(updated.amount),
        updated.category,
        updated.date
    ));
    Ok(())
}

fn cmd_amount(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(amount) = parse_amount(args) else {
        app.set_status("Usage: :amount <amount>");
        return Ok(());
    };
    update_selected(
        app,
        db,
        ExpenseUpdate {
            amount: Some(amount),
            ..Default::default()
        },
    )
}

fn cmd_recat(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :recat <category>");
        return Ok(());
    }
    let category = Category::parse(args)?;
    update_selected(
        app,
        db,
        ExpenseUpdate {
            category: Some(category),
            ..Default::default()
        },
    )
}

fn cmd_redate(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Ok(date) = NaiveDate::parse_from_str(args, "%Y-%m-%d") else {
        app.set_status("Usage: :redate <YYYY-MM-DD>");
        return Ok(());
    };
    update_selected(
        app,
        db,
        ExpenseUpdate {
            date: Some(date),
            ..Default::default()
        },
    )
}

fn cmd_rename(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Expenses || app.expenses.is_empty() {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    }

    if args.is_empty() {
        // Enter editing mode for inline rename
        if let Some(expense) = app.selected_expense() {
            app.command_input = expense.description.clone();
            app.input_mode = InputMode::Editing;
            app.set_status("Type new description, press Enter to confirm");
        }
        return Ok(());
    }

    update_selected(
        app,
        db,
        ExpenseUpdate {
            description: Some(args.to_string()),
            ..Default::default()
        },
    )
}

fn cmd_delete_expense(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Expenses || app.expenses.is_empty() {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    }

    if let Some(expense) = app.selected_expense() {
        if let Some(id) = expense.id {
            let description = if expense.description.is_empty() {
                format!("{} {}", format_amount(expense.amount), expense.category)
            } else {
                expense.description.clone()
            };
            app.confirm(
                format!("Delete '{description}'?"),
                PendingAction::DeleteExpense { id, description },
            );
        }
    }
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    // Last token is the amount, everything before is the category name
    let parts: Vec<&str> = args.rsplitn(2, ' ').collect();
    if parts.len() < 2 {
        app.set_status("Usage: :budget <category> <amount>. Example: :budget Food & Dining 500");
        return Ok(());
    }

    let amount_str = parts[0];
    let Some(amount) = parse_amount(amount_str) else {
        app.set_status(format!("Invalid amount: {amount_str}"));
        return Ok(());
    };
    let category = Category::parse(parts[1])?;

    let user = app.user.clone();
    let month = app.current_month.clone();
    BudgetLedger::new(db).set_allocation(&user, month.as_str(), category, amount)?;
    app.refresh_budgets(db)?;
    app.refresh_dashboard(db)?;
    app.screen = Screen::Budgets;
    app.set_status(format!(
        "Budget set: {category} = {} for {month}",
        format_amount(amount)
    ));
    Ok(())
}

fn cmd_delete_budget(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.progress.is_none() {
        app.set_status("No budget to delete");
        return Ok(());
    }
    let month = app.current_month.clone();
    app.confirm(
        format!("Delete the whole budget for {month}?"),
        PendingAction::DeleteBudget { month },
    );
    Ok(())
}

fn cmd_recalc(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let user = app.user.clone();
    let month = app.current_month.clone();
    let period = BudgetLedger::new(db).recalculate_from_scratch(&user, month.as_str())?;
    app.refresh_budgets(db)?;
    app.refresh_dashboard(db)?;
    app.set_status(format!(
        "Recalculated {month}: spent {}",
        format_amount(period.total_spent)
    ));
    Ok(())
}

fn cmd_goal(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let parts: Vec<&str> = args.splitn(3, ' ').collect();
    if parts.len() < 3 {
        app.set_status("Usage: :goal <target> <YYYY-MM-DD> <title>");
        return Ok(());
    }
    let Some(target) = parse_amount(parts[0]) else {
        app.set_status(format!("Invalid amount: {}", parts[0]));
        return Ok(());
    };
    let Ok(due) = NaiveDate::parse_from_str(parts[1], "%Y-%m-%d") else {
        app.set_status(format!("Invalid due date: {}", parts[1]));
        return Ok(());
    };

    let goal = goals::create(db, &app.user, NewGoal::new(parts[2].trim(), target, due))?;
    app.refresh_goals(db)?;
    app.refresh_dashboard(db)?;
    app.screen = Screen::Goals;
    app.set_status(format!(
        "Created goal: {} ({} by {})",
        goal.title,
        format_amount(goal.target_amount),
        goal.due_date
    ));
    Ok(())
}

fn cmd_contribute(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(amount) = parse_amount(args) else {
        app.set_status("Usage: :contribute <amount> (negative to withdraw)");
        return Ok(());
    };
    let Some(id) = app.selected_goal().and_then(|g| g.id) else {
        app.set_status("Navigate to Goals and select one first");
        return Ok(());
    };

    let goal = goals::contribute(db, &app.user, id, amount)?;
    app.refresh_goals(db)?;
    app.refresh_dashboard(db)?;
    app.set_status(format!(
        "{}: {} of {} ({}%)",
        goal.title,
        format_amount(goal.current_amount),
        format_amount(goal.target_amount),
        goal.progress_percent()
    ));
    Ok(())
}

fn cmd_abandon(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let Some((id, title)) = app
        .selected_goal()
        .and_then(|g| g.id.map(|id| (id, g.title.clone())))
    else {
        app.set_status("Navigate to Goals and select one first");
        return Ok(());
    };
    app.confirm(
        format!("Abandon goal '{title}'?"),
        PendingAction::AbandonGoal { id, title },
    );
    Ok(())
}

fn cmd_delete_goal(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    let Some((id, title)) = app
        .selected_goal()
        .and_then(|g| g.id.map(|id| (id, g.title.clone())))
    else {
        app.set_status("Navigate to Goals and select one first");
        return Ok(());
    };
    app.confirm(
        format!("Delete goal '{title}'?"),
        PendingAction::DeleteGoal { id, title },
    );
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        let home = directories::UserDirs::new()
            .map(|d| d.home_dir().to_path_buf())
            .unwrap_or_else(|| ".".into());
        home.join(format!("cashcraft-export-{}.csv", app.current_month))
    } else {
        expand_home(Path::new(args))
    };

    let path = path.display().to_string();
    let count = db.export_to_csv(&app.user, &path, Some(&app.current_month))?;
    if count == 0 {
        app.set_status("No expenses to export");
    } else {
        app.set_status(format!("Exported {count} expenses to {path}"));
    }
    Ok(())
}

/// Carry out a confirmed action.
pub(crate) fn run_pending(action: PendingAction, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let user = app.user.clone();
    match action {
        PendingAction::DeleteExpense { id, description } => {
            expenses::remove(db, &user, id)?;
            after_expense_change(app, db)?;
            app.set_status(format!("Deleted: {description}"));
        }
        PendingAction::DeleteBudget { month } => {
            BudgetLedger::new(db).delete_budget_period(&user, month.as_str())?;
            app.refresh_budgets(db)?;
            app.refresh_dashboard(db)?;
            app.set_status(format!("Deleted budget for {month}"));
        }
        PendingAction::DeleteGoal { id, title } => {
            goals::delete(db, &user, id)?;
            app.refresh_goals(db)?;
            app.refresh_dashboard(db)?;
            app.set_status(format!("Deleted goal: {title}"));
        }
        PendingAction::AbandonGoal { id, title } => {
            goals::abandon(db, &user, id)?;
            app.refresh_goals(db)?;
            app.refresh_dashboard(db)?;
            app.set_status(format!("Abandoned goal: {title}"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
