use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{expand_home, Config};
use crate::db::Database;
use crate::error::{LedgerError, LedgerResult};
use crate::expenses::{self, ExpenseFilter, DEFAULT_PAGE_SIZE};
use crate::goals::{self, NewGoal};
use crate::import::CsvImporter;
use crate::insights;
use crate::ledger::BudgetLedger;
use crate::models::{
    parse_tags, validate_date, BudgetPeriod, Category, ExpenseUpdate, GoalKind, GoalPriority,
    GoalStatus, MonthKey, NewExpense, PaymentMethod,
};
use crate::ui::util::{format_amount, truncate};

/// Run one command. Ledger errors print as `Error [<status>]: <message>` and
/// exit with the matching code; anything else propagates.
pub(crate) fn as_cli(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let Err(e) = dispatch(args, config, db) else {
        return Ok(());
    };
    match e.downcast_ref::<LedgerError>() {
        Some(err) => {
            eprintln!("Error [{}]: {err}", err.status_code());
            std::process::exit(err.exit_code());
        }
        None => Err(e),
    }
}

fn dispatch(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };
    let rest = &args[1..];
    let user = config.user.as_str();

    match command.as_str() {
        "budget" | "b" => cli_budget(rest, user, db),
        "expense" | "e" => cli_expense(rest, user, db),
        "goal" | "g" => cli_goal(rest, user, db),
        "insights" | "i" => cli_insights(rest, user, db),
        "summary" | "s" => cli_summary(config, db),
        "import" => cli_import(rest, user, db),
        "export" => cli_export(rest, user, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("cashcraft {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("cashcraft - budgets, expenses and savings goals");
    println!();
    println!("Usage: cashcraft [--user <id>] [--db <path>] [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                  Launch interactive TUI");
    println!("  budget set <YYYY-MM> <category> <amt>   Set a category allocation");
    println!("  budget show [YYYY-MM]                   Progress per category");
    println!("  budget list                             All budget months");
    println!("  budget delete <YYYY-MM>                 Delete a month's budget");
    println!("  budget recalc <YYYY-MM>                 Rebuild spend from expenses");
    println!("  budget alerts [YYYY-MM]                 Categories near or over budget");
    println!("  expense add <amount> <category>         Record an expense");
    println!("    --date <YYYY-MM-DD> --desc <text> --notes <text> --payment <method> --tags <a,b>");
    println!("  expense edit <id>                       Change an expense");
    println!("    --amount --category --date --desc --notes --payment --tags");
    println!("  expense delete <id>                     Delete an expense");
    println!("  expense list                            List expenses, newest first");
    println!("    --month --from --to --category --search --page --limit");
    println!("  goal add <target> <due> <title>         Create a savings goal");
    println!("    --kind <kind> --priority <low|medium|high> --desc <text>");
    println!("  goal contribute <id> <amount>           Add (or withdraw) savings");
    println!("  goal abandon <id>                       Abandon a goal");
    println!("  goal delete <id>                        Delete a goal");
    println!("  goal list [active|completed|abandoned]  List goals by due date");
    println!("  insights [YYYY-MM]                      Breakdown and trend for a month");
    println!("  summary                                 Dashboard for this month");
    println!("  import <file.csv>                       Import expenses (auto-detects layout)");
    println!("  export [path] [--month <YYYY-MM>]       Export expenses to CSV");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
    println!();
    println!("Categories: {}", category_names());
}

// ── Argument helpers ─────────────────────────────────────────

/// Positional words plus `--flag value` pairs.
#[derive(Debug, Default)]
struct CliArgs<'a> {
    positional: Vec<&'a str>,
    flags: Vec<(&'a str, &'a str)>,
}

impl<'a> CliArgs<'a> {
    fn parse(args: &'a [String]) -> LedgerResult<Self> {
        let mut out = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                let value = iter.next().ok_or_else(|| {
                    LedgerError::Validation(format!("--{name} needs a value"))
                })?;
                out.flags.push((name, value.as_str()));
            } else {
                out.positional.push(arg.as_str());
            }
        }
        Ok(out)
    }

    fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    fn arg(&self, index: usize, what: &str) -> LedgerResult<&'a str> {
        self.positional
            .get(index)
            .copied()
            .ok_or_else(|| LedgerError::Validation(format!("Missing {what}")))
    }

    /// Positionals from `index` on, joined with spaces.
    fn rest(&self, index: usize) -> String {
        self.positional.get(index..).unwrap_or_default().join(" ")
    }
}

fn parse_amount(s: &str) -> LedgerResult<Decimal> {
    Decimal::from_str(s.trim().trim_start_matches('$'))
        .map_err(|_| LedgerError::Validation(format!("Invalid amount '{s}'")))
}

fn parse_date(s: &str) -> LedgerResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::Validation(format!("Date must be YYYY-MM-DD, got '{s}'")))?;
    validate_date(date)?;
    Ok(date)
}

fn parse_id(s: &str) -> LedgerResult<i64> {
    s.parse()
        .map_err(|_| LedgerError::Validation(format!("Invalid id '{s}'")))
}

fn month_or_current(arg: Option<&str>) -> LedgerResult<MonthKey> {
    arg.map_or_else(|| Ok(MonthKey::current()), MonthKey::parse)
}

fn category_names() -> String {
    Category::all()
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── budget ───────────────────────────────────────────────────

fn cli_budget(args: &[String], user: &str, db: &mut Database) -> Result<()> {
    let args = CliArgs::parse(args)?;
    let sub = args.arg(0, "budget subcommand (set|show|list|delete|recalc|alerts)")?;
    let mut ledger = BudgetLedger::new(db);

    match sub {
        "set" => {
            let month = args.arg(1, "month")?;
            // Category names may contain spaces; the amount is the last word
            let amount = parse_amount(args.positional.last().copied().unwrap_or_default())?;
            let name = args
                .positional
                .get(2..args.positional.len().saturating_sub(1))
                .unwrap_or_default()
                .join(" ");
            if name.is_empty() {
                return Err(LedgerError::Validation("Missing category".into()).into());
            }
            let category = Category::parse(&name)?;
            let period = ledger.set_allocation(user, month, category, amount)?;
            println!(
                "Budget {month}: {category} = {} (total {})",
                format_amount(period.allocated(category)),
                format_amount(period.total_allocated)
            );
        }
        "show" => {
            let month = month_or_current(args.positional.get(1).copied())?;
            let period = ledger.get_period(user, month.as_str())?;
            print_progress(&period)?;
        }
        "list" => {
            let periods = ledger.list_periods(user)?;
            if periods.is_empty() {
                println!("No budgets");
                return Ok(());
            }
            println!("{:<9} {:>14} {:>14} {:>8}", "Month", "Allocated", "Spent", "Used");
            println!("{}", "─".repeat(48));
            for p in &periods {
                println!(
                    "{:<9} {:>14} {:>14} {:>7}%",
                    p.month,
                    format_amount(p.total_allocated),
                    format_amount(p.total_spent),
                    crate::models::percentage_of(p.total_spent, p.total_allocated)?
                );
            }
        }
        "delete" => {
            let month = args.arg(1, "month")?;
            ledger.delete_budget_period(user, month)?;
            println!("Deleted budget for {month}");
        }
        "recalc" => {
            let month = args.arg(1, "month")?;
            let period = ledger.recalculate_from_scratch(user, month)?;
            println!(
                "Recalculated {month}: spent {} across {} categories",
                format_amount(period.total_spent),
                period.categories.len()
            );
        }
        "alerts" => {
            let month = month_or_current(args.positional.get(1).copied())?;
            let alerts = ledger.alerts(user, month.as_str())?;
            if alerts.is_empty() {
                println!("No budget alerts for {month}");
            }
            for alert in &alerts {
                println!("[{}] {}", alert.status, alert.message());
            }
        }
        other => anyhow::bail!("Unknown budget subcommand: {other}"),
    }
    Ok(())
}

fn print_progress(period: &BudgetPeriod) -> Result<()> {
    let progress = period.progress()?;
    println!("Budget - {}", progress.month);
    println!("{}", "─".repeat(72));
    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>7}  Status",
        "Category", "Allocated", "Spent", "Remaining", "Used"
    );
    for c in &progress.categories {
        println!(
            "{:<20} {:>12} {:>12} {:>12} {:>6}%  {}",
            truncate(c.category.as_str(), 20),
            format_amount(c.allocated),
            format_amount(c.spent),
            format_amount(c.remaining),
            c.percentage_used,
            c.status
        );
    }
    println!("{}", "─".repeat(72));
    println!(
        "{:<20} {:>12} {:>12} {:>12}",
        "Total",
        format_amount(progress.total_allocated),
        format_amount(progress.total_spent),
        format_amount(progress.total_remaining)
    );
    Ok(())
}

// ── expense ──────────────────────────────────────────────────

fn cli_expense(args: &[String], user: &str, db: &mut Database) -> Result<()> {
    let args = CliArgs::parse(args)?;
    let sub = args.arg(0, "expense subcommand (add|edit|delete|list)")?;

    match sub {
        "add" => {
            let amount = parse_amount(args.arg(1, "amount")?)?;
            let category = Category::parse(&args.rest(2))?;
            let date = match args.flag("date") {
                Some(d) => parse_date(d)?,
                None => Local::now().date_naive(),
            };
            let mut new = NewExpense::new(amount, category, date)
                .with_description(args.flag("desc").unwrap_or_default());
            new.notes = args.flag("notes").unwrap_or_default().to_string();
            new.payment_method = args.flag("payment").map(PaymentMethod::parse).unwrap_or_default();
            new.tags = parse_tags(args.flag("tags").unwrap_or_default());

            let expense = expenses::add(db, user, new)?;
            println!(
                "Added expense #{}: {} {} on {}",
                expense.id.unwrap_or_default(),
                format_amount(expense.amount),
                expense.category,
                expense.date
            );
        }
        "edit" => {
            let id = parse_id(args.arg(1, "expense id")?)?;
            let changes = ExpenseUpdate {
                amount: args.flag("amount").map(parse_amount).transpose()?,
                category: args.flag("category").map(Category::parse).transpose()?,
                date: args.flag("date").map(parse_date).transpose()?,
                description: args.flag("desc").map(str::to_string),
                notes: args.flag("notes").map(str::to_string),
                payment_method: args.flag("payment").map(PaymentMethod::parse),
                tags: args.flag("tags").map(parse_tags),
            };
            let expense = expenses::update(db, user, id, &changes)?;
            println!(
                "Updated expense #{id}: {} {} on {}",
                format_amount(expense.amount),
                expense.category,
                expense.date
            );
        }
        "delete" => {
            let id = parse_id(args.arg(1, "expense id")?)?;
            let expense = expenses::remove(db, user, id)?;
            println!(
                "Deleted expense #{id}: {} {}",
                format_amount(expense.amount),
                expense.description
            );
        }
        "list" => {
            let filter = ExpenseFilter {
                from: args.flag("from").map(parse_date).transpose()?,
                to: args.flag("to").map(parse_date).transpose()?,
                month: args.flag("month").map(MonthKey::parse).transpose()?,
                category: args.flag("category").map(Category::parse).transpose()?,
                search: args.flag("search").map(str::to_string),
            };
            let page = args.flag("page").map(parse_id).transpose()?.unwrap_or(1);
            let limit = args
                .flag("limit")
                .map(parse_id)
                .transpose()?
                .unwrap_or(i64::from(DEFAULT_PAGE_SIZE));
            let page = expenses::list(
                db,
                user,
                &filter,
                u32::try_from(page).unwrap_or(1),
                u32::try_from(limit).unwrap_or(DEFAULT_PAGE_SIZE),
            )?;

            if page.items.is_empty() {
                println!("No expenses");
                return Ok(());
            }
            println!(
                "{:<6} {:<10} {:<28} {:<18} {:>12}",
                "ID", "Date", "Description", "Category", "Amount"
            );
            println!("{}", "─".repeat(78));
            for e in &page.items {
                println!(
                    "{:<6} {:<10} {:<28} {:<18} {:>12}",
                    e.id.unwrap_or_default(),
                    e.date,
                    truncate(&e.description, 28),
                    truncate(e.category.as_str(), 18),
                    format_amount(e.amount)
                );
            }
            println!(
                "Page {}/{} ({} expenses, {} on this page)",
                page.page,
                page.pages.max(1),
                page.total,
                format_amount(expenses::total(&page.items))
            );
        }
        other => anyhow::bail!("Unknown expense subcommand: {other}"),
    }
    Ok(())
}

// ── goal ─────────────────────────────────────────────────────

fn cli_goal(args: &[String], user: &str, db: &mut Database) -> Result<()> {
    let args = CliArgs::parse(args)?;
    let sub = args.arg(0, "goal subcommand (add|contribute|abandon|delete|list)")?;

    match sub {
        "add" => {
            let target = parse_amount(args.arg(1, "target amount")?)?;
            let due = parse_date(args.arg(2, "due date")?)?;
            let mut new = NewGoal::new(args.rest(3), target, due);
            new.kind = args.flag("kind").map(GoalKind::parse).unwrap_or_default();
            new.priority = args.flag("priority").map(GoalPriority::parse).unwrap_or_default();
            new.description = args.flag("desc").unwrap_or_default().to_string();
            let goal = goals::create(db, user, new)?;
            println!(
                "Created goal #{}: {} ({} by {})",
                goal.id.unwrap_or_default(),
                goal.title,
                format_amount(goal.target_amount),
                goal.due_date
            );
        }
        "contribute" => {
            let id = parse_id(args.arg(1, "goal id")?)?;
            let amount = parse_amount(args.arg(2, "amount")?)?;
            let goal = goals::contribute(db, user, id, amount)?;
            println!(
                "{}: {} of {} ({}%, {})",
                goal.title,
                format_amount(goal.current_amount),
                format_amount(goal.target_amount),
                goal.progress_percent(),
                goal.status
            );
        }
        "abandon" => {
            let id = parse_id(args.arg(1, "goal id")?)?;
            let goal = goals::abandon(db, user, id)?;
            println!("Abandoned goal: {}", goal.title);
        }
        "delete" => {
            let id = parse_id(args.arg(1, "goal id")?)?;
            goals::delete(db, user, id)?;
            println!("Deleted goal #{id}");
        }
        "list" => {
            let status = args.positional.get(1).map(|s| GoalStatus::parse(s)).transpose()?;
            let list = goals::list(db, user, status)?;
            if list.is_empty() {
                println!("No goals");
                return Ok(());
            }
            println!(
                "{:<5} {:<24} {:>12} {:>12} {:>5} {:<10} {:<10}",
                "ID", "Title", "Saved", "Target", "%", "Due", "Status"
            );
            println!("{}", "─".repeat(84));
            for g in &list {
                println!(
                    "{:<5} {:<24} {:>12} {:>12} {:>4}% {:<10} {:<10}",
                    g.id.unwrap_or_default(),
                    truncate(&g.title, 24),
                    format_amount(g.current_amount),
                    format_amount(g.target_amount),
                    g.progress_percent(),
                    g.due_date,
                    g.status
                );
            }
        }
        other => anyhow::bail!("Unknown goal subcommand: {other}"),
    }
    Ok(())
}

// ── insights / summary ───────────────────────────────────────

fn cli_insights(args: &[String], user: &str, db: &mut Database) -> Result<()> {
    let args = CliArgs::parse(args)?;
    let month = month_or_current(args.positional.first().copied())?;
    let (from, to) = (month.first_day(), month.last_day());

    let trend = insights::expense_trend(db, user, &month)?;
    println!("cashcraft insights - {month}");
    println!("{}", "─".repeat(48));
    println!(
        "  This month:  {} ({} expenses)",
        format_amount(trend.current_total),
        trend.current_count
    );
    println!(
        "  Last month:  {} ({} expenses)",
        format_amount(trend.previous_total),
        trend.previous_count
    );
    println!("  Change:      {}% ({})", trend.change, trend.trend.as_str());

    let breakdown = insights::category_breakdown(db, user, from, to)?;
    if !breakdown.is_empty() {
        println!();
        println!("Spending by Category:");
        for c in &breakdown {
            println!(
                "  {:<20} {:>12}  {:>3} x avg {}",
                c.category.as_str(),
                format_amount(c.total),
                c.count,
                format_amount(c.average)
            );
        }
    }

    let daily = insights::daily_totals(db, user, from, to)?;
    if !daily.is_empty() {
        println!();
        println!("Daily:");
        for d in &daily {
            println!("  {}  {:>12}  ({})", d.date, format_amount(d.total), d.count);
        }
    }

    let year = month.year();
    let monthly = insights::monthly_totals(db, user, year)?;
    if !monthly.is_empty() {
        println!();
        println!("{year} by month:");
        for m in &monthly {
            println!("  {}  {:>12}  ({})", m.month, format_amount(m.total), m.count);
        }
    }
    Ok(())
}

fn cli_summary(config: &Config, db: &mut Database) -> Result<()> {
    let user = config.user.as_str();
    let today = Local::now().date_naive();
    let dash = insights::dashboard(db, user, today, config.recent_expenses, config.dashboard_goals)?;

    println!("cashcraft - {} ({user})", dash.month);
    println!("{}", "─".repeat(48));
    println!(
        "  Spent:       {} ({} expenses)",
        format_amount(dash.month_total),
        dash.month_count
    );
    println!("  Last month:  {}", format_amount(dash.previous_total));
    println!("  Change:      {}%", dash.change);
    if let Some(budget) = &dash.budget {
        println!(
            "  Budget:      {} of {} ({}%), {} left",
            format_amount(budget.spent),
            format_amount(budget.budgeted),
            budget.percentage,
            format_amount(budget.remaining)
        );
    }

    if !dash.top_categories.is_empty() {
        println!();
        println!("Top Categories:");
        for c in &dash.top_categories {
            println!("  {:<20} {:>12}", c.category.as_str(), format_amount(c.total));
        }
    }

    if !dash.recent.is_empty() {
        println!();
        println!("Recent Expenses:");
        for e in &dash.recent {
            println!(
                "  {}  {:<28} {:>12}",
                e.date,
                truncate(&e.description, 28),
                format_amount(e.amount)
            );
        }
    }

    let summary = goals::summary(db, user)?;
    if summary.total > 0 {
        println!();
        println!(
            "Goals: {} active, {} completed; saved {} of {}",
            summary.active,
            summary.completed,
            format_amount(summary.total_saved),
            format_amount(summary.total_target)
        );
        for g in &dash.goals {
            println!(
                "  {:<24} {:>4}%  due {}",
                truncate(&g.title, 24),
                g.progress_percent(),
                g.due_date
            );
        }
    }

    let alerts = BudgetLedger::new(db).alerts(user, dash.month.as_str())?;
    if !alerts.is_empty() {
        println!();
        for alert in &alerts {
            println!("! {}", alert.message());
        }
    }
    Ok(())
}

// ── import / export ──────────────────────────────────────────

fn cli_import(args: &[String], user: &str, db: &mut Database) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: cashcraft import <file.csv>");
    };
    let path = expand_home(Path::new(file_path));
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let (profile, parsed) = CsvImporter::load(&path)?;
    println!("Detected format: {}", profile.name);
    println!(
        "Parsed {} expenses ({} non-expense rows skipped)",
        parsed.expenses.len(),
        parsed.skipped
    );

    let summary = expenses::import(db, user, parsed.expenses)?;
    println!(
        "Imported {} new expenses ({} duplicates skipped)",
        summary.inserted, summary.duplicates
    );
    Ok(())
}

fn cli_export(args: &[String], user: &str, db: &mut Database) -> Result<()> {
    let args = CliArgs::parse(args)?;
    let month = args.flag("month").map(MonthKey::parse).transpose()?;
    let suffix = month.as_ref().map_or("all", |m| m.as_str());

    let output_path = match args.positional.first() {
        Some(p) => expand_home(Path::new(p)),
        None => default_export_path(suffix),
    };

    let count = db.export_to_csv(user, &output_path.display().to_string(), month.as_ref())?;
    if count == 0 {
        println!("No expenses to export");
    } else {
        println!("Exported {count} expenses to {}", output_path.display());
    }
    Ok(())
}

fn default_export_path(suffix: &str) -> PathBuf {
    let home = directories::UserDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(format!("cashcraft-export-{suffix}.csv"))
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
