#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(user: &str, amount: Decimal, category: Category, date: NaiveDate) -> Expense {
    Expense::from_new(user, NewExpense::new(amount, category, date))
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_schema_version_recorded() {
    let db = Database::open_in_memory().unwrap();
    let v: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(v, schema::CURRENT_VERSION);
}

#[test]
fn test_migrate_is_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let rows: i64 = db
        .conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn test_open_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    {
        let db = Database::open(&path).unwrap();
        db.insert_expense(&expense("u1", dec!(5), Category::FoodDining, day(2024, 3, 1)))
            .unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(db.count_expenses("u1", &ExpenseQuery::default()).unwrap(), 1);
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_expense_crud() {
    let db = Database::open_in_memory().unwrap();
    let mut e = expense("u1", dec!(12.50), Category::Groceries, day(2024, 3, 4));
    e.description = "Weekly shop".into();
    e.tags = vec!["home".into(), "food".into()];
    let id = db.insert_expense(&e).unwrap();

    let mut fetched = db.get_expense("u1", id).unwrap().unwrap();
    assert_eq!(fetched.amount, dec!(12.50));
    assert_eq!(fetched.category, Category::Groceries);
    assert_eq!(fetched.tags, vec!["home".to_string(), "food".to_string()]);

    fetched.amount = dec!(20);
    db.update_expense(&fetched).unwrap();
    assert_eq!(db.get_expense("u1", id).unwrap().unwrap().amount, dec!(20));

    assert!(db.delete_expense("u1", id).unwrap());
    assert!(db.get_expense("u1", id).unwrap().is_none());
    assert!(!db.delete_expense("u1", id).unwrap());
}

#[test]
fn test_expense_scoped_to_user() {
    let db = Database::open_in_memory().unwrap();
    let id = db
        .insert_expense(&expense("u1", dec!(5), Category::FoodDining, day(2024, 3, 1)))
        .unwrap();
    assert!(db.get_expense("u2", id).unwrap().is_none());
    assert!(!db.delete_expense("u2", id).unwrap());
}

#[test]
fn test_update_missing_expense() {
    let db = Database::open_in_memory().unwrap();
    let mut e = expense("u1", dec!(5), Category::FoodDining, day(2024, 3, 1));
    e.id = Some(404);
    assert!(matches!(db.update_expense(&e), Err(StoreError::NotFound(_))));
}

#[test]
fn test_query_expenses_filters() {
    let db = Database::open_in_memory().unwrap();
    let mut coffee = expense("u1", dec!(4), Category::FoodDining, day(2024, 3, 2));
    coffee.description = "Coffee beans".into();
    db.insert_expense(&coffee).unwrap();
    db.insert_expense(&expense("u1", dec!(40), Category::Transportation, day(2024, 3, 10)))
        .unwrap();
    db.insert_expense(&expense("u1", dec!(9), Category::FoodDining, day(2024, 4, 1)))
        .unwrap();

    let march = ExpenseQuery {
        from: Some(day(2024, 3, 1)),
        to: Some(day(2024, 3, 31)),
        ..Default::default()
    };
    let rows = db.query_expenses("u1", &march).unwrap();
    assert_eq!(rows.len(), 2);
    // Newest first
    assert_eq!(rows[0].date, day(2024, 3, 10));

    let food = ExpenseQuery {
        category: Some(Category::FoodDining),
        ..Default::default()
    };
    assert_eq!(db.count_expenses("u1", &food).unwrap(), 2);

    let search = ExpenseQuery {
        search: Some("beans".into()),
        ..Default::default()
    };
    let found = db.query_expenses("u1", &search).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].description, "Coffee beans");
}

#[test]
fn test_query_expenses_pagination() {
    let db = Database::open_in_memory().unwrap();
    for d in 1..=5 {
        db.insert_expense(&expense("u1", dec!(1), Category::FoodDining, day(2024, 3, d)))
            .unwrap();
    }
    let page = ExpenseQuery {
        limit: Some(2),
        offset: Some(2),
        ..Default::default()
    };
    let rows = db.query_expenses("u1", &page).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, day(2024, 3, 3));
    assert_eq!(db.count_expenses("u1", &page).unwrap(), 5);
}

#[test]
fn test_import_hash_lookup() {
    let db = Database::open_in_memory().unwrap();
    let mut e = expense("u1", dec!(3), Category::FoodDining, day(2024, 3, 1));
    e.import_hash = "abc123".into();
    db.insert_expense(&e).unwrap();
    assert!(db.has_import_hash("u1", "abc123").unwrap());
    assert!(!db.has_import_hash("u2", "abc123").unwrap());
    assert!(!db.has_import_hash("u1", "").unwrap());
}

#[test]
fn test_expenses_between_is_inclusive() {
    let db = Database::open_in_memory().unwrap();
    db.insert_expense(&expense("u1", dec!(1), Category::FoodDining, day(2024, 2, 29)))
        .unwrap();
    db.insert_expense(&expense("u1", dec!(2), Category::FoodDining, day(2024, 3, 1)))
        .unwrap();
    db.insert_expense(&expense("u1", dec!(3), Category::FoodDining, day(2024, 3, 31)))
        .unwrap();
    db.insert_expense(&expense("u1", dec!(4), Category::FoodDining, day(2024, 4, 1)))
        .unwrap();

    let rows = db
        .expenses_between("u1", day(2024, 3, 1), day(2024, 3, 31))
        .unwrap();
    let total: Decimal = rows.iter().map(|e| e.amount).sum();
    assert_eq!(total, dec!(5));
}

#[test]
fn test_category_sums_between() {
    let db = Database::open_in_memory().unwrap();
    db.insert_expense(&expense("u1", dec!(0.1), Category::FoodDining, day(2024, 3, 1)))
        .unwrap();
    db.insert_expense(&expense("u1", dec!(0.2), Category::FoodDining, day(2024, 3, 2)))
        .unwrap();
    db.insert_expense(&expense("u1", dec!(7), Category::Rent, day(2024, 3, 3)))
        .unwrap();
    let sums = db
        .category_sums_between("u1", day(2024, 3, 1), day(2024, 3, 31))
        .unwrap();
    assert_eq!(sums[&Category::FoodDining], dec!(0.3));
    assert_eq!(sums[&Category::Rent], dec!(7));
}

// ── Budget periods ────────────────────────────────────────────

#[test]
fn test_period_round_trip() {
    let mut db = Database::open_in_memory().unwrap();
    let month = MonthKey::parse("2024-03").unwrap();
    let mut period = BudgetPeriod::new("u1", month.clone());
    period.set_allocation(Category::FoodDining, dec!(500)).unwrap();
    period.apply_spent_delta(Category::FoodDining, dec!(120.25)).unwrap();
    db.save_period(&mut period).unwrap();
    assert!(period.id.is_some());

    let loaded = db.find_period("u1", &month).unwrap().unwrap();
    assert_eq!(loaded.id, period.id);
    assert_eq!(loaded.allocated(Category::FoodDining), dec!(500));
    assert_eq!(loaded.spent(Category::FoodDining), dec!(120.25));
    assert_eq!(loaded.total_spent, dec!(120.25));
}

#[test]
fn test_save_period_replaces_categories() {
    let mut db = Database::open_in_memory().unwrap();
    let month = MonthKey::parse("2024-03").unwrap();
    let mut period = BudgetPeriod::new("u1", month.clone());
    period.set_allocation(Category::FoodDining, dec!(100)).unwrap();
    period.set_allocation(Category::Rent, dec!(900)).unwrap();
    db.save_period(&mut period).unwrap();

    period.categories.remove(&Category::Rent);
    period.set_allocation(Category::FoodDining, dec!(150)).unwrap();
    db.save_period(&mut period).unwrap();

    let loaded = db.find_period("u1", &month).unwrap().unwrap();
    assert_eq!(loaded.categories.len(), 1);
    assert_eq!(loaded.total_allocated, dec!(150));
}

#[test]
fn test_one_period_per_user_month() {
    let mut db = Database::open_in_memory().unwrap();
    let month = MonthKey::parse("2024-03").unwrap();
    let mut a = BudgetPeriod::new("u1", month.clone());
    db.save_period(&mut a).unwrap();
    // A second fresh instance for the same key lands on the same row
    let mut b = BudgetPeriod::new("u1", month.clone());
    b.set_allocation(Category::Travel, dec!(10)).unwrap();
    db.save_period(&mut b).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(db.list_periods("u1").unwrap().len(), 1);
}

#[test]
fn test_list_periods_newest_first() {
    let mut db = Database::open_in_memory().unwrap();
    for m in ["2024-01", "2024-03", "2023-12"] {
        let mut p = BudgetPeriod::new("u1", MonthKey::parse(m).unwrap());
        db.save_period(&mut p).unwrap();
    }
    let mut other = BudgetPeriod::new("u2", MonthKey::parse("2025-01").unwrap());
    db.save_period(&mut other).unwrap();

    let months: Vec<String> = db
        .list_periods("u1")
        .unwrap()
        .iter()
        .map(|p| p.month.to_string())
        .collect();
    assert_eq!(months, vec!["2024-03", "2024-01", "2023-12"]);
}

#[test]
fn test_remove_period_cascades() {
    let mut db = Database::open_in_memory().unwrap();
    let month = MonthKey::parse("2024-03").unwrap();
    let mut p = BudgetPeriod::new("u1", month.clone());
    p.set_allocation(Category::FoodDining, dec!(1)).unwrap();
    db.save_period(&mut p).unwrap();

    assert!(db.remove_period("u1", &month).unwrap());
    assert!(db.find_period("u1", &month).unwrap().is_none());
    let orphans: i64 = db
        .conn
        .query_row("SELECT COUNT(*) FROM budget_categories", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphans, 0);
    assert!(!db.remove_period("u1", &month).unwrap());
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_in_transaction_rolls_back_on_error() {
    let mut db = Database::open_in_memory().unwrap();
    let result: Result<(), StoreError> = db.in_transaction(|db| {
        db.insert_expense(&expense("u1", dec!(1), Category::FoodDining, day(2024, 3, 1)))?;
        Err(StoreError::Database("boom".into()))
    });
    assert!(result.is_err());
    assert_eq!(db.count_expenses("u1", &ExpenseQuery::default()).unwrap(), 0);
}

#[test]
fn test_in_transaction_nested_joins_outer() {
    let mut db = Database::open_in_memory().unwrap();
    let result: Result<(), StoreError> = db.in_transaction(|db| {
        db.in_transaction(|db| {
            db.insert_expense(&expense("u1", dec!(1), Category::FoodDining, day(2024, 3, 1)))?;
            Ok::<_, StoreError>(())
        })?;
        Err(StoreError::Database("outer failed".into()))
    });
    assert!(result.is_err());
    assert_eq!(db.count_expenses("u1", &ExpenseQuery::default()).unwrap(), 0);
}

#[test]
fn test_in_transaction_commits() {
    let mut db = Database::open_in_memory().unwrap();
    db.in_transaction(|db| {
        db.insert_expense(&expense("u1", dec!(1), Category::FoodDining, day(2024, 3, 1)))?;
        Ok::<_, StoreError>(())
    })
    .unwrap();
    assert_eq!(db.count_expenses("u1", &ExpenseQuery::default()).unwrap(), 1);
}

// ── Goals ─────────────────────────────────────────────────────

#[test]
fn test_goal_crud() {
    let db = Database::open_in_memory().unwrap();
    let goal = SavingsGoal::new("u1", "Laptop".into(), dec!(1200), day(2024, 12, 1));
    let id = db.insert_goal(&goal).unwrap();

    let mut fetched = db.get_goal("u1", id).unwrap().unwrap();
    assert_eq!(fetched.title, "Laptop");
    assert_eq!(fetched.status, GoalStatus::Active);

    fetched.contribute(dec!(1200)).unwrap();
    db.update_goal(&fetched).unwrap();
    let done = db.get_goal("u1", id).unwrap().unwrap();
    assert_eq!(done.status, GoalStatus::Completed);

    assert!(db.delete_goal("u1", id).unwrap());
    assert!(db.get_goal("u1", id).unwrap().is_none());
}

#[test]
fn test_goals_status_filter_and_order() {
    let db = Database::open_in_memory().unwrap();
    let late = SavingsGoal::new("u1", "Late".into(), dec!(10), day(2025, 6, 1));
    let soon = SavingsGoal::new("u1", "Soon".into(), dec!(10), day(2024, 6, 1));
    let mut gone = SavingsGoal::new("u1", "Gone".into(), dec!(10), day(2024, 1, 1));
    gone.status = GoalStatus::Abandoned;
    db.insert_goal(&late).unwrap();
    db.insert_goal(&soon).unwrap();
    db.insert_goal(&gone).unwrap();

    let all = db.get_goals("u1", None).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].title, "Gone");

    let active = db.get_goals("u1", Some(GoalStatus::Active)).unwrap();
    let titles: Vec<&str> = active.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["Soon", "Late"]);
}

// ── Export ────────────────────────────────────────────────────

#[test]
fn test_export_to_csv() {
    let db = Database::open_in_memory().unwrap();
    let mut e = expense("u1", dec!(12.5), Category::FoodDining, day(2024, 3, 2));
    e.description = "Lunch, with team".into();
    db.insert_expense(&e).unwrap();
    db.insert_expense(&expense("u1", dec!(3), Category::FoodDining, day(2024, 4, 2)))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let month = MonthKey::parse("2024-03").unwrap();
    let n = db
        .export_to_csv("u1", path.to_str().unwrap(), Some(&month))
        .unwrap();
    assert_eq!(n, 1);

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Date,Description,Category,Amount,Payment Method,Notes,Tags"
    );
    assert_eq!(
        lines.next().unwrap(),
        "2024-03-02,\"Lunch, with team\",Food & Dining,12.50,cash,,"
    );
}

#[test]
fn test_export_empty_writes_nothing() {
    let db = Database::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("none.csv");
    assert_eq!(db.export_to_csv("u1", path.to_str().unwrap(), None).unwrap(), 0);
    assert!(!path.exists());
}
