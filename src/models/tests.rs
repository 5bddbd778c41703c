#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::*;
use crate::error::LedgerError;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Category ──────────────────────────────────────────────────

#[test]
fn test_category_parse_display_name() {
    assert_eq!(Category::parse("Food & Dining").unwrap(), Category::FoodDining);
    assert_eq!(Category::parse("food & dining").unwrap(), Category::FoodDining);
    assert_eq!(Category::parse("  Groceries ").unwrap(), Category::Groceries);
}

#[test]
fn test_category_parse_slug_and_alias() {
    assert_eq!(Category::parse("bills-utilities").unwrap(), Category::BillsUtilities);
    assert_eq!(Category::parse("personal-care").unwrap(), Category::PersonalCare);
    assert_eq!(Category::parse("food").unwrap(), Category::FoodDining);
    assert_eq!(Category::parse("Transport").unwrap(), Category::Transportation);
    assert_eq!(Category::parse("health").unwrap(), Category::Healthcare);
    assert_eq!(Category::parse("other").unwrap(), Category::Others);
}

#[test]
fn test_category_parse_unknown() {
    let err = Category::parse("Gadgets").unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("Gadgets"));
    assert_eq!(Category::parse_or_other("Gadgets"), Category::Others);
}

#[test]
fn test_category_roundtrip() {
    for c in Category::all() {
        assert_eq!(Category::parse(c.as_str()).unwrap(), *c);
        assert_eq!(Category::parse(c.slug()).unwrap(), *c);
    }
    assert_eq!(Category::all().len(), 14);
}

#[test]
fn test_category_order_follows_listing() {
    let mut sorted = Category::all().to_vec();
    sorted.sort();
    assert_eq!(sorted, Category::all());
    assert_eq!(format!("{}", Category::BillsUtilities), "Bills & Utilities");
}

// ── MonthKey ──────────────────────────────────────────────────

#[test]
fn test_month_parse_valid() {
    let m = MonthKey::parse("2025-11").unwrap();
    assert_eq!(m.as_str(), "2025-11");
    assert_eq!(m.year(), 2025);
    assert_eq!(m.month(), 11);
}

#[test]
fn test_month_parse_rejects_malformed() {
    for bad in ["2025-13", "2025-00", "2025-1", "25-11", "2025/11", "2025-11-01", "", "abcd-ef"] {
        let err = MonthKey::parse(bad).unwrap_err();
        assert_eq!(err.status_code(), 400, "{bad} should be rejected");
    }
}

#[test]
fn test_month_bounds() {
    let feb_leap = MonthKey::parse("2024-02").unwrap();
    assert_eq!(feb_leap.first_day(), day(2024, 2, 1));
    assert_eq!(feb_leap.last_day(), day(2024, 2, 29));

    let feb = MonthKey::parse("2025-02").unwrap();
    assert_eq!(feb.last_day(), day(2025, 2, 28));

    let dec_ = MonthKey::parse("2025-12").unwrap();
    assert_eq!(dec_.last_day(), day(2025, 12, 31));
}

#[test]
fn test_month_of_and_contains() {
    let m = MonthKey::of(day(2025, 11, 30));
    assert_eq!(m.as_str(), "2025-11");
    assert!(m.contains(day(2025, 11, 1)));
    assert!(m.contains(day(2025, 11, 30)));
    assert!(!m.contains(day(2025, 12, 1)));
    assert!(!m.contains(day(2024, 11, 15)));
}

#[test]
fn test_month_next_prev_wrap_year() {
    let m = MonthKey::parse("2025-12").unwrap();
    assert_eq!(m.next().as_str(), "2026-01");
    assert_eq!(MonthKey::parse("2025-01").unwrap().prev().as_str(), "2024-12");
    assert_eq!(m.next().prev(), m);
}

#[test]
fn test_month_of_pads_short_years() {
    let m = MonthKey::of(day(5, 3, 9));
    assert_eq!(m.as_str(), "0005-03");
    assert_eq!(m, MonthKey::parse("0005-03").unwrap());
    assert_eq!((m.year(), m.month()), (5, 3));
}

#[test]
fn test_month_of_five_digit_year_keeps_month() {
    let m = MonthKey::of(day(10000, 7, 15));
    assert_eq!((m.year(), m.month()), (10000, 7));
    assert_eq!(m.first_day(), day(10000, 7, 1));
    assert!(m.contains(day(10000, 7, 31)));
    assert!(!m.contains(day(10000, 1, 1)));
}

#[test]
fn test_month_next_prev_stop_at_supported_range() {
    let last = MonthKey::parse("9999-12").unwrap();
    assert_eq!(last.next(), last);
    let first = MonthKey::parse("0001-01").unwrap();
    assert_eq!(first.prev(), first);
}

#[test]
fn test_validate_date_year_range() {
    assert!(validate_date(day(1, 1, 1)).is_ok());
    assert!(validate_date(day(9999, 12, 31)).is_ok());
    assert!(matches!(
        validate_date(day(10000, 1, 1)),
        Err(LedgerError::Validation(_))
    ));
    assert!(validate_date(day(0, 12, 31)).is_err());
}

#[test]
fn test_month_ordering() {
    let a = MonthKey::parse("2024-12").unwrap();
    let b = MonthKey::parse("2025-01").unwrap();
    assert!(a < b);
}

// ── Expense ───────────────────────────────────────────────────

#[test]
fn test_payment_method_parse() {
    assert_eq!(PaymentMethod::parse("cash"), PaymentMethod::Cash);
    assert_eq!(PaymentMethod::parse("Credit Card"), PaymentMethod::CreditCard);
    assert_eq!(PaymentMethod::parse("debit-card"), PaymentMethod::DebitCard);
    assert_eq!(PaymentMethod::parse("UPI"), PaymentMethod::Upi);
    assert_eq!(PaymentMethod::parse("bank transfer"), PaymentMethod::BankTransfer);
    assert_eq!(PaymentMethod::parse("barter"), PaymentMethod::Other);
    for m in PaymentMethod::all() {
        assert_eq!(PaymentMethod::parse(m.as_str()), *m);
    }
}

#[test]
fn test_expense_from_new_trims() {
    let mut new = NewExpense::new(dec!(12.50), Category::Groceries, day(2025, 11, 3))
        .with_description("  Milk  ");
    new.tags = vec![" dairy ".into(), "".into(), "weekly".into()];
    let e = Expense::from_new("alice", new);
    assert_eq!(e.user_id, "alice");
    assert_eq!(e.description, "Milk");
    assert_eq!(e.tags, vec!["dairy".to_string(), "weekly".to_string()]);
    assert_eq!(e.tags_joined(), "dairy,weekly");
    assert!(e.id.is_none());
}

#[test]
fn test_expense_validate() {
    let base = Expense::from_new(
        "alice",
        NewExpense::new(dec!(1), Category::Others, day(2025, 1, 1)),
    );
    assert!(base.validate().is_ok());

    let mut negative = base.clone();
    negative.amount = dec!(-0.01);
    assert!(negative.validate().is_err());

    let mut long = base.clone();
    long.description = "x".repeat(201);
    assert!(long.validate().is_err());
    long.description = "x".repeat(200);
    assert!(long.validate().is_ok());

    let mut notes = base.clone();
    notes.notes = "n".repeat(501);
    assert!(notes.validate().is_err());

    let mut far = base;
    far.date = day(10000, 1, 1);
    assert!(far.validate().is_err());
}

#[test]
fn test_validate_amount() {
    assert!(validate_amount(Decimal::ZERO).is_ok());
    assert!(validate_amount(dec!(0.01)).is_ok());
    assert!(validate_amount(dec!(-1)).is_err());
}

#[test]
fn test_validate_amount_upper_bound() {
    assert_eq!(expense::MAX_AMOUNT, dec!(1000000000000));
    assert!(validate_amount(dec!(1000000000000)).is_ok());
    assert!(validate_amount(dec!(999999999999.99)).is_ok());
    assert!(validate_amount(dec!(1000000000000.01)).is_err());
    assert!(validate_amount(Decimal::MAX).is_err());
}

#[test]
fn test_validate_amount_scale() {
    assert!(validate_amount(dec!(0.001)).is_err());
    assert!(validate_amount(dec!(0.0000000000000000000001)).is_err());
    assert!(validate_amount(dec!(4.50)).is_ok());
    assert!(validate_amount(dec!(4.5000)).is_ok());
}

#[test]
fn test_expense_validate_rejects_out_of_range_amount() {
    let mut e = Expense::from_new(
        "alice",
        NewExpense::new(dec!(1000000000000), Category::Rent, day(2025, 1, 1)),
    );
    assert!(e.validate().is_ok());
    e.amount = dec!(1000000000000.01);
    assert!(matches!(e.validate(), Err(LedgerError::Validation(_))));
    e.amount = dec!(1.005);
    assert!(matches!(e.validate(), Err(LedgerError::Validation(_))));
}

#[test]
fn test_parse_tags() {
    assert_eq!(parse_tags("a, b ,,c"), vec!["a", "b", "c"]);
    assert!(parse_tags("").is_empty());
}

#[test]
fn test_expense_update_apply() {
    let old = Expense::from_new(
        "alice",
        NewExpense::new(dec!(10), Category::Shopping, day(2025, 5, 5)).with_description("Shoes"),
    );
    assert!(ExpenseUpdate::default().is_empty());

    let update = ExpenseUpdate {
        amount: Some(dec!(25)),
        description: Some(" Boots ".into()),
        ..ExpenseUpdate::default()
    };
    assert!(!update.is_empty());
    let new = update.apply(&old);
    assert_eq!(new.amount, dec!(25));
    assert_eq!(new.description, "Boots");
    assert_eq!(new.category, Category::Shopping);
    assert_eq!(new.date, old.date);
    assert_eq!(new.created_at, old.created_at);
}

// ── BudgetPeriod ──────────────────────────────────────────────

fn period() -> BudgetPeriod {
    BudgetPeriod::new("alice", MonthKey::parse("2025-11").unwrap())
}

#[test]
fn test_period_new_is_empty() {
    let p = period();
    assert!(p.id.is_none());
    assert!(p.categories.is_empty());
    assert_eq!(p.total_allocated, Decimal::ZERO);
    assert_eq!(p.total_spent, Decimal::ZERO);
}

#[test]
fn test_set_allocation_keeps_spent() {
    let mut p = period();
    p.apply_spent_delta(Category::FoodDining, dec!(40)).unwrap();
    p.set_allocation(Category::FoodDining, dec!(100)).unwrap();
    assert_eq!(p.allocated(Category::FoodDining), dec!(100));
    assert_eq!(p.spent(Category::FoodDining), dec!(40));
    p.set_allocation(Category::Travel, dec!(50)).unwrap();
    assert_eq!(p.total_allocated, dec!(150));
    assert_eq!(p.total_spent, dec!(40));
}

#[test]
fn test_apply_spent_delta_floors_at_zero() {
    let mut p = period();
    assert!(!p.apply_spent_delta(Category::Rent, dec!(30)).unwrap());
    assert!(p.apply_spent_delta(Category::Rent, dec!(-50)).unwrap());
    assert_eq!(p.spent(Category::Rent), Decimal::ZERO);
    assert_eq!(p.total_spent, Decimal::ZERO);
    assert_eq!(p.allocated(Category::Rent), Decimal::ZERO);
}

#[test]
fn test_replace_spent_zeroes_missing() {
    let mut p = period();
    p.set_allocation(Category::FoodDining, dec!(100)).unwrap();
    p.apply_spent_delta(Category::FoodDining, dec!(70)).unwrap();
    p.apply_spent_delta(Category::Travel, dec!(20)).unwrap();

    let mut sums = BTreeMap::new();
    sums.insert(Category::Travel, dec!(35));
    sums.insert(Category::Education, dec!(5));
    p.replace_spent(&sums).unwrap();

    assert_eq!(p.spent(Category::FoodDining), Decimal::ZERO);
    assert_eq!(p.spent(Category::Travel), dec!(35));
    assert_eq!(p.spent(Category::Education), dec!(5));
    assert_eq!(p.allocated(Category::FoodDining), dec!(100));
    assert_eq!(p.total_spent, dec!(40));
}

#[test]
fn test_progress_rows() {
    let mut p = period();
    p.set_allocation(Category::FoodDining, dec!(500)).unwrap();
    p.apply_spent_delta(Category::FoodDining, dec!(550)).unwrap();
    p.apply_spent_delta(Category::Others, dec!(12)).unwrap();

    let progress = p.progress().unwrap();
    assert_eq!(progress.total_allocated, dec!(500));
    assert_eq!(progress.total_spent, dec!(562));
    assert_eq!(progress.total_remaining, Decimal::ZERO);

    let food = progress.category(Category::FoodDining).unwrap();
    assert_eq!(food.remaining, Decimal::ZERO);
    assert_eq!(food.percentage_used, dec!(110));
    assert_eq!(food.status, BudgetStatus::Exceeded);

    let others = progress.category(Category::Others).unwrap();
    assert_eq!(others.allocated, Decimal::ZERO);
    assert_eq!(others.percentage_used, Decimal::ZERO);
    assert_eq!(others.status, BudgetStatus::Good);
}

#[test]
fn test_status_thresholds() {
    let a = dec!(100);
    assert_eq!(BudgetStatus::from_percentage(a, dec!(79.99)), BudgetStatus::Good);
    assert_eq!(BudgetStatus::from_percentage(a, dec!(80)), BudgetStatus::Warning);
    assert_eq!(BudgetStatus::from_percentage(a, dec!(99.99)), BudgetStatus::Warning);
    assert_eq!(BudgetStatus::from_percentage(a, dec!(100)), BudgetStatus::Exceeded);
    assert_eq!(
        BudgetStatus::from_percentage(Decimal::ZERO, dec!(500)),
        BudgetStatus::Good
    );
    assert_eq!(BudgetStatus::Warning.to_string(), "warning");
}

#[test]
fn test_percentage_of_rounding() {
    assert_eq!(percentage_of(dec!(1), dec!(3)).unwrap(), dec!(33.33));
    assert_eq!(percentage_of(dec!(2), dec!(3)).unwrap(), dec!(66.67));
    assert_eq!(percentage_of(dec!(250), dec!(500)).unwrap(), dec!(50));
    assert_eq!(percentage_of(dec!(10), Decimal::ZERO).unwrap(), Decimal::ZERO);
}

#[test]
fn test_percentage_of_extremes() {
    assert_eq!(
        percentage_of(dec!(1000000000000), dec!(0.01)).unwrap(),
        dec!(10000000000000000)
    );
    assert!(matches!(
        percentage_of(Decimal::MAX, dec!(0.01)),
        Err(LedgerError::Validation(_))
    ));
    assert!(percentage_of(dec!(100000), dec!(0.0000000000000000000001)).is_err());
}

#[test]
fn test_apply_spent_delta_overflow_leaves_period_unchanged() {
    let mut p = period();
    p.apply_spent_delta(Category::Travel, Decimal::MAX).unwrap();
    assert!(p.apply_spent_delta(Category::Travel, Decimal::ONE).is_err());
    assert_eq!(p.spent(Category::Travel), Decimal::MAX);
    assert_eq!(p.total_spent, Decimal::MAX);

    // Each category fits but the total does not
    assert!(p.apply_spent_delta(Category::Rent, Decimal::MAX).is_err());
    assert_eq!(p.spent(Category::Rent), Decimal::ZERO);
    assert_eq!(p.total_spent, Decimal::MAX);
}

#[test]
fn test_set_allocation_total_overflow_is_error() {
    let mut p = period();
    p.set_allocation(Category::Rent, Decimal::MAX).unwrap();
    assert!(p.set_allocation(Category::Travel, Decimal::MAX).is_err());
    assert_eq!(p.allocated(Category::Travel), Decimal::ZERO);
    assert_eq!(p.total_allocated, Decimal::MAX);
}

#[test]
fn test_checked_total() {
    assert_eq!(checked_total([dec!(1.25), dec!(2.75)]), Some(dec!(4)));
    assert_eq!(checked_total(Vec::new()), Some(Decimal::ZERO));
    assert_eq!(checked_total([Decimal::MAX, Decimal::ONE]), None);
}

#[test]
fn test_round2_midpoint_away_from_zero() {
    assert_eq!(round2(dec!(0.125)), dec!(0.13));
    assert_eq!(round2(dec!(-0.125)), dec!(-0.13));
    assert_eq!(round2(dec!(1.10)), dec!(1.1));
}

// ── SavingsGoal ───────────────────────────────────────────────

fn goal(target: Decimal) -> SavingsGoal {
    SavingsGoal::new("alice", "  Laptop ".into(), target, day(2026, 6, 1))
}

#[test]
fn test_goal_new_defaults() {
    let g = goal(dec!(1000));
    assert_eq!(g.title, "Laptop");
    assert_eq!(g.status, GoalStatus::Active);
    assert_eq!(g.kind, GoalKind::Savings);
    assert_eq!(g.priority, GoalPriority::Medium);
    assert_eq!(g.current_amount, Decimal::ZERO);
}

#[test]
fn test_goal_validate() {
    assert!(goal(dec!(1000)).validate().is_ok());
    assert!(goal(dec!(-1)).validate().is_err());

    let mut untitled = goal(dec!(1));
    untitled.title.clear();
    assert!(untitled.validate().is_err());

    let mut long = goal(dec!(1));
    long.title = "t".repeat(101);
    assert!(long.validate().is_err());

    let mut far = goal(dec!(1));
    far.due_date = day(12000, 6, 1);
    assert!(far.validate().is_err());
}

#[test]
fn test_goal_contribute_completes() {
    let mut g = goal(dec!(100));
    g.contribute(dec!(60)).unwrap();
    assert_eq!(g.status, GoalStatus::Active);
    assert_eq!(g.progress_percent(), 60);
    assert_eq!(g.remaining(), dec!(40));

    g.contribute(dec!(50)).unwrap();
    assert_eq!(g.status, GoalStatus::Completed);
    assert_eq!(g.progress_percent(), 100);
    assert_eq!(g.remaining(), Decimal::ZERO);
}

#[test]
fn test_goal_withdraw_floors_at_zero() {
    let mut g = goal(dec!(100));
    g.contribute(dec!(10)).unwrap();
    g.contribute(dec!(-25)).unwrap();
    assert_eq!(g.current_amount, Decimal::ZERO);
}

#[test]
fn test_goal_amount_bounds() {
    assert!(goal(dec!(1000000000000)).validate().is_ok());
    assert!(goal(dec!(1000000000000.01)).validate().is_err());
    assert!(goal(dec!(10.001)).validate().is_err());

    let mut g = goal(dec!(1000000000000));
    g.contribute(dec!(1000000000000)).unwrap();
    assert_eq!(g.status, GoalStatus::Completed);
    assert!(g.contribute(dec!(0.01)).is_err());
    assert!(g.contribute(Decimal::MAX).is_err());
    assert!(g.contribute(dec!(0.001)).is_err());
    assert_eq!(g.current_amount, dec!(1000000000000));
}

#[test]
fn test_goal_progress_extreme_ratio() {
    let mut g = goal(dec!(0.01));
    g.current_amount = dec!(1000000000000);
    assert_eq!(g.progress_percent(), 100);
    g.current_amount = Decimal::MAX;
    assert_eq!(g.progress_percent(), 100);
}

#[test]
fn test_goal_abandoned_never_completes() {
    let mut g = goal(dec!(10));
    g.status = GoalStatus::Abandoned;
    g.current_amount = dec!(10);
    g.refresh_status();
    assert_eq!(g.status, GoalStatus::Abandoned);
}

#[test]
fn test_goal_progress_zero_target() {
    assert_eq!(goal(Decimal::ZERO).progress_percent(), 0);
}

#[test]
fn test_goal_enum_parsing() {
    assert_eq!(GoalStatus::parse("Done").unwrap(), GoalStatus::Completed);
    assert!(GoalStatus::parse("paused").is_err());
    assert_eq!(GoalKind::parse("emergency fund"), GoalKind::EmergencyFund);
    assert_eq!(GoalKind::parse("debt"), GoalKind::DebtPayment);
    assert_eq!(GoalPriority::parse("HIGH"), GoalPriority::High);
    assert_eq!(GoalPriority::parse("whatever"), GoalPriority::Medium);
}
