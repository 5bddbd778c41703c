#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;
use std::io::Write;

fn make_csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── parse_decimal ─────────────────────────────────────────────

#[test]
fn test_parse_decimal_basic() {
    assert_eq!(parse_decimal("100.50").unwrap(), dec!(100.50));
    assert_eq!(parse_decimal("-42.99").unwrap(), dec!(-42.99));
}

#[test]
fn test_parse_decimal_with_currency() {
    assert_eq!(parse_decimal("$1,234.56").unwrap(), dec!(1234.56));
    assert_eq!(parse_decimal("₹2,500").unwrap(), dec!(2500));
}

#[test]
fn test_parse_decimal_parentheses_negative() {
    assert_eq!(parse_decimal("(500.00)").unwrap(), dec!(-500.00));
}

#[test]
fn test_parse_decimal_empty_and_invalid() {
    assert_eq!(parse_decimal("  ").unwrap(), Decimal::ZERO);
    assert!(parse_decimal("not_a_number").is_err());
}

// ── parse_date ────────────────────────────────────────────────

#[test]
fn test_parse_date_formats() {
    assert_eq!(parse_date("2024-01-15", "%Y-%m-%d").unwrap(), day(2024, 1, 15));
    assert_eq!(parse_date("01/15/2024", "%m/%d/%Y").unwrap(), day(2024, 1, 15));
    assert_eq!(parse_date("01/15/24", "%m/%d/%y").unwrap(), day(2024, 1, 15));
}

#[test]
fn test_parse_date_fallback() {
    let d = parse_date("2024-01-15", "%m/%d/%Y").unwrap();
    assert_eq!(d, day(2024, 1, 15));
}

#[test]
fn test_parse_date_invalid() {
    assert!(parse_date("not-a-date", "%m/%d/%Y").is_err());
    assert!(parse_date("", "%m/%d/%Y").is_err());
}

// ── signed_amount ─────────────────────────────────────────────

#[test]
fn test_signed_amount_spending_positive() {
    let profile = CsvProfile::default();
    let r = row(&["2024-01-15", "Coffee", "4.50"]);
    assert_eq!(signed_amount(&r, &profile).unwrap(), dec!(-4.50));
}

#[test]
fn test_signed_amount_bank_polarity() {
    let profile = CsvProfile {
        negate_amounts: false,
        ..CsvProfile::default()
    };
    let r = row(&["2024-01-15", "Coffee", "-4.50"]);
    assert_eq!(signed_amount(&r, &profile).unwrap(), dec!(-4.50));
}

#[test]
fn test_signed_amount_debit_credit_columns() {
    let profile = CsvProfile {
        amount_column: None,
        debit_column: Some(2),
        credit_column: Some(3),
        ..CsvProfile::default()
    };
    let debit = row(&["2024-01-15", "Coffee", "4.50", ""]);
    assert_eq!(signed_amount(&debit, &profile).unwrap(), dec!(-4.50));
    let credit = row(&["2024-01-15", "Refund", "", "10.00"]);
    assert_eq!(signed_amount(&credit, &profile).unwrap(), dec!(10.00));
    let neither = row(&["2024-01-15", "Pending", "", ""]);
    assert_eq!(signed_amount(&neither, &profile).unwrap(), Decimal::ZERO);
}

// ── CsvImporter::preview ──────────────────────────────────────

#[test]
fn test_preview_with_headers() {
    let file = make_csv_file("Date,Description,Amount\n2024-01-15,Coffee,4.50\n2024-01-16,Lunch,12\n");
    let (headers, rows) = CsvImporter::preview(file.path()).unwrap();
    assert_eq!(headers, vec!["Date", "Description", "Amount"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], "Coffee");
}

#[test]
fn test_preview_without_headers() {
    let file = make_csv_file("01/15/2024,-4.50,*,123,COFFEE SHOP\n01/16/2024,-12.00,*,456,DINER\n");
    let (headers, rows) = CsvImporter::preview(file.path()).unwrap();
    assert!(headers.is_empty());
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_preview_empty_file() {
    let file = make_csv_file("");
    assert!(CsvImporter::preview(file.path()).is_err());
}

#[test]
fn test_preview_quoted_fields() {
    let file = make_csv_file("Date,Description,Amount\n2024-01-15,\"Coffee, Shop\",4.50\n");
    let (_, rows) = CsvImporter::preview(file.path()).unwrap();
    assert_eq!(rows[0][1], "Coffee, Shop");
}

// ── CsvImporter::parse ────────────────────────────────────────

#[test]
fn test_parse_basic_rows() {
    let profile = CsvProfile::default();
    let rows = vec![
        row(&["2024-01-15", "Coffee", "4.50"]),
        row(&["2024-01-16", "Lunch", "12.00"]),
    ];
    let parsed = CsvImporter::parse(&rows, &profile).unwrap();
    assert_eq!(parsed.expenses.len(), 2);
    let first = &parsed.expenses[0];
    assert_eq!(first.date, day(2024, 1, 15));
    assert_eq!(first.description, "Coffee");
    assert_eq!(first.amount, dec!(4.50));
    assert_eq!(first.category, Category::Others);
    assert!(!first.import_hash.is_empty());
}

#[test]
fn test_parse_skips_income_and_empty_dates() {
    let profile = CsvProfile {
        negate_amounts: false,
        ..CsvProfile::default()
    };
    let rows = vec![
        row(&["2024-01-15", "Coffee", "-4.50"]),
        row(&["", "", ""]),
        row(&["2024-01-16", "Salary", "2500.00"]),
        row(&["2024-01-17", "Lunch", "-12.00"]),
    ];
    let parsed = CsvImporter::parse(&rows, &profile).unwrap();
    assert_eq!(parsed.expenses.len(), 2);
    assert_eq!(parsed.skipped, 1);
    assert_eq!(parsed.expenses[1].amount, dec!(12.00));
}

#[test]
fn test_parse_rounds_amounts_to_cents() {
    let rows = vec![
        row(&["2024-01-15", "Fuel", "48.125"]),
        row(&["2024-01-16", "Toll", "0.004"]),
    ];
    let parsed = CsvImporter::parse(&rows, &CsvProfile::default()).unwrap();
    assert_eq!(parsed.expenses[0].amount, dec!(48.13));
    assert_eq!(parsed.expenses[1].amount, dec!(0));
    for e in &parsed.expenses {
        assert!(crate::models::validate_amount(e.amount).is_ok());
    }
}

#[test]
fn test_parse_optional_columns() {
    let profile = CsvProfile {
        category_column: Some(3),
        payment_column: Some(4),
        notes_column: Some(5),
        tags_column: Some(6),
        ..CsvProfile::default()
    };
    let rows = vec![
        row(&["2024-01-15", "Bus", "2.75", "transport", "UPI", "to work", "commute, daily"]),
        row(&["2024-01-15", "Gizmo", "20", "Gadgets", "", "", ""]),
    ];
    let parsed = CsvImporter::parse(&rows, &profile).unwrap();
    let bus = &parsed.expenses[0];
    assert_eq!(bus.category, Category::Transportation);
    assert_eq!(bus.payment_method, PaymentMethod::Upi);
    assert_eq!(bus.notes, "to work");
    assert_eq!(bus.tags, vec!["commute".to_string(), "daily".to_string()]);

    let gizmo = &parsed.expenses[1];
    assert_eq!(gizmo.category, Category::Others);
    assert_eq!(gizmo.payment_method, PaymentMethod::Cash);
}

#[test]
fn test_parse_skip_rows() {
    let profile = CsvProfile {
        skip_rows: 1,
        ..CsvProfile::default()
    };
    let rows = vec![
        row(&["Statement for January", "", ""]),
        row(&["2024-01-15", "Coffee", "4.50"]),
    ];
    let parsed = CsvImporter::parse(&rows, &profile).unwrap();
    assert_eq!(parsed.expenses.len(), 1);
}

#[test]
fn test_parse_bad_date_names_row() {
    let profile = CsvProfile::default();
    let rows = vec![row(&["2024-01-15", "ok", "1"]), row(&["yesterday", "bad", "1"])];
    let err = CsvImporter::parse(&rows, &profile).unwrap_err();
    assert!(err.to_string().contains("Row 2"));
}

#[test]
fn test_parse_identical_rows_get_distinct_hashes() {
    let profile = CsvProfile::default();
    let rows = vec![
        row(&["2024-01-15", "Coffee", "4.50"]),
        row(&["2024-01-15", "Coffee", "4.50"]),
    ];
    let parsed = CsvImporter::parse(&rows, &profile).unwrap();
    assert_ne!(parsed.expenses[0].import_hash, parsed.expenses[1].import_hash);

    let again = CsvImporter::parse(&rows, &profile).unwrap();
    assert_eq!(parsed.expenses[0].import_hash, again.expenses[0].import_hash);
}

// ── CsvImporter::load ─────────────────────────────────────────

#[test]
fn test_load_export_layout() {
    let file = make_csv_file(
        "Date,Description,Category,Amount,Payment Method,Notes,Tags\n\
         2024-03-02,\"Lunch, with team\",Food & Dining,12.50,credit_card,,work\n",
    );
    let (profile, parsed) = CsvImporter::load(file.path()).unwrap();
    assert_eq!(profile.name, "cashcraft export");
    let e = &parsed.expenses[0];
    assert_eq!(e.description, "Lunch, with team");
    assert_eq!(e.category, Category::FoodDining);
    assert_eq!(e.amount, dec!(12.50));
    assert_eq!(e.payment_method, PaymentMethod::CreditCard);
    assert_eq!(e.tags, vec!["work".to_string()]);
}

#[test]
fn test_load_bank_statement() {
    let file = make_csv_file(
        "Date,Description,Amount,Running Bal.\n\
         01/15/2024,Coffee Shop,-4.50,995.50\n\
         01/16/2024,Payroll,1500.00,2495.50\n",
    );
    let (profile, parsed) = CsvImporter::load(file.path()).unwrap();
    assert_eq!(profile.name, "Bank of America Checking");
    assert_eq!(parsed.expenses.len(), 1);
    assert_eq!(parsed.skipped, 1);
    assert_eq!(parsed.expenses[0].payment_method, PaymentMethod::DebitCard);
}

#[test]
fn test_load_unrecognised_layout() {
    let file = make_csv_file("foo,bar\nx,y\n");
    assert!(CsvImporter::load(file.path()).is_err());
}

// ── compute_hash / fnv1a ──────────────────────────────────────

#[test]
fn test_hash_format_and_sensitivity() {
    let h = compute_hash(0, "2024-01-15", "Coffee", &dec!(4.50));
    assert_eq!(h.len(), 16);
    assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(h, compute_hash(0, "2024-01-15", "Coffee", &dec!(4.5)));
    assert_ne!(h, compute_hash(0, "2024-01-15", "Tea", &dec!(4.50)));
    assert_ne!(h, compute_hash(0, "2024-01-16", "Coffee", &dec!(4.50)));
    assert_ne!(h, compute_hash(1, "2024-01-15", "Coffee", &dec!(4.50)));
}

#[test]
fn test_fnv1a_offset_basis() {
    assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
    assert_ne!(fnv1a(b"a"), fnv1a(b"b"));
}
