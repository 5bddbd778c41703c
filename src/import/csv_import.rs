use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::models::{parse_tags, round2, Category, NewExpense, PaymentMethod};

/// Column layout of an expense CSV.
///
/// Amounts are read with bank polarity: negative means money out. Money-out
/// rows become expenses; money-in rows (refunds, deposits) are skipped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CsvProfile {
    pub(crate) name: String,
    pub(crate) date_column: usize,
    pub(crate) description_column: usize,
    pub(crate) amount_column: Option<usize>,
    pub(crate) debit_column: Option<usize>,
    pub(crate) credit_column: Option<usize>,
    pub(crate) category_column: Option<usize>,
    pub(crate) payment_column: Option<usize>,
    pub(crate) notes_column: Option<usize>,
    pub(crate) tags_column: Option<usize>,
    pub(crate) date_format: String,
    pub(crate) skip_rows: usize,
    /// Flip the amount column's sign, for files that list spending as positive.
    pub(crate) negate_amounts: bool,
    /// Used when the file has no payment column.
    pub(crate) payment_method: PaymentMethod,
}

impl Default for CsvProfile {
    fn default() -> Self {
        Self {
            name: "Custom".into(),
            date_column: 0,
            description_column: 1,
            amount_column: Some(2),
            debit_column: None,
            credit_column: None,
            category_column: None,
            payment_column: None,
            notes_column: None,
            tags_column: None,
            date_format: "%Y-%m-%d".into(),
            skip_rows: 0,
            negate_amounts: true,
            payment_method: PaymentMethod::default(),
        }
    }
}

/// Result of parsing a file: the expenses plus how many rows were not spending.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedCsv {
    pub(crate) expenses: Vec<NewExpense>,
    pub(crate) skipped: usize,
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Read the CSV and return headers + all rows as strings.
    pub(crate) fn preview(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let mut all_rows: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result.context("Failed to read CSV record")?;
            all_rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        if all_rows.is_empty() {
            anyhow::bail!("CSV file is empty");
        }

        // Headers don't parse as dates or numbers
        let looks_like_header = all_rows[0].iter().all(|field| {
            let trimmed = field.trim();
            let numeric = !trimmed.is_empty() && parse_decimal(trimmed).is_ok();
            !numeric && parse_date(trimmed, "%Y-%m-%d").is_err()
        });

        if looks_like_header {
            let headers = all_rows.remove(0);
            Ok((headers, all_rows))
        } else {
            Ok((Vec::new(), all_rows))
        }
    }

    /// Preview, detect the layout and parse in one step.
    pub(crate) fn load(path: &Path) -> Result<(CsvProfile, ParsedCsv)> {
        let (headers, rows) = Self::preview(path)?;
        let first = rows.first().cloned().unwrap_or_default();
        let profile = super::detect_format(&headers, &first).with_context(|| {
            format!(
                "Unrecognised CSV layout in {} (need at least date and amount columns)",
                path.display()
            )
        })?;
        debug!(profile = %profile.name, rows = rows.len(), "CSV layout detected");
        let parsed = Self::parse(&rows, &profile)?;
        Ok((profile, parsed))
    }

    /// Parse data rows (header already removed) into new expenses.
    pub(crate) fn parse(rows: &[Vec<String>], profile: &CsvProfile) -> Result<ParsedCsv> {
        let mut out = ParsedCsv::default();

        for (i, row) in rows.iter().enumerate().skip(profile.skip_rows) {
            let date_str = cell(row, Some(profile.date_column));
            if date_str.is_empty() {
                continue;
            }

            let date = parse_date(date_str, &profile.date_format)
                .with_context(|| format!("Row {}: failed to parse date '{date_str}'", i + 1))?;
            let description = cell(row, Some(profile.description_column)).to_string();
            let signed = signed_amount(row, profile)
                .with_context(|| format!("Row {}: failed to parse amount", i + 1))?;

            if signed >= Decimal::ZERO {
                debug!(row = i + 1, amount = %signed, "Not an expense, skipped");
                out.skipped += 1;
                continue;
            }
            // Stored amounts carry at most cents
            let amount = round2(signed.abs());

            let category = match cell(row, profile.category_column) {
                "" => Category::Others,
                name => Category::parse(name).unwrap_or_else(|_| {
                    warn!(row = i + 1, category = name, "Unknown category, using Others");
                    Category::Others
                }),
            };
            let payment_method = match cell(row, profile.payment_column) {
                "" => profile.payment_method,
                m => PaymentMethod::parse(m),
            };

            let mut expense = NewExpense::new(amount, category, date).with_description(description);
            expense.payment_method = payment_method;
            expense.notes = cell(row, profile.notes_column).to_string();
            expense.tags = parse_tags(cell(row, profile.tags_column));
            expense.import_hash = compute_hash(i, date_str, &expense.description, &amount);
            out.expenses.push(expense);
        }

        Ok(out)
    }
}

fn cell(row: &[String], column: Option<usize>) -> &str {
    column
        .and_then(|c| row.get(c))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn parse_date(s: &str, fmt: &str) -> Result<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
        return Ok(d);
    }
    for fallback in &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fallback) {
            return Ok(d);
        }
    }
    anyhow::bail!("Could not parse date: {s}")
}

/// Money-out is negative.
fn signed_amount(row: &[String], profile: &CsvProfile) -> Result<Decimal> {
    if profile.amount_column.is_some() {
        let amount = parse_decimal(cell(row, profile.amount_column))?;
        return Ok(if profile.negate_amounts { -amount } else { amount });
    }

    let debit = cell(row, profile.debit_column);
    let credit = cell(row, profile.credit_column);
    if !debit.is_empty() {
        Ok(-parse_decimal(debit)?.abs())
    } else if !credit.is_empty() {
        Ok(parse_decimal(credit)?.abs())
    } else {
        Ok(Decimal::ZERO)
    }
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = s
        .replace(['$', ',', '₹', '"'], "")
        .replace('(', "-")
        .replace(')', "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned).with_context(|| format!("Failed to parse '{s}' as decimal"))
}

/// Stable dedup key. The row index keeps identical same-day purchases apart
/// while re-importing the same file still collides. FNV-1a does not change
/// between Rust releases the way `DefaultHasher` may.
fn compute_hash(row: usize, date: &str, description: &str, amount: &Decimal) -> String {
    let input = format!("{row}|{date}|{description}|{}", amount.normalize());
    format!("{:016x}", fnv1a(input.as_bytes()))
}

fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in data {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
