use super::CsvProfile;
use crate::models::PaymentMethod;

/// Header row written by `export`.
pub(crate) const EXPORT_HEADER: [&str; 7] = [
    "Date",
    "Description",
    "Category",
    "Amount",
    "Payment Method",
    "Notes",
    "Tags",
];

/// Pick a column layout from the header row (empty when the file has none)
/// and the first data row. Our own export wins, then known bank layouts, then
/// any file with recognisable date and amount headers.
pub(crate) fn detect_format(headers: &[String], first_row: &[String]) -> Option<CsvProfile> {
    let h: Vec<String> = headers
        .iter()
        .map(|s| s.to_lowercase().trim().to_string())
        .collect();

    if is_export_header(&h) {
        return Some(CsvProfile {
            name: "cashcraft export".into(),
            date_column: 0,
            description_column: 1,
            amount_column: Some(3),
            category_column: Some(2),
            payment_column: Some(4),
            notes_column: Some(5),
            tags_column: Some(6),
            ..CsvProfile::default()
        });
    }

    detect_bank_format(&h, first_row).or_else(|| detect_generic(&h))
}

fn is_export_header(h: &[String]) -> bool {
    h.len() == EXPORT_HEADER.len()
        && h.iter()
            .zip(EXPORT_HEADER)
            .all(|(a, b)| a.as_str() == b.to_lowercase())
}

/// Bank statement fingerprints. Statements use signed amounts (negative is a
/// charge) or separate debit/credit columns.
fn detect_bank_format(h: &[String], first_row: &[String]) -> Option<CsvProfile> {
    // Wells Fargo: no headers, 5 columns, col[2] == "*"
    if h.is_empty() && first_row.len() == 5 && first_row.get(2).map(|s| s.trim()) == Some("*") {
        return Some(bank("Wells Fargo", 0, 4, Some(1), PaymentMethod::DebitCard));
    }

    // American Express lists charges as positive amounts
    if has(h, "card member") {
        return Some(CsvProfile {
            negate_amounts: true,
            ..bank(
                "American Express",
                col_index(h, "date").unwrap_or(0),
                col_index(h, "description").unwrap_or(1),
                col_index(h, "amount"),
                PaymentMethod::CreditCard,
            )
        });
    }

    if has(h, "reference number") && has(h, "address") {
        return Some(bank(
            "Bank of America Credit Card",
            col_index(h, "posted date").unwrap_or(0),
            col_index(h, "payee").unwrap_or(2),
            col_index(h, "amount"),
            PaymentMethod::CreditCard,
        ));
    }

    if h.iter().any(|s| s.contains("running bal")) {
        return Some(bank(
            "Bank of America Checking",
            col_index(h, "date").unwrap_or(0),
            col_index(h, "description").unwrap_or(1),
            col_index(h, "amount"),
            PaymentMethod::DebitCard,
        ));
    }

    if h.first().map(|s| s.as_str()) == Some("status") && has(h, "debit") && has(h, "credit") {
        return Some(split_columns(
            "Citi",
            h,
            col_index(h, "date").unwrap_or(1),
            col_index(h, "description").unwrap_or(2),
            "%m/%d/%Y",
        ));
    }

    if has(h, "card no.") {
        return Some(split_columns(
            "Capital One Credit Card",
            h,
            col_index(h, "transaction date").unwrap_or(0),
            col_index(h, "description").unwrap_or(3),
            "%Y-%m-%d",
        ));
    }

    if has(h, "details") && h.iter().any(|s| s.contains("check or slip")) {
        return Some(bank(
            "Chase Checking",
            col_index(h, "posting date").unwrap_or(1),
            col_index(h, "description").unwrap_or(2),
            col_index(h, "amount"),
            PaymentMethod::DebitCard,
        ));
    }

    if has(h, "transaction date") && has(h, "post date") && has(h, "type") {
        return Some(bank(
            "Chase Credit Card",
            col_index(h, "transaction date").unwrap_or(0),
            col_index(h, "description").unwrap_or(2),
            col_index(h, "amount"),
            PaymentMethod::CreditCard,
        ));
    }

    None
}

/// Any file naming a date and an amount column. Amounts are spending, so
/// positive values are charges.
fn detect_generic(h: &[String]) -> Option<CsvProfile> {
    let date = find_any(h, &["date", "transaction date", "expense date"])?;
    let amount = find_any(h, &["amount", "expense", "cost", "spent"]);
    let debit = find_any(h, &["debit", "withdrawal"]);
    if amount.is_none() && debit.is_none() {
        return None;
    }
    let description = find_any(h, &["description", "title", "payee", "merchant", "name"])
        .unwrap_or_else(|| if date == 0 { 1 } else { 0 });

    Some(CsvProfile {
        name: "Generic".into(),
        date_column: date,
        description_column: description,
        amount_column: amount,
        debit_column: if amount.is_none() { debit } else { None },
        credit_column: if amount.is_none() {
            find_any(h, &["credit", "deposit"])
        } else {
            None
        },
        category_column: find_any(h, &["category", "type"]),
        payment_column: find_any(h, &["payment method", "payment", "method"]),
        notes_column: find_any(h, &["notes", "note", "memo"]),
        tags_column: find_any(h, &["tags"]),
        ..CsvProfile::default()
    })
}

fn bank(
    name: &str,
    date_column: usize,
    description_column: usize,
    amount_column: Option<usize>,
    payment_method: PaymentMethod,
) -> CsvProfile {
    CsvProfile {
        name: name.into(),
        date_column,
        description_column,
        amount_column,
        date_format: "%m/%d/%Y".into(),
        negate_amounts: false,
        payment_method,
        ..CsvProfile::default()
    }
}

fn split_columns(
    name: &str,
    h: &[String],
    date_column: usize,
    description_column: usize,
    date_format: &str,
) -> CsvProfile {
    CsvProfile {
        amount_column: None,
        debit_column: col_index(h, "debit"),
        credit_column: col_index(h, "credit"),
        date_format: date_format.into(),
        ..bank(name, date_column, description_column, None, PaymentMethod::CreditCard)
    }
}

fn has(headers: &[String], name: &str) -> bool {
    headers.iter().any(|h| h == name)
}

fn col_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn find_any(headers: &[String], names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| col_index(headers, n))
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
