use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{validate_date, Category};
use crate::error::LedgerError;

pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 500;
/// Largest accepted money amount: one trillion.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);
/// Money amounts carry at most cents.
pub const MAX_AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    Cash,
    CreditCard,
    DebitCard,
    Upi,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Upi => "upi",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "cash" => Self::Cash,
            "credit_card" | "credit" | "card" => Self::CreditCard,
            "debit_card" | "debit" => Self::DebitCard,
            "upi" => Self::Upi,
            "bank_transfer" | "transfer" | "bank" => Self::BankTransfer,
            _ => Self::Other,
        }
    }

    pub fn all() -> &'static [PaymentMethod] {
        &[
            Self::Cash,
            Self::CreditCard,
            Self::DebitCard,
            Self::Upi,
            Self::BankTransfer,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored expense record. Amounts are always non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Option<i64>,
    pub user_id: String,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    pub description: String,
    pub notes: String,
    pub payment_method: PaymentMethod,
    pub tags: Vec<String>,
    pub import_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Expense {
    pub fn from_new(user_id: &str, new: NewExpense) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: None,
            user_id: user_id.to_string(),
            amount: new.amount,
            category: new.category,
            date: new.date,
            description: new.description.trim().to_string(),
            notes: new.notes.trim().to_string(),
            payment_method: new.payment_method,
            tags: clean_tags(&new.tags),
            import_hash: new.import_hash,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        validate_date(self.date)?;
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(LedgerError::Validation(format!(
                "Description cannot be more than {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if self.notes.chars().count() > MAX_NOTES_LEN {
            return Err(LedgerError::Validation(format!(
                "Notes cannot be more than {MAX_NOTES_LEN} characters"
            )));
        }
        Ok(())
    }

    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }
}

/// Input for creating an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    pub description: String,
    pub notes: String,
    pub payment_method: PaymentMethod,
    pub tags: Vec<String>,
    pub import_hash: String,
}

impl NewExpense {
    pub fn new(amount: Decimal, category: Category, date: NaiveDate) -> Self {
        Self {
            amount,
            category,
            date,
            description: String::new(),
            notes: String::new(),
            payment_method: PaymentMethod::default(),
            tags: Vec::new(),
            import_hash: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Partial update of an expense; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub amount: Option<Decimal>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub tags: Option<Vec<String>>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto a copy of `old`, returning the updated record.
    pub fn apply(&self, old: &Expense) -> Expense {
        let mut new = old.clone();
        if let Some(amount) = self.amount {
            new.amount = amount;
        }
        if let Some(category) = self.category {
            new.category = category;
        }
        if let Some(date) = self.date {
            new.date = date;
        }
        if let Some(ref description) = self.description {
            new.description = description.trim().to_string();
        }
        if let Some(ref notes) = self.notes {
            new.notes = notes.trim().to_string();
        }
        if let Some(method) = self.payment_method {
            new.payment_method = method;
        }
        if let Some(ref tags) = self.tags {
            new.tags = clean_tags(tags);
        }
        new.updated_at = chrono::Utc::now().to_rfc3339();
        new
    }
}

/// Non-negative, at most [`MAX_AMOUNT`], at most two decimal places.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::Validation(format!(
            "Amount cannot be negative, got {amount}"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::Validation(format!(
            "Amount cannot be more than {MAX_AMOUNT}, got {amount}"
        )));
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(LedgerError::Validation(format!(
            "Amount cannot have more than {MAX_AMOUNT_SCALE} decimal places, got {amount}"
        )));
    }
    Ok(())
}

pub fn parse_tags(s: &str) -> Vec<String> {
    clean_tags(&s.split(',').map(str::to_string).collect::<Vec<_>>())
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
