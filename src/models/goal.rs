use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::{validate_amount, validate_date};
use crate::error::LedgerError;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_GOAL_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(LedgerError::Validation(format!(
                "Unknown goal status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalKind {
    #[default]
    Savings,
    Investment,
    Purchase,
    DebtPayment,
    EmergencyFund,
    Other,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Investment => "investment",
            Self::Purchase => "purchase",
            Self::DebtPayment => "debt_payment",
            Self::EmergencyFund => "emergency_fund",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "savings" => Self::Savings,
            "investment" => Self::Investment,
            "purchase" => Self::Purchase,
            "debt_payment" | "debt" => Self::DebtPayment,
            "emergency_fund" | "emergency" => Self::EmergencyFund,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl GoalPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavingsGoal {
    pub id: Option<i64>,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub due_date: NaiveDate,
    pub status: GoalStatus,
    pub kind: GoalKind,
    pub priority: GoalPriority,
    pub created_at: String,
}

impl SavingsGoal {
    pub fn new(user_id: &str, title: String, target_amount: Decimal, due_date: NaiveDate) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            title: title.trim().to_string(),
            description: String::new(),
            target_amount,
            current_amount: Decimal::ZERO,
            due_date,
            status: GoalStatus::Active,
            kind: GoalKind::default(),
            priority: GoalPriority::default(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.title.is_empty() {
            return Err(LedgerError::Validation("Please provide a goal title".into()));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(LedgerError::Validation(format!(
                "Title cannot be more than {MAX_TITLE_LEN} characters"
            )));
        }
        if self.description.chars().count() > MAX_GOAL_DESCRIPTION_LEN {
            return Err(LedgerError::Validation(format!(
                "Description cannot be more than {MAX_GOAL_DESCRIPTION_LEN} characters"
            )));
        }
        validate_amount(self.target_amount)
            .map_err(|e| LedgerError::Validation(format!("Target: {}", validation_message(e))))?;
        validate_amount(self.current_amount)
            .map_err(|e| LedgerError::Validation(format!("Saved: {}", validation_message(e))))?;
        validate_date(self.due_date)?;
        Ok(())
    }

    /// Add (or, when negative, withdraw) an amount; never drops below zero.
    /// The goal is unchanged when the amount or the new balance is out of range.
    pub fn contribute(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        validate_amount(amount.abs())?;
        let balance = self
            .current_amount
            .checked_add(amount)
            .unwrap_or(Decimal::MAX)
            .max(Decimal::ZERO);
        validate_amount(balance)
            .map_err(|e| LedgerError::Validation(format!("Saved: {}", validation_message(e))))?;
        self.current_amount = balance;
        self.refresh_status();
        Ok(())
    }

    /// Active goals that reached their target become completed.
    pub fn refresh_status(&mut self) {
        if self.status == GoalStatus::Active && self.current_amount >= self.target_amount {
            self.status = GoalStatus::Completed;
        }
    }

    /// Whole-number progress percentage, capped at 100.
    pub fn progress_percent(&self) -> u32 {
        if self.target_amount.is_zero() {
            return 0;
        }
        let Some(pct) = self
            .current_amount
            .checked_div(self.target_amount)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        else {
            return 100;
        };
        pct.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(100)
            .min(100)
    }

    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }
}

fn validation_message(e: LedgerError) -> String {
    match e {
        LedgerError::Validation(msg) => msg,
        other => other.to_string(),
    }
}
