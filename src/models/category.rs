use crate::error::LedgerError;

/// Fixed set of expense categories.
///
/// Ordering follows declaration order, so maps keyed by `Category` iterate in
/// the same order the categories are listed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    FoodDining,
    Transportation,
    Shopping,
    Entertainment,
    BillsUtilities,
    Healthcare,
    Education,
    Travel,
    PersonalCare,
    Groceries,
    Rent,
    Insurance,
    Investments,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodDining => "Food & Dining",
            Self::Transportation => "Transportation",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::BillsUtilities => "Bills & Utilities",
            Self::Healthcare => "Healthcare",
            Self::Education => "Education",
            Self::Travel => "Travel",
            Self::PersonalCare => "Personal Care",
            Self::Groceries => "Groceries",
            Self::Rent => "Rent",
            Self::Insurance => "Insurance",
            Self::Investments => "Investments",
            Self::Others => "Others",
        }
    }

    /// Kebab-case identifier, e.g. `"food-dining"`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::FoodDining => "food-dining",
            Self::Transportation => "transportation",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::BillsUtilities => "bills-utilities",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::Travel => "travel",
            Self::PersonalCare => "personal-care",
            Self::Groceries => "groceries",
            Self::Rent => "rent",
            Self::Insurance => "insurance",
            Self::Investments => "investments",
            Self::Others => "others",
        }
    }

    /// Parse a display name, slug or short alias (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        let lower = s.trim().to_lowercase();
        if let Some(cat) = Self::all()
            .iter()
            .find(|c| c.as_str().to_lowercase() == lower || c.slug() == lower)
        {
            return Ok(*cat);
        }
        let alias = match lower.as_str() {
            "food" | "dining" | "restaurants" => Self::FoodDining,
            "transport" | "transit" | "fuel" => Self::Transportation,
            "bills" | "utilities" => Self::BillsUtilities,
            "health" | "medical" => Self::Healthcare,
            "rent/mortgage" | "housing" => Self::Rent,
            "investment" => Self::Investments,
            "other" | "misc" | "uncategorized" => Self::Others,
            _ => {
                return Err(LedgerError::Validation(format!(
                    "Unknown category '{}'",
                    s.trim()
                )))
            }
        };
        Ok(alias)
    }

    /// Like [`Category::parse`], but unknown names fall back to `Others`.
    pub fn parse_or_other(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Others)
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::FoodDining,
            Self::Transportation,
            Self::Shopping,
            Self::Entertainment,
            Self::BillsUtilities,
            Self::Healthcare,
            Self::Education,
            Self::Travel,
            Self::PersonalCare,
            Self::Groceries,
            Self::Rent,
            Self::Insurance,
            Self::Investments,
            Self::Others,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
