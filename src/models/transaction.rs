use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnKind {
    Income,
    Expense,
}

impl TxnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            _ => None,
        }
    }

    /// `amount` with the sign of this direction.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger entry. Amounts are always positive; `kind` carries the direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub workspace_id: i64,
    pub kind: TxnKind,
    pub amount: Decimal,
    pub currency: String,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    pub notes: String,
    /// Template that produced this entry, if any.
    pub recurring_id: Option<i64>,
    pub created_at: String,
}

impl Transaction {
    pub fn new(
        workspace_id: i64,
        kind: TxnKind,
        amount: Decimal,
        date: NaiveDate,
        description: String,
    ) -> Self {
        Self {
            id: None,
            workspace_id,
            kind,
            amount,
            currency: "USD".to_string(),
            category_id: None,
            date,
            description,
            notes: String::new(),
            recurring_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TxnKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TxnKind::Expense
    }

    /// Income positive, expense negative.
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    pub fn validate(&mut self) -> Result<(), AppError> {
        if self.amount <= Decimal::ZERO {
            return Err(AppError::validation("amount must be greater than zero"));
        }
        self.description = self.description.trim().to_string();
        if self.description.is_empty() {
            return Err(AppError::validation("description is required"));
        }
        self.currency = super::normalize_currency(&self.currency)?;
        Ok(())
    }
}
