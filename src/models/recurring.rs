use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::{Transaction, TxnKind};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Annual,
    OneTime,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
            Self::OneTime => "one_time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "weekly" => Some(Self::Weekly),
            "biweekly" => Some(Self::Biweekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "annual" | "yearly" => Some(Self::Annual),
            "one_time" | "once" => Some(Self::OneTime),
            _ => None,
        }
    }

    pub fn all() -> &'static [Frequency] {
        &[
            Self::Weekly,
            Self::Biweekly,
            Self::Monthly,
            Self::Quarterly,
            Self::Annual,
            Self::OneTime,
        ]
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A schedule that periodically produces ledger transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringTransaction {
    pub id: Option<i64>,
    pub workspace_id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub kind: TxnKind,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub last_processed_at: Option<DateTime<Utc>>,
    /// Set when rollover ends the schedule. A finished template never runs
    /// again, unlike a paused one.
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub notes: String,
    pub created_at: String,
}

impl RecurringTransaction {
    pub fn new(
        workspace_id: i64,
        name: String,
        kind: TxnKind,
        amount: Decimal,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            workspace_id,
            name,
            category_id: None,
            kind,
            amount,
            currency: "USD".to_string(),
            frequency,
            start_date,
            end_date: None,
            next_due_date: start_date,
            last_processed_at: None,
            completed_at: None,
            is_active: true,
            notes: String::new(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&mut self) -> Result<(), AppError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(AppError::validation("amount must be greater than zero"));
        }
        self.currency = super::normalize_currency(&self.currency)?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(AppError::validation(format!(
                    "end date {end} is before start date {}",
                    self.start_date
                )));
            }
        }
        if self.next_due_date < self.start_date {
            return Err(AppError::validation("next due date cannot precede start date"));
        }
        Ok(())
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_active && !self.is_finished() && self.next_due_date <= today
    }

    /// Income positive, expense negative.
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    pub fn is_finished(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Display status relative to `today`.
    pub fn status(&self, today: NaiveDate) -> &'static str {
        if self.is_finished() {
            "finished"
        } else if self.is_due(today) {
            "due"
        } else if self.is_active {
            "active"
        } else {
            "paused"
        }
    }

    /// Ledger entry for the current occurrence. Amount, currency, kind and
    /// category are copied as they are right now.
    pub fn materialize(&self) -> Transaction {
        Transaction {
            id: None,
            workspace_id: self.workspace_id,
            kind: self.kind,
            amount: self.amount,
            currency: self.currency.clone(),
            category_id: self.category_id,
            date: self.next_due_date,
            description: format!("Recurring: {}", self.name),
            notes: String::new(),
            recurring_id: self.id,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
