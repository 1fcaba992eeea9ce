use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: Option<i64>,
    pub workspace_id: i64,
    pub category_id: i64,
    /// Format: "YYYY-MM"
    pub month: String,
    pub limit_amount: Decimal,
}

impl Budget {
    pub fn new(workspace_id: i64, category_id: i64, month: String, limit_amount: Decimal) -> Self {
        Self {
            id: None,
            workspace_id,
            category_id,
            month,
            limit_amount,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        parse_month(&self.month)?;
        if self.limit_amount < Decimal::ZERO {
            return Err(AppError::validation("budget limit cannot be negative"));
        }
        Ok(())
    }
}

/// Parse a "YYYY-MM" month into its first day.
pub fn parse_month(month: &str) -> Result<NaiveDate, AppError> {
    if month.len() != 7 {
        return Err(AppError::validation(format!(
            "month must look like YYYY-MM, got '{month}'"
        )));
    }
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("'{month}' is not a valid month")))
}
