use rust_decimal::Decimal;

use crate::error::AppError;

const MAX_PAYOFF_MONTHS: u32 = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct Debt {
    pub id: Option<i64>,
    pub workspace_id: i64,
    pub name: String,
    pub lender: String,
    pub principal: Decimal,
    pub balance: Decimal,
    /// Annual rate in percent, e.g. `19.99`.
    pub interest_rate: Decimal,
    pub minimum_payment: Decimal,
    pub due_day: Option<u32>,
    pub notes: String,
    pub created_at: String,
}

impl Debt {
    pub fn new(workspace_id: i64, name: String, lender: String, principal: Decimal) -> Self {
        Self {
            id: None,
            workspace_id,
            name,
            lender,
            principal,
            balance: principal,
            interest_rate: Decimal::ZERO,
            minimum_payment: Decimal::ZERO,
            due_day: None,
            notes: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&mut self) -> Result<(), AppError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if self.principal <= Decimal::ZERO {
            return Err(AppError::validation("principal must be greater than zero"));
        }
        if self.interest_rate < Decimal::ZERO {
            return Err(AppError::validation("interest rate cannot be negative"));
        }
        if self.minimum_payment < Decimal::ZERO {
            return Err(AppError::validation("minimum payment cannot be negative"));
        }
        if let Some(day) = self.due_day {
            if !(1..=31).contains(&day) {
                return Err(AppError::validation(format!(
                    "due day must be between 1 and 31, got {day}"
                )));
            }
        }
        Ok(())
    }

    pub fn is_paid_off(&self) -> bool {
        self.balance <= Decimal::ZERO
    }

    /// Apply a payment and return the amount actually applied. The balance
    /// never goes below zero.
    pub fn apply_payment(&mut self, amount: Decimal) -> Result<Decimal, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("payment must be greater than zero"));
        }
        if self.is_paid_off() {
            return Err(AppError::validation(format!("{} is already paid off", self.name)));
        }
        let applied = amount.min(self.balance);
        self.balance -= applied;
        Ok(applied)
    }

    /// Months of minimum payments until the balance reaches zero, with
    /// interest compounded monthly. `None` if it never gets there, or if the
    /// figures are too large to simulate.
    pub fn months_to_payoff(&self) -> Option<u32> {
        if self.is_paid_off() {
            return Some(0);
        }
        let monthly_rate = self.interest_rate.checked_div(Decimal::from(1200))?;
        let mut balance = self.balance;
        if self.minimum_payment <= balance.checked_mul(monthly_rate)? {
            return None;
        }
        for month in 1..=MAX_PAYOFF_MONTHS {
            let interest = balance.checked_mul(monthly_rate)?.round_dp(2);
            balance = balance.checked_add(interest)?.checked_sub(self.minimum_payment)?;
            if balance <= Decimal::ZERO {
                return Some(month);
            }
        }
        None
    }
}
