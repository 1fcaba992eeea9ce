mod budget;
mod category;
mod debt;
mod recurring;
mod transaction;
mod user;
mod workspace;

pub use budget::{parse_month, Budget};
pub use category::Category;
pub use debt::Debt;
pub use recurring::{Frequency, RecurringTransaction};
pub use transaction::{Transaction, TxnKind};
pub use user::{Preferences, User};
pub use workspace::{Member, Role, Workspace};

use crate::error::AppError;

/// Upper-case a three-letter currency code, rejecting anything else.
pub fn normalize_currency(code: &str) -> Result<String, AppError> {
    let code = code.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(AppError::validation(format!(
            "currency must be a three-letter code, got '{code}'"
        )))
    }
}
