//! Error types for finance calculations.

use thiserror::Error;

/// Errors raised by account validation and payoff projection.
#[derive(Debug, Error, PartialEq)]
pub enum FinanceError {
    /// An account failed validation.
    #[error("Invalid account '{account}': {message}")]
    Validation { account: String, message: String },

    /// A projection was requested for no accounts.
    #[error("No accounts to project")]
    NoAccounts,

    /// The monthly budget cannot retire the balances.
    #[error("Balances are not paid off after {months} months")]
    NeverPaidOff { months: u32 },

    /// A balance or total grew past the representable range.
    #[error("Amounts overflow in month {month}")]
    Overflow { month: u32 },

    /// A monetary amount could not be parsed or is out of range.
    #[error("Invalid amount: {value}")]
    InvalidAmount { value: String },
}

impl FinanceError {
    pub(crate) fn validation(account: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            account: account.to_string(),
            message: message.into(),
        }
    }
}
