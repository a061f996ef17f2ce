//! Credit accounts fed to the payoff projector.

use serde::{Deserialize, Serialize};

use crate::error::FinanceError;
use crate::money::Money;

/// A revolving credit account with a balance to pay down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAccount {
    /// Display name, also used to identify the account in projections.
    pub name: String,
    /// Current balance owed.
    pub balance: Money,
    /// Annual percentage rate, in percent (`19.99` means 19.99%).
    #[serde(default)]
    pub apr: f64,
    /// Minimum monthly payment.
    pub minimum_payment: Money,
}

impl CreditAccount {
    pub fn new(name: impl Into<String>, balance: Money, apr: f64, minimum_payment: Money) -> Self {
        Self {
            name: name.into(),
            balance,
            apr,
            minimum_payment,
        }
    }

    /// Check that the account can be projected.
    pub fn validate(&self) -> Result<(), FinanceError> {
        if self.name.trim().is_empty() {
            return Err(FinanceError::validation(&self.name, "name must not be empty"));
        }
        if self.balance.is_negative() {
            return Err(FinanceError::validation(&self.name, "balance must not be negative"));
        }
        if !self.apr.is_finite() || self.apr < 0.0 {
            return Err(FinanceError::validation(
                &self.name,
                format!("APR must be a non-negative percentage, got {}", self.apr),
            ));
        }
        if self.minimum_payment.is_negative() {
            return Err(FinanceError::validation(
                &self.name,
                "minimum payment must not be negative",
            ));
        }
        if self.balance.is_positive() && self.minimum_payment.is_zero() {
            return Err(FinanceError::validation(
                &self.name,
                "an account with a balance needs a minimum payment",
            ));
        }
        Ok(())
    }

    /// Interest charged this month on `balance`, `None` on overflow.
    pub fn interest_on(&self, balance: Money) -> Option<Money> {
        balance.monthly_interest(self.apr)
    }
}
