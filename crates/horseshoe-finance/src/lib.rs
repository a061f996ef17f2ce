//! Credit payoff projections for horseshoe.
//!
//! Provides a month-by-month debt snowball projection:
//! - [`CreditAccount`] describes a balance, its APR and minimum payment
//! - [`SnowballConfig`] picks the extra payment and account priority
//! - [`project`] produces a [`PayoffProjection`] schedule
//!
//! Amounts are whole cents ([`Money`]) so a schedule always balances:
//! the total paid equals the starting balances plus the interest charged.

mod account;
mod error;
mod money;
mod snowball;

pub use account::CreditAccount;
pub use error::FinanceError;
pub use money::Money;
pub use snowball::{
    AccountComparator, AccountPayment, AccountPayoff, MonthlySnapshot, PayoffProjection,
    SnowballConfig, SnowballConfigBuilder, SnowballOrder, SnowballProjector, project,
};
