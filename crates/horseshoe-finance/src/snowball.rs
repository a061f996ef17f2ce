//! Debt snowball payoff projection.
//!
//! Every month each open account accrues interest and receives its minimum
//! payment. Whatever is left of the monthly budget goes to the open accounts
//! in priority order, so the budget "snowballs" onto the next account as each
//! one is paid off.

use std::cmp::Ordering;

use chrono::{Datelike, Local, Months, NaiveDate};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::account::CreditAccount;
use crate::error::FinanceError;
use crate::money::Money;

/// Custom priority between two accounts. `Less` is paid first.
pub type AccountComparator = fn(&CreditAccount, &CreditAccount) -> Ordering;

/// Which account receives the snowball first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SnowballOrder {
    /// Smallest balance first (the classic snowball).
    #[default]
    LowestBalanceFirst,
    /// Highest APR first (the "avalanche").
    HighestRateFirst,
    HighestBalanceFirst,
    /// Keep the order the accounts were given in.
    AsListed,
}

impl SnowballOrder {
    /// Compare two accounts under this order.
    pub fn compare(self, a: &CreditAccount, b: &CreditAccount) -> Ordering {
        match self {
            Self::LowestBalanceFirst => a.balance.cmp(&b.balance),
            Self::HighestRateFirst => b
                .apr
                .total_cmp(&a.apr)
                .then_with(|| a.balance.cmp(&b.balance)),
            Self::HighestBalanceFirst => b.balance.cmp(&a.balance),
            Self::AsListed => Ordering::Equal,
        }
    }
}

/// Configuration for a payoff projection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SnowballConfig {
    /// Paid every month on top of the minimums.
    #[builder(default)]
    pub extra_payment: Money,

    #[builder(default)]
    pub order: SnowballOrder,

    /// Overrides `order` when set.
    #[builder(setter(custom), default)]
    pub comparator: Option<AccountComparator>,

    /// Give up after this many months.
    #[builder(default = "600")]
    pub max_months: u32,

    /// Date of the first payment month.
    #[builder(default = "first_of_current_month()")]
    pub start: NaiveDate,

    /// Keep paying a retired account's minimum into the snowball.
    #[builder(default = "true")]
    pub roll_over_payments: bool,
}

impl SnowballConfigBuilder {
    /// Prioritise accounts with a custom comparator instead of an order.
    pub fn comparator(&mut self, comparator: AccountComparator) -> &mut Self {
        self.comparator = Some(Some(comparator));
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_months == Some(0) {
            return Err("max_months must be at least 1".to_string());
        }
        if self.extra_payment.is_some_and(Money::is_negative) {
            return Err("extra_payment must not be negative".to_string());
        }
        Ok(())
    }
}

impl Default for SnowballConfig {
    fn default() -> Self {
        Self {
            extra_payment: Money::ZERO,
            order: SnowballOrder::default(),
            comparator: None,
            max_months: 600,
            start: first_of_current_month(),
            roll_over_payments: true,
        }
    }
}

impl SnowballConfig {
    /// Create a new config builder.
    pub fn builder() -> SnowballConfigBuilder {
        SnowballConfigBuilder::default()
    }

    /// The effective account priority.
    pub fn compare(&self, a: &CreditAccount, b: &CreditAccount) -> Ordering {
        match self.comparator {
            Some(cmp) => cmp(a, b),
            None => self.order.compare(a, b),
        }
    }
}

fn first_of_current_month() -> NaiveDate {
    let today = Local::now().date_naive();
    today.with_day(1).unwrap_or(today)
}

/// One account's line in a monthly snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPayment {
    pub name: String,
    /// Interest charged this month.
    pub interest: Money,
    /// Amount paid this month.
    pub payment: Money,
    /// Balance after the payment.
    pub balance: Money,
}

/// State of every account at the end of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    /// 1-based month index.
    pub month: u32,
    pub date: NaiveDate,
    /// One line per account, in priority order.
    pub payments: Vec<AccountPayment>,
    /// Sum of all balances after this month's payments.
    pub total_balance: Money,
}

impl MonthlySnapshot {
    /// Total paid across all accounts this month.
    pub fn total_payment(&self) -> Money {
        self.payments.iter().map(|p| p.payment).sum()
    }
}

/// How and when one account is retired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPayoff {
    pub name: String,
    pub starting_balance: Money,
    /// Month the balance reached zero; 0 for an account that started at zero.
    pub payoff_month: u32,
    pub payoff_date: NaiveDate,
    pub interest_paid: Money,
    pub total_paid: Money,
}

/// A complete payoff schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffProjection {
    /// Accounts in priority order.
    pub accounts: Vec<AccountPayoff>,
    pub months: Vec<MonthlySnapshot>,
    /// Budget of the first month: minimums plus extra.
    pub monthly_budget: Money,
    pub total_interest: Money,
    pub total_paid: Money,
}

impl PayoffProjection {
    /// Months until every balance is zero.
    pub fn months_to_payoff(&self) -> u32 {
        self.months.len() as u32
    }

    /// Date of the final payment, if any payment was needed.
    pub fn payoff_date(&self) -> Option<NaiveDate> {
        self.months.last().map(|m| m.date)
    }

    /// Look up an account's payoff by name.
    pub fn account(&self, name: &str) -> Option<&AccountPayoff> {
        self.accounts.iter().find(|a| a.name == name)
    }
}

/// Debt snowball projector.
#[derive(Debug, Clone, Default)]
pub struct SnowballProjector {
    config: SnowballConfig,
}

impl SnowballProjector {
    /// Create a new projector with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new projector with custom config.
    pub fn with_config(config: SnowballConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnowballConfig {
        &self.config
    }

    /// Project the payoff of `accounts`.
    pub fn project(&self, accounts: &[CreditAccount]) -> Result<PayoffProjection, FinanceError> {
        project(accounts, &self.config)
    }
}

/// Project month by month until every account is paid off.
///
/// Fails with [`FinanceError::NeverPaidOff`] when balances remain after
/// `max_months`, or as soon as a month leaves every open account owing at
/// least as much as it did before. From then on each month repeats the same
/// payments against interest that can only grow. Amounts that no longer fit
/// in a [`Money`] fail with [`FinanceError::Overflow`].
pub fn project(
    accounts: &[CreditAccount],
    config: &SnowballConfig,
) -> Result<PayoffProjection, FinanceError> {
    if accounts.is_empty() {
        return Err(FinanceError::NoAccounts);
    }
    for account in accounts {
        account.validate()?;
    }

    // Stable: ties keep their listed order.
    let mut ordered = accounts.to_vec();
    ordered.sort_by(|a, b| config.compare(a, b));

    let mut balances: Vec<Money> = ordered.iter().map(|a| a.balance).collect();
    let mut payoffs: Vec<AccountPayoff> = ordered
        .iter()
        .map(|a| AccountPayoff {
            name: a.name.clone(),
            starting_balance: a.balance,
            payoff_month: 0,
            payoff_date: config.start,
            interest_paid: Money::ZERO,
            total_paid: Money::ZERO,
        })
        .collect();

    let all_minimums = Money::checked_sum(ordered.iter().map(|a| a.minimum_payment));
    let monthly_budget = all_minimums
        .and_then(|m| m.checked_add(config.extra_payment))
        .ok_or(FinanceError::Overflow { month: 0 })?;
    let mut months = Vec::new();
    let mut month = 0u32;

    while balances.iter().any(|b| b.is_positive()) {
        if month >= config.max_months {
            return Err(FinanceError::NeverPaidOff { months: month });
        }
        month += 1;
        let overflow = || FinanceError::Overflow { month };
        let date = config
            .start
            .checked_add_months(Months::new(month - 1))
            .unwrap_or(NaiveDate::MAX);

        let balances_before = balances.clone();
        let open_before: Vec<bool> = balances.iter().map(|b| b.is_positive()).collect();
        let mut lines: Vec<AccountPayment> = ordered
            .iter()
            .map(|a| AccountPayment {
                name: a.name.clone(),
                interest: Money::ZERO,
                payment: Money::ZERO,
                balance: Money::ZERO,
            })
            .collect();

        let mut budget = if config.roll_over_payments {
            monthly_budget
        } else {
            // Never more than `monthly_budget`, so this cannot overflow.
            ordered
                .iter()
                .zip(&open_before)
                .filter(|(_, open)| **open)
                .map(|(a, _)| a.minimum_payment)
                .sum::<Money>()
                + config.extra_payment
        };

        for (i, account) in ordered.iter().enumerate() {
            if open_before[i] {
                let interest = account.interest_on(balances[i]).ok_or_else(overflow)?;
                balances[i] = balances[i].checked_add(interest).ok_or_else(overflow)?;
                lines[i].interest = interest;
                payoffs[i].interest_paid = payoffs[i]
                    .interest_paid
                    .checked_add(interest)
                    .ok_or_else(overflow)?;
            }
        }

        for (i, account) in ordered.iter().enumerate() {
            if open_before[i] {
                let payment = account.minimum_payment.min(balances[i]).min(budget);
                pay(&mut balances[i], &mut lines[i], &mut payoffs[i], &mut budget, payment)
                    .ok_or_else(overflow)?;
            }
        }

        for i in 0..ordered.len() {
            if !budget.is_positive() {
                break;
            }
            if balances[i].is_positive() {
                let payment = budget.min(balances[i]);
                pay(&mut balances[i], &mut lines[i], &mut payoffs[i], &mut budget, payment)
                    .ok_or_else(overflow)?;
            }
        }

        let mut closed = false;
        for i in 0..ordered.len() {
            lines[i].balance = balances[i];
            if open_before[i] && balances[i].is_zero() {
                closed = true;
                payoffs[i].payoff_month = month;
                payoffs[i].payoff_date = date;
                debug!(account = %payoffs[i].name, month, "account paid off");
            }
        }

        let stalled = !closed
            && balances
                .iter()
                .zip(&balances_before)
                .zip(&open_before)
                .all(|((after, before), open)| !open || after >= before);
        if stalled {
            debug!(month, "balances are not going down");
            return Err(FinanceError::NeverPaidOff { months: month });
        }

        let total_balance = Money::checked_sum(balances.iter().copied()).ok_or_else(overflow)?;
        months.push(MonthlySnapshot {
            month,
            date,
            payments: lines,
            total_balance,
        });
    }

    let overflow = || FinanceError::Overflow { month };
    let total_interest =
        Money::checked_sum(payoffs.iter().map(|p| p.interest_paid)).ok_or_else(overflow)?;
    let total_paid = Money::checked_sum(payoffs.iter().map(|p| p.total_paid)).ok_or_else(overflow)?;
    info!(
        accounts = ordered.len(),
        months = month,
        %total_interest,
        "snowball projection complete"
    );

    Ok(PayoffProjection {
        accounts: payoffs,
        months,
        monthly_budget,
        total_interest,
        total_paid,
    })
}

/// Move `amount` from the budget onto an account. `None` on overflow.
fn pay(
    balance: &mut Money,
    line: &mut AccountPayment,
    payoff: &mut AccountPayoff,
    budget: &mut Money,
    amount: Money,
) -> Option<()> {
    *balance = balance.checked_sub(amount)?;
    *budget = budget.checked_sub(amount)?;
    line.payment = line.payment.checked_add(amount)?;
    payoff.total_paid = payoff.total_paid.checked_add(amount)?;
    Some(())
}
