//! Amortization schedule generation.
//!
//! Turns a loan's terms into the dated sequence of installments. Two interest
//! conventions are supported and the choice is stored on every loan, so a
//! schedule is always rebuilt with the convention it was created with.

use crate::domain::money::{Balance, round_money};
use crate::error::{LoanError, Result};
use chrono::{Days, Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How interest is charged over the life of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestModel {
    /// Interest is `principal × rate` charged once and collected with the first installment.
    #[default]
    Flat,
    /// Level annuity payment on a declining balance.
    Amortizing,
}

/// Spacing between two scheduled installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    #[default]
    Weekly,
    Monthly,
}

impl Cadence {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Cadence::Weekly => 52,
            Cadence::Monthly => 12,
        }
    }

    /// Due date of the `period`-th installment counted from `start`.
    ///
    /// Monthly dates keep the start's day of month, clamped to the last day of
    /// shorter months; each one is derived from `start`, so a Jan 31 loan is due
    /// on Feb 28 and then on Mar 31 again.
    pub fn due_date(self, start: NaiveDate, period: u32) -> Option<NaiveDate> {
        match self {
            Cadence::Weekly => start.checked_add_days(Days::new(7 * u64::from(period))),
            Cadence::Monthly => start.checked_add_months(Months::new(period)),
        }
    }
}

impl fmt::Display for InterestModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterestModel::Flat => f.write_str("flat"),
            InterestModel::Amortizing => f.write_str("amortizing"),
        }
    }
}

impl FromStr for InterestModel {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(InterestModel::Flat),
            "amortizing" | "amortising" => Ok(InterestModel::Amortizing),
            other => Err(LoanError::InvalidInput(format!(
                "unknown interest model '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Weekly => f.write_str("weekly"),
            Cadence::Monthly => f.write_str("monthly"),
        }
    }
}

impl FromStr for Cadence {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(LoanError::InvalidInput(format!("unknown cadence '{other}'"))),
        }
    }
}

/// The inputs a schedule is computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub principal: Decimal,
    pub rate_percent: Decimal,
    pub periods: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub model: InterestModel,
    #[serde(default)]
    pub cadence: Cadence,
}

impl LoanTerms {
    pub fn validate(&self) -> Result<()> {
        if round_money(self.principal) <= Decimal::ZERO {
            return Err(LoanError::InvalidInput(
                "principal must be positive".to_string(),
            ));
        }
        if self.rate_percent < Decimal::ZERO {
            return Err(LoanError::InvalidInput(
                "interest rate must not be negative".to_string(),
            ));
        }
        if self.periods < 1 {
            return Err(LoanError::InvalidInput(
                "term must be at least one period".to_string(),
            ));
        }
        Ok(())
    }
}

/// One installment of a computed schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub period: u32,
    pub due_date: NaiveDate,
    pub payment: Balance,
    pub principal: Balance,
    pub interest: Balance,
    /// Principal still outstanding once this installment is paid.
    pub remaining_balance: Balance,
}

/// Computes the full installment schedule for `terms`.
///
/// Always yields `terms.periods` entries. The last entry settles whatever
/// principal and interest rounding left behind, so its remaining balance is
/// exactly zero and the principal components sum to the principal.
pub fn compute_schedule(terms: &LoanTerms) -> Result<Vec<ScheduleEntry>> {
    terms.validate()?;
    let principal = round_money(terms.principal);

    let rows = match terms.model {
        InterestModel::Flat => flat_rows(principal, terms.rate_percent, terms.periods)?,
        InterestModel::Amortizing => amortizing_rows(
            principal,
            terms.rate_percent,
            terms.periods,
            terms.cadence.periods_per_year(),
        )?,
    };

    rows.into_iter()
        .zip(1..=terms.periods)
        .map(|(row, period)| -> Result<ScheduleEntry> {
            let due_date = terms
                .cadence
                .due_date(terms.start_date, period)
                .ok_or_else(|| {
                    LoanError::InvalidInput(format!("due date of period {period} is out of range"))
                })?;
            Ok(ScheduleEntry {
                period,
                due_date,
                payment: Balance::new(row.principal + row.interest),
                principal: Balance::new(row.principal),
                interest: Balance::new(row.interest),
                remaining_balance: Balance::new(row.remaining),
            })
        })
        .collect()
}

/// Sum of every scheduled payment.
pub fn total_payable(schedule: &[ScheduleEntry]) -> Balance {
    schedule.iter().map(|entry| entry.payment).sum()
}

/// Amount of a regular (non-final) installment.
pub fn regular_installment(schedule: &[ScheduleEntry]) -> Balance {
    schedule
        .first()
        .map(|entry| entry.payment)
        .unwrap_or(Balance::ZERO)
}

struct Row {
    principal: Decimal,
    interest: Decimal,
    remaining: Decimal,
}

fn overflow() -> LoanError {
    LoanError::InvalidInput("principal, rate and term overflow the payment calculation".to_string())
}

fn flat_rows(principal: Decimal, rate_percent: Decimal, periods: u32) -> Result<Vec<Row>> {
    let total_interest = principal
        .checked_mul(rate_percent)
        .and_then(|v| v.checked_div(dec!(100)))
        .map(round_money)
        .ok_or_else(overflow)?;
    let installment = principal
        .checked_add(total_interest)
        .and_then(|v| v.checked_div(Decimal::from(periods)))
        .map(round_money)
        .ok_or_else(overflow)?;

    let mut rows = Vec::with_capacity(periods as usize);
    let mut balance = principal;
    let mut interest_due = total_interest;

    for period in 1..=periods {
        let (interest, principal_part) = if period == periods {
            (interest_due, balance)
        } else {
            // Interest larger than one installment spills into the next ones.
            let interest = interest_due.min(installment);
            (interest, (installment - interest).min(balance))
        };
        interest_due -= interest;
        balance -= principal_part;
        rows.push(Row {
            principal: principal_part,
            interest,
            remaining: balance,
        });
    }

    Ok(rows)
}

fn amortizing_rows(
    principal: Decimal,
    rate_percent: Decimal,
    periods: u32,
    periods_per_year: u32,
) -> Result<Vec<Row>> {
    let rate = rate_percent / dec!(100) / Decimal::from(periods_per_year);
    let payment = level_payment(principal, rate, periods)?;

    let mut rows = Vec::with_capacity(periods as usize);
    let mut balance = principal;

    for period in 1..=periods {
        let interest = round_money(balance.checked_mul(rate).ok_or_else(overflow)?);
        let principal_part = if period == periods {
            balance
        } else {
            (payment - interest).max(Decimal::ZERO).min(balance)
        };
        balance -= principal_part;
        rows.push(Row {
            principal: principal_part,
            interest,
            remaining: balance,
        });
    }

    Ok(rows)
}

/// Annuity payment `P·r·(1+r)^n / ((1+r)^n − 1)`, or `P / n` when `r` is zero.
///
/// When `(1+r)^n` is past `Decimal` range the payment has converged to `P·r`
/// to the cent, and that value is returned.
pub fn level_payment(principal: Decimal, rate: Decimal, periods: u32) -> Result<Decimal> {
    let n = Decimal::from(periods);
    if rate.is_zero() {
        return Ok(round_money(principal / n));
    }

    let interest = principal.checked_mul(rate).ok_or_else(overflow)?;
    let Some(growth) = (Decimal::ONE + rate).checked_powu(u64::from(periods)) else {
        return Ok(round_money(interest));
    };
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        // Rate too small to register at Decimal precision.
        return Ok(round_money(principal / n));
    }

    growth
        .checked_div(denominator)
        .and_then(|factor| interest.checked_mul(factor))
        .map(round_money)
        .ok_or_else(overflow)
}
