use crate::domain::money::{Amount, Balance};
use crate::domain::schedule::{
    Cadence, InterestModel, LoanTerms, ScheduleEntry, compute_schedule, regular_installment,
    total_payable,
};
use crate::error::{LoanError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, unique loan identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LoanId {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| LoanError::InvalidInput(format!("'{s}' is not a loan id")))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Paid,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanStatus::Active => f.write_str("active"),
            LoanStatus::Paid => f.write_str("paid"),
        }
    }
}

/// A payment recorded against a loan. Never edited once appended.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub amount: Amount,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Validated input for creating a loan.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub name: String,
    pub terms: LoanTerms,
}

/// Result of applying a payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentOutcome {
    pub remaining_balance: Balance,
    pub status: LoanStatus,
    /// Part of the payment beyond the outstanding balance. It is recorded in
    /// the payment log but not credited anywhere.
    pub absorbed: Balance,
}

/// A tracked loan with its schedule and payment history.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: LoanId,
    pub name: String,
    pub original_amount: Balance,
    pub interest_rate: Decimal,
    pub term: u32,
    pub start_date: NaiveDate,
    pub interest_model: InterestModel,
    pub cadence: Cadence,
    /// Regular installment amount.
    pub installment: Balance,
    pub status: LoanStatus,
    pub remaining_balance: Balance,
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub payment_schedule: Vec<ScheduleEntry>,
}

impl Loan {
    /// Builds a loan and its schedule. Nothing is created if the terms are invalid.
    pub fn new(id: LoanId, new_loan: NewLoan) -> Result<Self> {
        let name = new_loan.name.trim().to_string();
        if name.is_empty() {
            return Err(LoanError::InvalidInput(
                "loan name must not be empty".to_string(),
            ));
        }

        let schedule = compute_schedule(&new_loan.terms)?;
        let terms = new_loan.terms;

        Ok(Self {
            id,
            name,
            original_amount: Balance::new(terms.principal),
            interest_rate: terms.rate_percent,
            term: terms.periods,
            start_date: terms.start_date,
            interest_model: terms.model,
            cadence: terms.cadence,
            installment: regular_installment(&schedule),
            status: LoanStatus::Active,
            remaining_balance: total_payable(&schedule),
            payments: Vec::new(),
            payment_schedule: schedule,
        })
    }

    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.original_amount.value(),
            rate_percent: self.interest_rate,
            periods: self.term,
            start_date: self.start_date,
            model: self.interest_model,
            cadence: self.cadence,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == LoanStatus::Paid
    }

    /// Total of every payment recorded so far, including absorbed excess.
    pub fn total_paid(&self) -> Balance {
        self.payments.iter().map(|p| Balance::from(p.amount)).sum()
    }

    /// First scheduled installment due on or after `today`.
    pub fn next_due(&self, today: NaiveDate) -> Option<&ScheduleEntry> {
        self.payment_schedule
            .iter()
            .find(|entry| entry.due_date >= today)
    }

    /// Applies a payment to the outstanding balance.
    ///
    /// The balance is floored at zero; reaching zero marks the loan paid, and a
    /// paid loan stays paid. The payment is logged in full either way.
    pub fn apply_payment(
        &mut self,
        amount: Decimal,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<PaymentOutcome> {
        let amount = Amount::new(amount)?;
        let paid = Balance::from(amount);

        let absorbed = paid.saturating_sub(self.remaining_balance);
        self.remaining_balance = self.remaining_balance.saturating_sub(paid);
        if self.remaining_balance.is_zero() {
            self.status = LoanStatus::Paid;
        }

        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.payments.push(Payment { amount, date, note });

        Ok(PaymentOutcome {
            remaining_balance: self.remaining_balance,
            status: self.status,
            absorbed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat_loan() -> Loan {
        Loan::new(
            LoanId::generate(),
            NewLoan {
                name: "  Car loan ".to_string(),
                terms: LoanTerms {
                    principal: dec!(10000),
                    rate_percent: dec!(10),
                    periods: 5,
                    start_date: date(2025, 3, 1),
                    model: InterestModel::Flat,
                    cadence: Cadence::Weekly,
                },
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_loan_starts_active_with_total_payable() {
        let loan = flat_loan();
        assert_eq!(loan.name, "Car loan");
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.remaining_balance, Balance::new(dec!(11000)));
        assert_eq!(loan.installment, Balance::new(dec!(2200)));
        assert_eq!(loan.payment_schedule.len(), 5);
        assert!(loan.payments.is_empty());
    }

    #[test]
    fn test_new_loan_rejects_invalid_input() {
        let mut input = NewLoan {
            name: "   ".to_string(),
            terms: flat_loan().terms(),
        };
        assert!(matches!(
            Loan::new(LoanId::generate(), input.clone()),
            Err(LoanError::InvalidInput(_))
        ));

        input.name = "Phone".to_string();
        input.terms.periods = 0;
        assert!(matches!(
            Loan::new(LoanId::generate(), input),
            Err(LoanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_partial_payment_keeps_schedule() {
        let mut loan = flat_loan();
        let schedule_before = loan.payment_schedule.clone();

        let outcome = loan
            .apply_payment(dec!(2200), date(2025, 3, 8), Some("week 1".into()))
            .unwrap();

        assert_eq!(outcome.remaining_balance, Balance::new(dec!(8800)));
        assert_eq!(outcome.status, LoanStatus::Active);
        assert_eq!(outcome.absorbed, Balance::ZERO);
        assert_eq!(loan.payments.len(), 1);
        assert_eq!(loan.payments[0].note.as_deref(), Some("week 1"));
        assert_eq!(loan.payment_schedule, schedule_before);
    }

    #[test]
    fn test_overpayment_is_absorbed_and_pays_off() {
        let mut loan = flat_loan();
        loan.apply_payment(dec!(10000), date(2025, 3, 8), None)
            .unwrap();

        let outcome = loan
            .apply_payment(dec!(5000), date(2025, 3, 15), None)
            .unwrap();

        assert_eq!(outcome.remaining_balance, Balance::ZERO);
        assert_eq!(outcome.status, LoanStatus::Paid);
        assert_eq!(outcome.absorbed, Balance::new(dec!(4000)));
        // The full amount is still logged.
        assert_eq!(loan.payments[1].amount.value(), dec!(5000));
        assert_eq!(loan.total_paid(), Balance::new(dec!(15000)));
    }

    #[test]
    fn test_paid_is_terminal() {
        let mut loan = flat_loan();
        loan.apply_payment(dec!(11000), date(2025, 3, 8), None)
            .unwrap();
        assert!(loan.is_paid());

        let outcome = loan
            .apply_payment(dec!(1), date(2025, 3, 9), None)
            .unwrap();
        assert_eq!(outcome.status, LoanStatus::Paid);
        assert_eq!(loan.remaining_balance, Balance::ZERO);
        assert_eq!(loan.payments.len(), 2);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let mut loan = flat_loan();
        for amount in [dec!(0), dec!(-5)] {
            assert!(matches!(
                loan.apply_payment(amount, date(2025, 3, 8), None),
                Err(LoanError::InvalidInput(_))
            ));
        }
        assert!(loan.payments.is_empty());
        assert_eq!(loan.remaining_balance, Balance::new(dec!(11000)));
    }

    #[test]
    fn test_next_due() {
        let loan = flat_loan();
        assert_eq!(loan.next_due(date(2025, 1, 1)).unwrap().period, 1);
        assert_eq!(loan.next_due(date(2025, 3, 9)).unwrap().period, 2);
        assert!(loan.next_due(date(2026, 1, 1)).is_none());
    }

    #[test]
    fn test_loan_json_field_names() {
        let loan = flat_loan();
        let json = serde_json::to_value(&loan).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["interestModel"], "flat");
        assert_eq!(json["cadence"], "weekly");
        assert!(json["paymentSchedule"].is_array());
        assert_eq!(json["id"].as_str().unwrap(), loan.id.to_string());

        let back: Loan = serde_json::from_value(json).unwrap();
        assert_eq!(back, loan);
    }
}
