use crate::domain::loan::{Loan, LoanId, LoanStatus, NewLoan, PaymentOutcome};
use crate::domain::money::Balance;
use crate::error::{LoanError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest persisted layout this build understands.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Status filter applied to the loan list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Paid,
}

impl StatusFilter {
    pub fn matches(self, status: LoanStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => status == LoanStatus::Active,
            StatusFilter::Paid => status == LoanStatus::Paid,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Active => f.write_str("active"),
            StatusFilter::Paid => f.write_str("paid"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "paid" => Ok(StatusFilter::Paid),
            other => Err(LoanError::InvalidInput(format!(
                "unknown status filter '{other}'"
            ))),
        }
    }
}

/// The next installment due across all active loans.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingPayment {
    pub loan_id: LoanId,
    pub loan_name: String,
    pub due_date: NaiveDate,
    pub amount: Balance,
}

/// Aggregate figures shown above the loan list.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanStats {
    pub total_loans: usize,
    pub active_loans: usize,
    /// Outstanding balance summed over active loans.
    pub total_balance: Balance,
    pub upcoming_payment: Option<UpcomingPayment>,
}

/// The owned loan collection and the operations the front end performs on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanBook {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    loans: Vec<Loan>,
}

impl Default for LoanBook {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanBook {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            loans: Vec::new(),
        }
    }

    /// Decodes a persisted book, refusing layouts newer than this build.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice::<LoanBook>(bytes)?.ensure_supported()
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value::<LoanBook>(value)?.ensure_supported()
    }

    fn ensure_supported(self) -> Result<Self> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(LoanError::StorageError(format!(
                "loan data has schema version {}, newest supported is {}",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(self)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn get(&self, id: LoanId) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == id)
    }

    /// Creates a loan and appends it; the book is unchanged on error.
    pub fn add_loan(&mut self, new_loan: NewLoan) -> Result<&Loan> {
        let loan = Loan::new(LoanId::generate(), new_loan)?;
        self.loans.push(loan);
        Ok(&self.loans[self.loans.len() - 1])
    }

    pub fn record_payment(
        &mut self,
        id: LoanId,
        amount: Decimal,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<PaymentOutcome> {
        let loan = self
            .loans
            .iter_mut()
            .find(|loan| loan.id == id)
            .ok_or_else(|| LoanError::NotFound(id.to_string()))?;
        loan.apply_payment(amount, date, note)
    }

    pub fn delete_loan(&mut self, id: LoanId) -> Result<Loan> {
        let index = self
            .loans
            .iter()
            .position(|loan| loan.id == id)
            .ok_or_else(|| LoanError::NotFound(id.to_string()))?;
        Ok(self.loans.remove(index))
    }

    /// Loans whose name contains `query` (case-insensitive) and whose status
    /// passes `filter`, in insertion order.
    pub fn search(&self, query: &str, filter: StatusFilter) -> Vec<&Loan> {
        let needle = query.to_lowercase();
        self.loans
            .iter()
            .filter(|loan| filter.matches(loan.status))
            .filter(|loan| needle.is_empty() || loan.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn stats(&self, today: NaiveDate) -> LoanStats {
        let active: Vec<&Loan> = self
            .loans
            .iter()
            .filter(|loan| loan.status == LoanStatus::Active)
            .collect();

        let upcoming_payment = active
            .iter()
            .filter_map(|loan| loan.next_due(today).map(|entry| (*loan, entry)))
            .min_by_key(|(_, entry)| entry.due_date)
            .map(|(loan, entry)| UpcomingPayment {
                loan_id: loan.id,
                loan_name: loan.name.clone(),
                due_date: entry.due_date,
                amount: entry.payment,
            });

        LoanStats {
            total_loans: self.loans.len(),
            active_loans: active.len(),
            total_balance: active.iter().map(|loan| loan.remaining_balance).sum(),
            upcoming_payment,
        }
    }
}
