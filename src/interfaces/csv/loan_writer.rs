use crate::domain::loan::{Loan, LoanId, LoanStatus};
use crate::domain::money::Balance;
use crate::domain::schedule::{Cadence, InterestModel};
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LoanRow<'a> {
    id: LoanId,
    name: &'a str,
    status: LoanStatus,
    principal: Balance,
    rate: Decimal,
    term: u32,
    model: InterestModel,
    cadence: Cadence,
    installment: Balance,
    remaining_balance: Balance,
    start_date: NaiveDate,
    payments: usize,
}

impl<'a> From<&'a Loan> for LoanRow<'a> {
    fn from(loan: &'a Loan) -> Self {
        Self {
            id: loan.id,
            name: &loan.name,
            status: loan.status,
            principal: loan.original_amount,
            rate: loan.interest_rate,
            term: loan.term,
            model: loan.interest_model,
            cadence: loan.cadence,
            installment: loan.installment,
            remaining_balance: loan.remaining_balance,
            start_date: loan.start_date,
            payments: loan.payments.len(),
        }
    }
}

/// Writes the loan list as CSV.
pub struct LoanWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LoanWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_loans<'a, I>(&mut self, loans: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Loan>,
    {
        let mut wrote_any = false;
        for loan in loans {
            self.writer.serialize(LoanRow::from(loan))?;
            wrote_any = true;
        }
        if !wrote_any {
            // csv only emits headers alongside the first record.
            self.writer.write_record([
                "id",
                "name",
                "status",
                "principal",
                "rate",
                "term",
                "model",
                "cadence",
                "installment",
                "remaining_balance",
                "start_date",
                "payments",
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loan::NewLoan;
    use crate::domain::schedule::LoanTerms;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_loans() {
        let mut loan = Loan::new(
            LoanId::generate(),
            NewLoan {
                name: "Car, used".to_string(),
                terms: LoanTerms {
                    principal: dec!(10000),
                    rate_percent: dec!(10),
                    periods: 5,
                    start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    model: InterestModel::Flat,
                    cadence: Cadence::Weekly,
                },
            },
        )
        .unwrap();
        loan.apply_payment(dec!(2200), NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(), None)
            .unwrap();

        let mut out = Vec::new();
        LoanWriter::new(&mut out).write_loans([&loan]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "id,name,status,principal,rate,term,model,cadence,installment,remaining_balance,start_date,payments"
        );
        assert_eq!(
            lines[1],
            format!("{},\"Car, used\",active,10000.00,10,5,flat,weekly,2200.00,8800.00,2025-01-01,1", loan.id)
        );
    }

    #[test]
    fn test_write_no_loans_still_has_header() {
        let mut out = Vec::new();
        LoanWriter::new(&mut out)
            .write_loans(std::iter::empty())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id,name,status,"));
        assert_eq!(text.lines().count(), 1);
    }
}
