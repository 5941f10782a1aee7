use crate::domain::money::Balance;
use crate::domain::schedule::ScheduleEntry;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ScheduleRow {
    period: u32,
    due_date: NaiveDate,
    payment: Balance,
    principal: Balance,
    interest: Balance,
    remaining_balance: Balance,
}

impl From<&ScheduleEntry> for ScheduleRow {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            period: entry.period,
            due_date: entry.due_date,
            payment: entry.payment,
            principal: entry.principal,
            interest: entry.interest,
            remaining_balance: entry.remaining_balance,
        }
    }
}

/// Writes an amortization schedule as CSV, one row per installment.
pub struct ScheduleWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ScheduleWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_schedule(&mut self, schedule: &[ScheduleEntry]) -> Result<()> {
        for entry in schedule {
            self.writer.serialize(ScheduleRow::from(entry))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
