//! Loan domain: money, schedules, loans and the owned loan collection.

pub mod book;
pub mod loan;
pub mod money;
pub mod ports;
pub mod schedule;
