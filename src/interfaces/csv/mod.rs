pub mod loan_writer;
pub mod schedule_writer;
