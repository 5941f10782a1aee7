//! Output adapters used by the command-line front end.

pub mod csv;
pub mod display;
