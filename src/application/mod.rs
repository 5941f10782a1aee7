//! Application layer orchestrating the loan domain and its storage.
//!
//! This module defines the `LoanTracker`, the single owner of the in-memory
//! loan collection. Front ends call into it with validated primitive inputs
//! and render what it returns.

pub mod tracker;
