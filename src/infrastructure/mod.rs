//! Storage backends for the loan collection and the theme preference.

pub mod in_memory;
pub mod json_file;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
