use crate::domain::book::LoanBook;
use crate::domain::ports::{DARK_MODE_KEY, LOANS_KEY, LoanStore, PreferenceStore};
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use rocksdb::{DB, Options};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A persistent key-value store backed by RocksDB.
///
/// Uses the same two keys as the JSON file store in the default column
/// family: `loans` holds the serialized [`LoanBook`], `darkMode` holds a
/// single byte.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path)?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl LoanStore for RocksDBStore {
    async fn load(&self) -> Result<Option<LoanBook>> {
        match self.db.get(LOANS_KEY)? {
            Some(bytes) => {
                let book = LoanBook::from_json(&bytes)?;
                debug!(loans = book.len(), "loaded loans from RocksDB");
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, book: &LoanBook) -> Result<()> {
        self.db.put(LOANS_KEY, book.to_json()?)?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for RocksDBStore {
    async fn dark_mode(&self) -> Result<bool> {
        match self.db.get_pinned(DARK_MODE_KEY)? {
            Some(bytes) => match bytes.as_ref() {
                [0] => Ok(false),
                [1] => Ok(true),
                _ => Err(LoanError::StorageError(
                    "darkMode entry is not a single flag byte".to_string(),
                )),
            },
            None => Ok(false),
        }
    }

    async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.db.put(DARK_MODE_KEY, [u8::from(enabled)])?;
        Ok(())
    }
}
