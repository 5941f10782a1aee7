use crate::domain::book::LoanBook;
use crate::domain::ports::{LoanStore, PreferenceStore};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory store for the loan collection and the dark-mode flag.
///
/// Clones share the same state, so a clone handed to a `LoanTracker` can be
/// inspected afterwards. Nothing survives the process.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    book: Arc<RwLock<Option<LoanBook>>>,
    dark_mode: Arc<RwLock<Option<bool>>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanStore for InMemoryStore {
    async fn load(&self) -> Result<Option<LoanBook>> {
        let book = self.book.read().await;
        Ok(book.clone())
    }

    async fn save(&self, book: &LoanBook) -> Result<()> {
        let mut slot = self.book.write().await;
        *slot = Some(book.clone());
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for InMemoryStore {
    async fn dark_mode(&self) -> Result<bool> {
        Ok(self.dark_mode.read().await.unwrap_or(false))
    }

    async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        *self.dark_mode.write().await = Some(enabled);
        Ok(())
    }
}
