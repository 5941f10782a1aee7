use super::book::LoanBook;
use crate::error::Result;
use async_trait::async_trait;

/// Key under which the serialized loan collection is stored.
pub const LOANS_KEY: &str = "loans";
/// Key under which the dark-mode flag is stored.
pub const DARK_MODE_KEY: &str = "darkMode";

#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<LoanBook>>;
    async fn save(&self, book: &LoanBook) -> Result<()>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Defaults to `false` when the preference was never set.
    async fn dark_mode(&self) -> Result<bool>;
    async fn set_dark_mode(&self, enabled: bool) -> Result<()>;
}

pub type LoanStoreBox = Box<dyn LoanStore>;
pub type PreferenceStoreBox = Box<dyn PreferenceStore>;
