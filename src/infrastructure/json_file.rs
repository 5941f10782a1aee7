use crate::domain::book::LoanBook;
use crate::domain::ports::{DARK_MODE_KEY, LOANS_KEY, LoanStore, PreferenceStore};
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A flat key-value store kept in a single JSON file.
///
/// The file holds one object whose `loans` key carries the serialized
/// [`LoanBook`] and whose `darkMode` key carries the theme preference. Unknown
/// keys are preserved. Writes go to a temporary file in the same directory
/// that is then renamed over the original, so a crash never leaves a
/// half-written file behind.
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Uses `path` as the backing file. The file is created on first write.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice(&bytes)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(LoanError::StorageError(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_entries(&self, entries: Map<String, Value>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &Value::Object(entries))?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| LoanError::IoError(e.error))?;
        Ok(())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value);
        self.write_entries(entries)?;
        debug!(path = %self.path.display(), key, "saved entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries()?;
        Ok(entries.remove(key))
    }
}

#[async_trait]
impl LoanStore for JsonFileStore {
    async fn load(&self) -> Result<Option<LoanBook>> {
        match self.get(LOANS_KEY).await? {
            Some(value) => {
                let book = LoanBook::from_value(value)?;
                debug!(path = %self.path.display(), loans = book.len(), "loaded loans");
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, book: &LoanBook) -> Result<()> {
        self.put(LOANS_KEY, serde_json::to_value(book)?).await
    }
}

#[async_trait]
impl PreferenceStore for JsonFileStore {
    async fn dark_mode(&self) -> Result<bool> {
        // The flag has been stored both as a bool and as the string "true".
        Ok(match self.get(DARK_MODE_KEY).await? {
            Some(Value::Bool(enabled)) => enabled,
            Some(Value::String(s)) => s == "true",
            _ => false,
        })
    }

    async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.put(DARK_MODE_KEY, Value::Bool(enabled)).await
    }
}
