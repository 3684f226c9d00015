//! Embedded record store: one JSON array in one file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{sort_newest_first, RecordStore, Result};
use crate::book::{Book, NewBook};
use crate::filter::BookFilter;

/// Stores the whole collection in a single JSON file.
///
/// Every query reads the file, every insert rewrites it. Writers are serialized
/// through an in-process mutex so concurrent inserts in one process never lose
/// a record; readers never take the lock. Several processes sharing one file are
/// not coordinated.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Open the store, creating the parent directory and an empty `[]` file if
    /// missing. Existing data is never touched.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => {
                fs::write(&path, b"[]").await?;
                info!(path = %path.display(), "created empty record file");
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Book>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the file contents. Written to a sibling file first and renamed so
    /// readers never observe a half-written collection.
    async fn save(&self, books: &[Book]) -> Result<()> {
        let json = serde_json::to_vec_pretty(books)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

/// Millisecond token, strictly greater than every numeric id already present.
fn next_id(books: &[Book], now_millis: i64) -> String {
    let highest = books
        .iter()
        .filter_map(|b| b.id.parse::<i64>().ok())
        .max();
    match highest {
        Some(highest) if highest >= now_millis => (highest + 1).to_string(),
        _ => now_millis.to_string(),
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn insert(&self, book: NewBook) -> Result<Book> {
        let _guard = self.write_lock.lock().await;

        let mut books = self.load().await?;
        let id = next_id(&books, chrono::Utc::now().timestamp_millis());
        let book = book.into_book(id);
        books.push(book.clone());
        self.save(&books).await?;

        debug!(id = %book.id, total = books.len(), "record appended to file");
        Ok(book)
    }

    async fn query(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = self
            .load()
            .await?
            .into_iter()
            .filter(|b| filter.matches(b))
            .collect();
        sort_newest_first(&mut books);
        Ok(books)
    }

    async fn get(&self, id: &str) -> Result<Option<Book>> {
        Ok(self.load().await?.into_iter().find(|b| b.id == id))
    }

    async fn ping(&self) -> Result<()> {
        fs::metadata(&self.path).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "json-file"
    }
}
