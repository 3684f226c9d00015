//! Managed record store backed by a PostgreSQL `books` table.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::{RecordStore, RecordStoreError, Result};
use crate::book::{Book, NewBook};
use crate::filter::BookFilter;

const MAX_CONNECTIONS: u32 = 10;

/// Idempotent; safe to run on every startup.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    seq BIGSERIAL NOT NULL,
    id UUID PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    description TEXT,
    language TEXT,
    year INTEGER,
    subjects TEXT[] NOT NULL DEFAULT '{}',
    file_url TEXT NOT NULL,
    cover_image TEXT,
    uploaded_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS books_title_idx ON books (title);
CREATE INDEX IF NOT EXISTS books_author_idx ON books (author);
CREATE INDEX IF NOT EXISTS books_uploaded_at_idx ON books (uploaded_at DESC, seq);
CREATE INDEX IF NOT EXISTS books_subjects_idx ON books USING GIN (subjects);
"#;

const SELECT_COLUMNS: &str = "SELECT id, title, author, description, language, year, subjects, \
     file_url, cover_image, uploaded_at FROM books";

/// Record store over a PostgreSQL connection pool.
///
/// Ids are time-ordered UUIDs; lookups with anything that does not parse as a
/// UUID fail with [`RecordStoreError::InvalidId`].
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Connect to `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        info!("connected to postgres record store");
        Self::new(pool).await
    }

    /// Use an existing pool. Creates the schema if missing.
    pub async fn new(pool: PgPool) -> Result<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Only the canonical lowercase hyphenated form is an id; other spellings
/// of the same UUID would hand back a record whose `id` differs from the
/// one asked for.
fn parse_id(id: &str) -> Result<Uuid> {
    match Uuid::parse_str(id) {
        Ok(uuid) if uuid.hyphenated().to_string() == id => Ok(uuid),
        _ => Err(RecordStoreError::InvalidId(id.to_string())),
    }
}

/// Escape LIKE metacharacters so the search term is matched literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Translate a filter into a parameterized query.
fn build_query(filter: &BookFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_COLUMNS);
    qb.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(language) = &filter.language {
        qb.push(" AND language = ").push_bind(language.clone());
    }
    if let Some(year) = filter.year {
        qb.push(" AND year = ").push_bind(year);
    }
    if let Some(subject) = &filter.subject {
        qb.push(" AND ")
            .push_bind(subject.clone())
            .push(" = ANY(subjects)");
    }

    qb.push(" ORDER BY uploaded_at DESC, seq ASC");
    qb
}

fn row_to_book(row: &PgRow) -> std::result::Result<Book, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    Ok(Book {
        id: id.to_string(),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        description: row.try_get("description")?,
        language: row.try_get("language")?,
        year: row.try_get("year")?,
        subjects: row.try_get("subjects")?,
        file_url: row.try_get("file_url")?,
        cover_image: row.try_get("cover_image")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, book: NewBook) -> Result<Book> {
        let id = Uuid::now_v7();

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, description, language, year,
                subjects, file_url, cover_image, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.language)
        .bind(book.year)
        .bind(&book.subjects)
        .bind(&book.file_url)
        .bind(&book.cover_image)
        .bind(book.uploaded_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %id, "record inserted");
        Ok(book.into_book(id.to_string()))
    }

    async fn query(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut qb = build_query(filter);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let books = rows
            .iter()
            .map(row_to_book)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(books)
    }

    async fn get(&self, id: &str) -> Result<Option<Book>> {
        let id = parse_id(id)?;

        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_book).transpose()?)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_sql() {
        let qb = build_query(&BookFilter::default());
        assert_eq!(
            qb.sql(),
            format!(
                "{} WHERE TRUE ORDER BY uploaded_at DESC, seq ASC",
                SELECT_COLUMNS
            )
        );
    }

    #[test]
    fn test_full_filter_sql() {
        let filter = BookFilter::default()
            .search("war")
            .language("en")
            .year(2000)
            .subject("history");
        let qb = build_query(&filter);
        assert_eq!(
            qb.sql(),
            format!(
                "{} WHERE TRUE AND (title ILIKE $1 OR author ILIKE $2) AND language = $3 \
                 AND year = $4 AND $5 = ANY(subjects) ORDER BY uploaded_at DESC, seq ASC",
                SELECT_COLUMNS
            )
        );
    }

    #[test]
    fn test_partial_filter_sql() {
        let qb = build_query(&BookFilter::default().year(1999));
        assert!(qb.sql().ends_with(" WHERE TRUE AND year = $1 ORDER BY uploaded_at DESC, seq ASC"));
    }

    #[test]
    fn test_only_canonical_ids_parse() {
        let id = Uuid::now_v7();
        let canonical = id.hyphenated().to_string();
        assert_eq!(parse_id(&canonical).unwrap(), id);

        for other in [
            canonical.to_uppercase(),
            id.simple().to_string(),
            id.urn().to_string(),
            "12345".to_string(),
            String::new(),
        ] {
            assert!(matches!(parse_id(&other), Err(RecordStoreError::InvalidId(i)) if i == other));
        }
    }

    #[tokio::test]
    async fn test_bad_id_is_rejected_before_querying() {
        // lazy pool: nothing listens here, so any query would fail with a
        // connection error rather than InvalidId
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://libris@127.0.0.1:1/libris")
            .unwrap();
        let store = PgRecordStore { pool };

        for id in ["not-an-id", "12345", ""] {
            assert!(matches!(store.get(id).await, Err(RecordStoreError::InvalidId(_))));
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
