#![allow(dead_code)]

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tempfile::TempDir;
use uuid::Uuid;

use common::record_store::{JsonFileStore, PgRecordStore};

pub const TEST_DATABASE_URL_VAR: &str = "LIBRIS_TEST_DATABASE_URL";

/// Scratch database for PostgreSQL-backed tests, if one is configured.
pub fn test_database_url() -> Option<String> {
    std::env::var(TEST_DATABASE_URL_VAR)
        .ok()
        .filter(|url| !url.is_empty())
}

pub async fn json_store() -> (JsonFileStore, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(temp_dir.path().join("data").join("books.json"))
        .await
        .unwrap();
    (store, temp_dir)
}

/// A record store in a fresh schema, so tests never see each other's rows.
pub async fn pg_store(url: &str) -> PgRecordStore {
    let schema = format!("libris_test_{}", Uuid::new_v4().simple());

    let admin = PgPool::connect(url).await.unwrap();
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let options = PgConnectOptions::from_str(url)
        .unwrap()
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .unwrap();

    PgRecordStore::new(pool).await.unwrap()
}
