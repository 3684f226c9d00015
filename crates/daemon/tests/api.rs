//! End-to-end tests against a real server in embedded mode.

use std::net::SocketAddr;

use common::{FilterParams, SubjectsInput, Submission, UploadedFile};
use libris_daemon::admin::ADMIN_TOKEN_HEADER;
use libris_daemon::http_server::api::client::ApiClient;
use libris_daemon::http_server::health::liveness::LivezRequest;
use libris_daemon::http_server::health::readiness::ReadyzRequest;
use libris_daemon::{start_service, ServiceConfig, ShutdownHandle};
use reqwest::StatusCode;
use tempfile::TempDir;

const PASSWORD: &str = "correct horse";

struct TestServer {
    client: ApiClient,
    addr: SocketAddr,
    handle: ShutdownHandle,
    data_dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            admin_password: PASSWORD.to_string(),
            max_upload_bytes: 1024 * 1024,
            ..ServiceConfig::embedded(data_dir.path(), "127.0.0.1:0".parse().unwrap())
        };

        let (addr, handle) = start_service(&config).await.unwrap();
        let client = ApiClient::parse(&format!("http://{}", addr)).unwrap();

        Self {
            client,
            addr,
            handle,
            data_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn token(&self) -> String {
        self.client.login(PASSWORD).await.unwrap()
    }
}

fn submission(title: &str, language: &str, year: &str) -> Submission {
    Submission {
        title: Some(title.to_string()),
        author: Some("Test Author".to_string()),
        description: Some("A test book".to_string()),
        language: Some(language.to_string()),
        year: Some(year.to_string()),
        subjects: Some(SubjectsInput::Joined("history, war".to_string())),
        book_file: Some(
            UploadedFile::new(format!("{}.pdf", title), &b"%PDF-1.4 test"[..])
                .with_content_type("application/pdf"),
        ),
        cover_image: None,
    }
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::start().await;

    let livez = server.client.call(LivezRequest {}).await.unwrap();
    assert_eq!(livez.status, "ok");

    let readyz = server.client.call(ReadyzRequest {}).await.unwrap();
    assert_eq!(readyz.status, "ok");
    assert_eq!(readyz.mode, "embedded");

    server.handle.shutdown().await;
}

#[tokio::test]
async fn test_login() {
    let server = TestServer::start().await;

    let token = server.token().await;
    assert!(!token.is_empty());

    let err = server.client.login("wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    server.handle.shutdown().await;
}

#[tokio::test]
async fn test_upload_requires_admin_token() {
    let server = TestServer::start().await;

    let err = server
        .client
        .create_book("not-the-token", submission("Nope", "en", "2000"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

    // without the header at all
    let response = reqwest::Client::new()
        .post(server.url("/api/books"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unauthorized. Admin access required.");

    let books = server.client.list_books(FilterParams::default()).await.unwrap();
    assert!(books.is_empty());

    server.handle.shutdown().await;
}

#[tokio::test]
async fn test_upload_and_download() {
    let server = TestServer::start().await;
    let token = server.token().await;

    let mut upload = submission("Dune", "en", "1965");
    upload.cover_image = Some(UploadedFile::new("cover.png", &b"png-bytes"[..]));
    let book = server.client.create_book(&token, upload).await.unwrap();

    assert!(!book.id.is_empty());
    assert_eq!(book.title, "Dune");
    assert_eq!(book.year, Some(1965));
    assert_eq!(book.subjects, vec!["history", "war"]);
    assert!(book.file_url.starts_with("/uploads/"));
    assert!(book.file_url.ends_with(".pdf"));

    let download = reqwest::get(server.url(&book.file_url)).await.unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.bytes().await.unwrap().as_ref(), b"%PDF-1.4 test");

    let cover = book.cover_image.clone().unwrap();
    let download = reqwest::get(server.url(&cover)).await.unwrap();
    assert_eq!(download.bytes().await.unwrap().as_ref(), b"png-bytes");

    // persisted where the embedded layout says
    assert!(server
        .data_dir
        .path()
        .join("data")
        .join("books.json")
        .is_file());

    let fetched = server.client.get_book(&book.id).await.unwrap();
    assert_eq!(fetched, book);

    server.handle.shutdown().await;
}

#[tokio::test]
async fn test_upload_without_book_file_is_rejected() {
    let server = TestServer::start().await;
    let token = server.token().await;

    let err = server
        .client
        .create_book(
            &token,
            Submission {
                book_file: None,
                ..submission("No File", "en", "2000")
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let books = server.client.list_books(FilterParams::default()).await.unwrap();
    assert!(books.is_empty());
    let uploads = std::fs::read_dir(server.data_dir.path().join("uploads"))
        .unwrap()
        .count();
    assert_eq!(uploads, 0);

    server.handle.shutdown().await;
}

#[tokio::test]
async fn test_book_file_sent_as_text_is_rejected() {
    let server = TestServer::start().await;
    let token = server.token().await;

    let form = reqwest::multipart::Form::new()
        .text("title", "Plain")
        .text("author", "Text")
        .text("bookFile", "not really a file");
    let response = reqwest::Client::new()
        .post(server.url("/api/books"))
        .header(ADMIN_TOKEN_HEADER, token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Book file is required");

    let books = server.client.list_books(FilterParams::default()).await.unwrap();
    assert!(books.is_empty());

    server.handle.shutdown().await;
}

#[tokio::test]
async fn test_filtered_listing() {
    let server = TestServer::start().await;
    let token = server.token().await;

    for (title, language, year) in [("A", "en", "2000"), ("B", "en", "2010"), ("C", "fr", "2000")] {
        server
            .client
            .create_book(&token, submission(title, language, year))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let all = server.client.list_books(FilterParams::default()).await.unwrap();
    let titles: Vec<_> = all.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "B", "A"]);

    let en_2000 = server
        .client
        .list_books(FilterParams {
            language: Some("en".to_string()),
            year: Some("2000".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(en_2000.len(), 1);
    assert_eq!(en_2000[0].title, "A");

    // empty params are ignored
    let response = reqwest::get(server.url("/api/books?search=&language=&year=&subject="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let books: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(books.len(), 3);

    // a year that is not a number matches nothing
    let response = reqwest::get(server.url("/api/books?year=recent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let books: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(books.is_empty());

    server.handle.shutdown().await;
}

#[tokio::test]
async fn test_unknown_book_is_not_found() {
    let server = TestServer::start().await;

    let err = server.client.get_book("does-not-exist").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    let response = reqwest::get(server.url("/api/books/12345")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Book not found");

    server.handle.shutdown().await;
}
