use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, Url};

use common::{Book, CatalogError, SubjectsInput, Submission, UploadedFile};

use crate::admin::ADMIN_TOKEN_HEADER;
use crate::http_server::api::auth::RequireAdmin;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::message_response;
use crate::ServiceState;

/// Upload a book. Sent as `multipart/form-data`.
#[derive(Debug, Clone)]
pub struct CreateBookRequest {
    /// Token issued by `/api/login`
    pub admin_token: String,
    pub submission: Submission,
}

/// Multipart field names.
mod fields {
    pub const TITLE: &str = "title";
    pub const AUTHOR: &str = "author";
    pub const DESCRIPTION: &str = "description";
    pub const LANGUAGE: &str = "language";
    pub const YEAR: &str = "year";
    pub const SUBJECTS: &str = "subjects";
    pub const BOOK_FILE: &str = "bookFile";
    pub const COVER_IMAGE: &str = "coverImage";
}

pub async fn handler(
    _admin: RequireAdmin,
    State(state): State<ServiceState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, CreateBookError> {
    let submission = read_submission(multipart).await?;
    let book = state.catalog().create(submission).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Collect the form into a [`Submission`]. Unknown fields are ignored; a
/// repeated `subjects` field is taken as a list, a single one as a
/// comma-separated string.
async fn read_submission(mut multipart: Multipart) -> Result<Submission, CreateBookError> {
    let mut submission = Submission::default();
    let mut subjects: Vec<String> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            fields::TITLE => submission.title = Some(field.text().await?),
            fields::AUTHOR => submission.author = Some(field.text().await?),
            fields::DESCRIPTION => submission.description = Some(field.text().await?),
            fields::LANGUAGE => submission.language = Some(field.text().await?),
            fields::YEAR => submission.year = Some(field.text().await?),
            fields::SUBJECTS => subjects.push(field.text().await?),
            // file fields only count when sent as files
            fields::BOOK_FILE if submission.book_file.is_none() && is_file(&field) => {
                submission.book_file = Some(read_file(field).await?);
            }
            fields::COVER_IMAGE if submission.cover_image.is_none() && is_file(&field) => {
                submission.cover_image = Some(read_file(field).await?);
            }
            other => {
                tracing::debug!(field = other, "ignoring multipart field");
            }
        }
    }

    submission.subjects = match subjects.len() {
        0 => None,
        1 => subjects.pop().map(SubjectsInput::Joined),
        _ => Some(SubjectsInput::List(subjects)),
    };

    Ok(submission)
}

fn is_file(field: &Field<'_>) -> bool {
    field.file_name().is_some()
}

async fn read_file(field: Field<'_>) -> Result<UploadedFile, MultipartError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let data = field.bytes().await?;

    let mut file = UploadedFile::new(file_name, data);
    if let Some(content_type) = content_type {
        file = file.with_content_type(content_type);
    }
    Ok(file)
}

#[derive(Debug, thiserror::Error)]
pub enum CreateBookError {
    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl IntoResponse for CreateBookError {
    fn into_response(self) -> Response {
        match self {
            CreateBookError::Multipart(e) => message_response(e.status(), e.body_text()),
            CreateBookError::Catalog(CatalogError::Validation(msg)) => {
                message_response(StatusCode::BAD_REQUEST, msg)
            }
            CreateBookError::Catalog(e) => {
                tracing::error!("book upload failed: {}", e);
                message_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error during upload",
                )
            }
        }
    }
}

/// Form part for an upload. `Bytes` clones share the payload, so an
/// unparsable content type falls back to a part without one.
fn file_part(file: UploadedFile) -> multipart::Part {
    let UploadedFile {
        file_name,
        content_type,
        data,
    } = file;
    let len = data.len() as u64;
    let part = multipart::Part::stream_with_length(reqwest::Body::from(data.clone()), len)
        .file_name(file_name.clone());
    match content_type {
        Some(content_type) => part.mime_str(&content_type).unwrap_or_else(|_| {
            tracing::warn!(content_type = %content_type, "dropping invalid content type");
            multipart::Part::stream_with_length(reqwest::Body::from(data), len)
                .file_name(file_name)
        }),
        None => part,
    }
}

impl ApiRequest for CreateBookRequest {
    type Response = Book;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut url = base_url.clone();
        url.set_path("/api/books");

        let submission = self.submission;
        let mut form = multipart::Form::new();
        let text_fields = [
            (fields::TITLE, submission.title),
            (fields::AUTHOR, submission.author),
            (fields::DESCRIPTION, submission.description),
            (fields::LANGUAGE, submission.language),
            (fields::YEAR, submission.year),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                form = form.text(name, value);
            }
        }
        match submission.subjects {
            Some(SubjectsInput::Joined(joined)) => form = form.text(fields::SUBJECTS, joined),
            Some(SubjectsInput::List(list)) => {
                for subject in list {
                    form = form.text(fields::SUBJECTS, subject);
                }
            }
            None => {}
        }
        if let Some(file) = submission.book_file {
            form = form.part(fields::BOOK_FILE, file_part(file));
        }
        if let Some(file) = submission.cover_image {
            form = form.part(fields::COVER_IMAGE, file_part(file));
        }

        client
            .post(url)
            .header(ADMIN_TOKEN_HEADER, self.admin_token)
            .multipart(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_opaque() {
        let err = CatalogError::Storage(common::StorageError::Record(
            common::record_store::RecordStoreError::Io(std::io::Error::other(
                "/srv/data/books.json: permission denied",
            )),
        ));
        let response = CreateBookError::Catalog(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let response = CreateBookError::Catalog(CatalogError::Validation(
            "Book file is required".to_string(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_carries_admin_token() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let request = CreateBookRequest {
            admin_token: "secret".to_string(),
            submission: Submission {
                title: Some("Dune".to_string()),
                ..Default::default()
            },
        }
        .build_request(&base, &Client::new())
        .build()
        .unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:5000/api/books");
        assert_eq!(request.headers()[ADMIN_TOKEN_HEADER], "secret");
        let content_type = request.headers()[http::header::CONTENT_TYPE]
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[test]
    fn test_invalid_content_type_still_builds() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let request = CreateBookRequest {
            admin_token: "secret".to_string(),
            submission: Submission {
                title: Some("Dune".to_string()),
                book_file: Some(
                    UploadedFile::new("dune.pdf", &b"%PDF"[..]).with_content_type("not a mime"),
                ),
                ..Default::default()
            },
        }
        .build_request(&base, &Client::new())
        .build()
        .unwrap();

        assert!(request.body().is_some());
    }
}
