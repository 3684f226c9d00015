//! Upload pipeline: validate a submission, store its blobs, persist its record.
//!
//! The pipeline is linear and never retries:
//!
//! ```text
//! Received -> Validated -> BlobsStored -> RecordPersisted -> Done
//!     \___________\______________\______________\________-> Failed
//! ```
//!
//! Validation happens before any side effect. A blob failure stops the pipeline
//! before a record is written, so a record never points at a missing blob. The
//! reverse is tolerated: blobs written before a later failure stay behind and
//! are reported as orphaned in the log.

use std::fmt;

use blob_store::{BlobRef, BlobStore};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::book::{upload_timestamp, Book, NewBook};
use crate::catalog::{CatalogError, StorageError};
use crate::record_store::RecordStore;

/// A binary part of a submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side file name; only its extension is kept.
    pub file_name: String,
    /// Declared content type, if the client sent one.
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declared type, else guessed from the file name.
    pub fn resolved_content_type(&self) -> String {
        match &self.content_type {
            Some(ct) if !ct.is_empty() => ct.clone(),
            _ => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .to_string(),
        }
    }
}

/// Subjects as sent by a client: one comma-separated string, or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectsInput {
    Joined(String),
    List(Vec<String>),
}

impl SubjectsInput {
    /// Trimmed, non-empty subjects in client order.
    pub fn normalize(self) -> Vec<String> {
        let items: Vec<String> = match self {
            SubjectsInput::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            SubjectsInput::List(list) => list,
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Everything a client submitted for a new book, before validation.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub year: Option<String>,
    pub subjects: Option<SubjectsInput>,
    pub book_file: Option<UploadedFile>,
    pub cover_image: Option<UploadedFile>,
}

/// A submission that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub year: Option<i32>,
    pub subjects: Vec<String>,
    pub book_file: UploadedFile,
    pub cover_image: Option<UploadedFile>,
}

impl Submission {
    /// Check required fields and normalize optional ones. No side effects.
    pub fn validate(self) -> Result<ValidatedSubmission, CatalogError> {
        let book_file = self
            .book_file
            .ok_or_else(|| CatalogError::Validation("Book file is required".to_string()))?;
        let title = trimmed(self.title)
            .ok_or_else(|| CatalogError::Validation("Title is required".to_string()))?;
        let author = trimmed(self.author)
            .ok_or_else(|| CatalogError::Validation("Author is required".to_string()))?;

        Ok(ValidatedSubmission {
            title,
            author,
            description: trimmed(self.description),
            language: trimmed(self.language),
            year: trimmed(self.year).and_then(|y| y.parse::<i32>().ok()),
            subjects: self.subjects.map(SubjectsInput::normalize).unwrap_or_default(),
            book_file,
            cover_image: self.cover_image,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Pipeline stages, used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Validated,
    BlobsStored,
    RecordPersisted,
    Done,
    Failed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Received => "received",
            UploadStage::Validated => "validated",
            UploadStage::BlobsStored => "blobs_stored",
            UploadStage::RecordPersisted => "record_persisted",
            UploadStage::Done => "done",
            UploadStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Blobs that were written but are not referenced by any record.
#[derive(Debug, Clone)]
pub struct OrphanedBlob {
    pub references: Vec<String>,
}

impl OrphanedBlob {
    fn report(blobs: &[BlobRef], cause: &dyn fmt::Display) {
        if blobs.is_empty() {
            return;
        }
        let orphan = OrphanedBlob {
            references: blobs.iter().map(|b| b.reference.clone()).collect(),
        };
        warn!(
            orphaned = ?orphan.references,
            error = %cause,
            "upload failed after storing blobs; leaving them unreferenced"
        );
    }
}

/// Runs one submission through the pipeline against the given stores.
pub struct UploadPipeline<'a> {
    blobs: &'a dyn BlobStore,
    records: &'a dyn RecordStore,
    stage: UploadStage,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(blobs: &'a dyn BlobStore, records: &'a dyn RecordStore) -> Self {
        Self {
            blobs,
            records,
            stage: UploadStage::Received,
        }
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    fn advance(&mut self, next: UploadStage) {
        debug!(from = %self.stage, to = %next, "upload stage");
        self.stage = next;
    }

    pub async fn run(&mut self, submission: Submission) -> Result<Book, CatalogError> {
        let result = self.execute(submission).await;
        if result.is_err() {
            self.advance(UploadStage::Failed);
        }
        result
    }

    async fn execute(&mut self, submission: Submission) -> Result<Book, CatalogError> {
        let submission = submission.validate()?;
        self.advance(UploadStage::Validated);

        let mut stored: Vec<BlobRef> = Vec::with_capacity(2);

        let book_file = &submission.book_file;
        let book_blob = self
            .blobs
            .put(
                &book_file.file_name,
                book_file.data.clone(),
                &book_file.resolved_content_type(),
            )
            .await
            .map_err(StorageError::Blob)?;
        stored.push(book_blob.clone());

        let cover_blob = match &submission.cover_image {
            Some(cover) => {
                match self
                    .blobs
                    .put(
                        &cover.file_name,
                        cover.data.clone(),
                        &cover.resolved_content_type(),
                    )
                    .await
                {
                    Ok(blob) => {
                        stored.push(blob.clone());
                        Some(blob)
                    }
                    Err(e) => {
                        OrphanedBlob::report(&stored, &e);
                        return Err(StorageError::Blob(e).into());
                    }
                }
            }
            None => None,
        };
        self.advance(UploadStage::BlobsStored);

        let draft = NewBook {
            title: submission.title,
            author: submission.author,
            description: submission.description,
            language: submission.language,
            year: submission.year,
            subjects: submission.subjects,
            file_url: book_blob.reference,
            cover_image: cover_blob.map(|b| b.reference),
            uploaded_at: upload_timestamp(),
        };

        let book = match self.records.insert(draft).await {
            Ok(book) => book,
            Err(e) => {
                OrphanedBlob::report(&stored, &e);
                return Err(StorageError::Record(e).into());
            }
        };
        self.advance(UploadStage::RecordPersisted);

        info!(
            id = %book.id,
            title = %book.title,
            blobs = self.blobs.kind(),
            records = self.records.kind(),
            "book uploaded"
        );
        self.advance(UploadStage::Done);
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_submission() -> Submission {
        Submission {
            title: Some("  Dune ".to_string()),
            author: Some("Frank Herbert".to_string()),
            description: Some("   ".to_string()),
            language: Some("en".to_string()),
            year: Some("1965".to_string()),
            subjects: Some(SubjectsInput::Joined("scifi, desert ,,politics".to_string())),
            book_file: Some(UploadedFile::new("dune.epub", &b"epub"[..])),
            cover_image: None,
        }
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let valid = complete_submission().validate().unwrap();
        assert_eq!(valid.title, "Dune");
        assert_eq!(valid.description, None);
        assert_eq!(valid.year, Some(1965));
        assert_eq!(valid.subjects, vec!["scifi", "desert", "politics"]);
    }

    #[test]
    fn test_validate_requires_book_file() {
        let submission = Submission {
            book_file: None,
            ..complete_submission()
        };
        let err = submission.validate().unwrap_err();
        assert!(matches!(err, CatalogError::Validation(m) if m == "Book file is required"));
    }

    #[test]
    fn test_validate_requires_title_and_author() {
        let no_title = Submission {
            title: Some("   ".to_string()),
            ..complete_submission()
        };
        assert!(matches!(
            no_title.validate(),
            Err(CatalogError::Validation(_))
        ));

        let no_author = Submission {
            author: None,
            ..complete_submission()
        };
        assert!(matches!(
            no_author.validate(),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_year_becomes_none() {
        let submission = Submission {
            year: Some("MCMLXV".to_string()),
            ..complete_submission()
        };
        assert_eq!(submission.validate().unwrap().year, None);
    }

    #[test]
    fn test_subject_list_is_trimmed_not_split() {
        let subjects = SubjectsInput::List(vec![" a, b ".to_string(), "".to_string(), "c".to_string()]);
        assert_eq!(subjects.normalize(), vec!["a, b", "c"]);
    }

    #[test]
    fn test_content_type_resolution() {
        let declared = UploadedFile::new("x.bin", &b""[..]).with_content_type("application/pdf");
        assert_eq!(declared.resolved_content_type(), "application/pdf");

        let guessed = UploadedFile::new("cover.png", &b""[..]);
        assert_eq!(guessed.resolved_content_type(), "image/png");

        let unknown = UploadedFile::new("blob", &b""[..]);
        assert_eq!(unknown.resolved_content_type(), "application/octet-stream");
    }
}
