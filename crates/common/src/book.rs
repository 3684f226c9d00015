use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A persisted catalog entry describing one uploaded book.
///
/// Records are immutable once stored. Field names follow the JSON the HTTP API
/// and the embedded data file use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Server-assigned, never reused. Older data files call this `_id`.
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub subjects: Vec<String>,
    pub file_url: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// A book record that has not been persisted yet (no id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub year: Option<i32>,
    pub subjects: Vec<String>,
    pub file_url: String,
    pub cover_image: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl NewBook {
    /// Attach the id the record store assigned.
    pub fn into_book(self, id: String) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            description: self.description,
            language: self.language,
            year: self.year,
            subjects: self.subjects,
            file_url: self.file_url,
            cover_image: self.cover_image,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Current time truncated to milliseconds, the precision every backend keeps.
pub fn upload_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
