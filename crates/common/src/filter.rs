//! Sparse listing filters.

use serde::{Deserialize, Serialize};

use crate::book::Book;

/// Raw listing query, as it arrives from a query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("year must be an integer, got {0:?}")]
    InvalidYear(String),
}

/// Predicates applied to a listing. Every field that is set must hold (AND);
/// unset fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFilter {
    /// Case-insensitive substring matched against title OR author.
    pub search: Option<String>,
    /// Exact language match.
    pub language: Option<String>,
    /// Exact publication year.
    pub year: Option<i32>,
    /// Exact membership in the book's subjects.
    pub subject: Option<String>,
}

impl BookFilter {
    /// Build a filter from query parameters. Empty values count as absent.
    pub fn from_params(params: FilterParams) -> Result<Self, FilterError> {
        let year = match non_empty(params.year) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| FilterError::InvalidYear(raw))?,
            ),
            None => None,
        };

        Ok(Self {
            search: non_empty(params.search),
            language: non_empty(params.language),
            year,
            subject: non_empty(params.subject),
        })
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.language.is_none()
            && self.year.is_none()
            && self.subject.is_none()
    }

    /// In-memory evaluation of the filter.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !book.title.to_lowercase().contains(&needle)
                && !book.author.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if book.language.as_deref() != Some(language.as_str()) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if book.year != Some(year) {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if !book.subjects.iter().any(|s| s == subject) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
