//! Book models, on the wire and after augmentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of the rating scale.
pub const MAX_RATING: u8 = 5;

/// Catalog genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    /// Fiction.
    #[serde(rename = "Ficción")]
    Fiction,
    /// Non-fiction.
    #[serde(rename = "No Ficción")]
    NonFiction,
    /// Science.
    #[serde(rename = "Ciencia")]
    Science,
    /// History.
    #[serde(rename = "Historia")]
    History,
    /// Technology.
    #[serde(rename = "Tecnología")]
    Technology,
    /// Art.
    #[serde(rename = "Arte")]
    Art,
}

impl Genre {
    /// Every genre, in declaration order.
    pub const ALL: [Genre; 6] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Science,
        Genre::History,
        Genre::Technology,
        Genre::Art,
    ];

    /// Label used by the backend and the option lists.
    pub fn label(&self) -> &'static str {
        match self {
            Genre::Fiction => "Ficción",
            Genre::NonFiction => "No Ficción",
            Genre::Science => "Ciencia",
            Genre::History => "Historia",
            Genre::Technology => "Tecnología",
            Genre::Art => "Arte",
        }
    }

    /// Parse a label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Book record as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendBook {
    /// Backend identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Publication year.
    #[serde(default)]
    pub published_year: Option<i32>,
    /// ISBN.
    #[serde(default)]
    pub isbn: Option<String>,
    /// Description or summary.
    #[serde(default)]
    pub description: Option<String>,
    /// Cover URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Availability, when the backend tracks it.
    #[serde(default)]
    pub available: Option<bool>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Book as shown in the console, after local metadata has been merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Backend identifier.
    pub id: String,

    /// Title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// ISBN.
    pub isbn: Option<String>,

    /// Description or summary.
    pub description: Option<String>,

    /// Cover URL.
    pub image_url: Option<String>,

    /// Genre (local metadata).
    pub genre: Genre,

    /// Publisher (local metadata).
    pub publisher: String,

    /// Whether the book can be lent.
    pub available: bool,

    /// Publication year, 0 when unknown.
    pub published_year: i32,

    /// Rating in `0..=5` (local metadata).
    pub rating: u8,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /books` and `PATCH /books/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publication year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    /// ISBN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Cover URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Availability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl BookInput {
    /// Patch that only flips availability.
    pub fn availability(available: bool) -> Self {
        Self {
            available: Some(available),
            ..Default::default()
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    /// Rows for this page.
    pub data: Vec<T>,
    /// Server-side total of the server-filtered set.
    pub total: u64,
    /// Page echoed by the server.
    pub page: u32,
    /// Page size echoed by the server.
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    /// Empty page.
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page,
            page_size,
        }
    }

    /// Number of pages implied by `total`, never less than one.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.page_size)).max(1)
    }
}

/// Option lists for the filter selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Distinct authors, sorted.
    pub authors: Vec<String>,
    /// Distinct publishers, sorted.
    pub publishers: Vec<String>,
    /// Distinct genre labels, sorted.
    pub genres: Vec<String>,
}
