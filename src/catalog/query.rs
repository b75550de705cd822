//! List query state and its translation to backend parameters.

use super::book::Genre;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page sizes offered by the list view.
pub const PAGE_SIZE_OPTIONS: [u32; 3] = [10, 20, 50];

/// Either "no filter" or one selected value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterValue<T> {
    /// Sentinel meaning the filter is off.
    #[default]
    All,
    /// Keep only rows equal to this value.
    Only(T),
}

impl<T: PartialEq> FilterValue<T> {
    /// Whether `value` passes this filter.
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            FilterValue::All => true,
            FilterValue::Only(selected) => selected == value,
        }
    }

    /// Selected value, if any.
    pub fn selected(&self) -> Option<&T> {
        match self {
            FilterValue::All => None,
            FilterValue::Only(selected) => Some(selected),
        }
    }
}

impl<T> From<Option<T>> for FilterValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::All, FilterValue::Only)
    }
}

/// Filter selection for the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Genre (never sent to the server).
    pub genre: FilterValue<Genre>,
    /// Publisher.
    pub publisher: FilterValue<String>,
    /// Author.
    pub author: FilterValue<String>,
    /// Availability.
    pub available: FilterValue<bool>,
}

/// A change to exactly one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    /// Set the genre filter.
    Genre(FilterValue<Genre>),
    /// Set the publisher filter.
    Publisher(FilterValue<String>),
    /// Set the author filter.
    Author(FilterValue<String>),
    /// Set the availability filter.
    Available(FilterValue<bool>),
}

/// Sortable book field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Title.
    Title,
    /// Author.
    Author,
    /// Genre.
    Genre,
    /// Publisher.
    Publisher,
    /// Availability.
    Available,
    /// Publication year.
    PublishedYear,
    /// Rating.
    Rating,
    /// Creation timestamp.
    CreatedAt,
}

impl SortField {
    /// Every sortable field.
    pub const ALL: [SortField; 8] = [
        SortField::Title,
        SortField::Author,
        SortField::Genre,
        SortField::Publisher,
        SortField::Available,
        SortField::PublishedYear,
        SortField::Rating,
        SortField::CreatedAt,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Genre => "genre",
            SortField::Publisher => "publisher",
            SortField::Available => "available",
            SortField::PublishedYear => "publishedYear",
            SortField::Rating => "rating",
            SortField::CreatedAt => "createdAt",
        }
    }

    /// Whether the backend can order by this field.
    pub fn is_server_sortable(&self) -> bool {
        matches!(
            self,
            SortField::Title | SortField::Author | SortField::PublishedYear | SortField::CreatedAt
        )
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidFormat(format!("Unknown sort field: {}", s)))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// The other direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::InvalidFormat(format!(
                "Unknown sort direction: {}",
                other
            ))),
        }
    }
}

/// One `(field, direction)` pair of a multi-key sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Field to order by.
    pub field: SortField,
    /// Direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Create a sort key.
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction.as_str())
    }
}

/// Parses `field` or `field:direction`.
impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (s, SortDirection::default()),
        };
        Ok(SortKey::new(field.parse()?, direction))
    }
}

/// The list query: single source of truth for what to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooksQuery {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page, one of [`PAGE_SIZE_OPTIONS`].
    pub page_size: u32,
    /// Free-text search.
    pub search: String,
    /// Filter selection.
    pub filters: Filters,
    /// Multi-key sort, highest priority first. A field appears at most once.
    pub sort: Vec<SortKey>,
}

impl Default for BooksQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PAGE_SIZE_OPTIONS[0],
            search: String::new(),
            filters: Filters::default(),
            sort: vec![SortKey::new(SortField::CreatedAt, SortDirection::Desc)],
        }
    }
}

impl BooksQuery {
    /// Set the search text. Resets the page.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.page = 1;
    }

    /// Jump to a page. Page 0 is rejected.
    pub fn set_page(&mut self, page: u32) -> Result<()> {
        if page == 0 {
            return Err(AppError::InvalidFormat("Page numbers start at 1".to_string()));
        }
        self.page = page;
        Ok(())
    }

    /// Change the page size. Resets the page.
    pub fn set_page_size(&mut self, page_size: u32) -> Result<()> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(AppError::InvalidFormat(format!(
                "Page size must be one of {:?}",
                PAGE_SIZE_OPTIONS
            )));
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    /// Replace one filter. Resets the page.
    pub fn set_filter(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Genre(v) => self.filters.genre = v,
            FilterUpdate::Publisher(v) => self.filters.publisher = v,
            FilterUpdate::Author(v) => self.filters.author = v,
            FilterUpdate::Available(v) => self.filters.available = v,
        }
        self.page = 1;
    }

    /// Append `field` ascending unless already sorted on. Resets the page.
    pub fn add_sort(&mut self, field: SortField) {
        self.add_sort_with(field, SortDirection::default());
    }

    /// Append `field` with an explicit direction unless already sorted on.
    /// Resets the page.
    pub fn add_sort_with(&mut self, field: SortField, direction: SortDirection) {
        if !self.has_sort(field) {
            self.sort.push(SortKey::new(field, direction));
        }
        self.page = 1;
    }

    /// Drop `field` from the sort. Resets the page.
    pub fn remove_sort(&mut self, field: SortField) {
        self.sort.retain(|k| k.field != field);
        self.page = 1;
    }

    /// Flip the direction of `field`. Resets the page.
    pub fn toggle_sort_direction(&mut self, field: SortField) {
        for key in self.sort.iter_mut().filter(|k| k.field == field) {
            key.direction = key.direction.flipped();
        }
        self.page = 1;
    }

    /// Check a query built by hand: page from 1, a listed page size, and
    /// each sort field at most once.
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(AppError::InvalidFormat("Page numbers start at 1".to_string()));
        }
        if !PAGE_SIZE_OPTIONS.contains(&self.page_size) {
            return Err(AppError::InvalidFormat(format!(
                "Page size must be one of {:?}",
                PAGE_SIZE_OPTIONS
            )));
        }
        for (i, key) in self.sort.iter().enumerate() {
            if self.sort[..i].iter().any(|k| k.field == key.field) {
                return Err(AppError::InvalidFormat(format!(
                    "Sort field {} appears more than once",
                    key.field
                )));
            }
        }
        Ok(())
    }

    /// Whether `field` is part of the sort.
    pub fn has_sort(&self, field: SortField) -> bool {
        self.sort.iter().any(|k| k.field == field)
    }

    /// Same query with a different effective search.
    pub fn with_search(&self, search: &str) -> Self {
        Self {
            search: search.to_string(),
            ..self.clone()
        }
    }

    /// Sort keys the backend cannot apply.
    pub fn client_sort(&self) -> Vec<SortKey> {
        self.sort
            .iter()
            .copied()
            .filter(|k| !k.field.is_server_sortable())
            .collect()
    }

    /// Parameters the backend understands for this query.
    pub fn server_params(&self) -> ListParams {
        let search = self.search.trim();
        ListParams {
            page: self.page,
            page_size: self.page_size,
            search: (!search.is_empty()).then(|| search.to_string()),
            author: self.filters.author.selected().cloned(),
            publisher: self.filters.publisher.selected().cloned(),
            available: self.filters.available.selected().copied(),
            sort: self
                .sort
                .iter()
                .copied()
                .filter(|k| k.field.is_server_sortable())
                .collect(),
        }
    }
}

/// Query parameters for `GET /books` and `GET /books/export`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// 1-based page.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Trimmed, non-empty search.
    pub search: Option<String>,
    /// Author filter.
    pub author: Option<String>,
    /// Publisher filter.
    pub publisher: Option<String>,
    /// Availability filter.
    pub available: Option<bool>,
    /// Server-sortable keys only.
    pub sort: Vec<SortKey>,
}

impl ListParams {
    /// Unfiltered first page of `page_size` rows.
    pub fn sample(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            search: None,
            author: None,
            publisher: None,
            available: None,
            sort: Vec::new(),
        }
    }

    /// `field:dir` tokens joined by commas, if any.
    pub fn sort_param(&self) -> Option<String> {
        if self.sort.is_empty() {
            return None;
        }
        Some(
            self.sort
                .iter()
                .map(SortKey::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Pairs for the list endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(author) = &self.author {
            pairs.push(("author", author.clone()));
        }
        if let Some(publisher) = &self.publisher {
            pairs.push(("publisher", publisher.clone()));
        }
        if let Some(available) = self.available {
            pairs.push(("available", available.to_string()));
        }
        if let Some(sort) = self.sort_param() {
            pairs.push(("sort", sort));
        }
        pairs
    }

    /// Pairs for the export endpoint (search and sort only).
    pub fn export_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(sort) = self.sort_param() {
            pairs.push(("sort", sort));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_page(page: u32) -> BooksQuery {
        let mut q = BooksQuery::default();
        q.set_page(page).unwrap();
        q
    }

    #[test]
    fn mutations_reset_page() {
        let mut q = on_page(4);
        q.set_filter(FilterUpdate::Genre(FilterValue::Only(Genre::Art)));
        assert_eq!(q.page, 1);

        q.set_page(3).unwrap();
        q.add_sort(SortField::Rating);
        assert_eq!(q.page, 1);

        q.set_page(3).unwrap();
        q.set_page_size(20).unwrap();
        assert_eq!(q.page, 1);

        q.set_page(3).unwrap();
        q.set_search("rust");
        assert_eq!(q.page, 1);

        q.set_page(3).unwrap();
        q.toggle_sort_direction(SortField::Rating);
        assert_eq!(q.page, 1);

        q.set_page(3).unwrap();
        q.remove_sort(SortField::Rating);
        assert_eq!(q.page, 1);
    }

    #[test]
    fn set_page_keeps_other_fields() {
        let mut q = BooksQuery::default();
        q.set_search("x");
        let before = q.clone();
        q.set_page(7).unwrap();
        assert_eq!(q.page, 7);
        assert_eq!(q.search, before.search);
        assert_eq!(q.sort, before.sort);
        assert!(q.set_page(0).is_err());
    }

    #[test]
    fn page_size_must_be_offered() {
        let mut q = on_page(2);
        assert!(q.set_page_size(15).is_err());
        assert_eq!(q.page_size, 10);
        assert_eq!(q.page, 2);
    }

    #[test]
    fn add_sort_is_idempotent() {
        let mut q = BooksQuery::default();
        q.add_sort_with(SortField::Rating, SortDirection::Desc);
        let sort = q.sort.clone();
        q.add_sort(SortField::Rating);
        assert_eq!(q.sort, sort);
        q.add_sort(SortField::CreatedAt);
        assert_eq!(q.sort, sort);
    }

    #[test]
    fn toggle_twice_restores_direction() {
        let mut q = BooksQuery::default();
        let original = q.sort.clone();
        q.toggle_sort_direction(SortField::CreatedAt);
        assert_eq!(q.sort[0].direction, SortDirection::Asc);
        q.toggle_sort_direction(SortField::CreatedAt);
        assert_eq!(q.sort, original);
    }

    #[test]
    fn server_params_follow_allow_lists() {
        let mut q = BooksQuery::default();
        q.set_search("  clean  ");
        q.set_filter(FilterUpdate::Genre(FilterValue::Only(Genre::Science)));
        q.set_filter(FilterUpdate::Author(FilterValue::Only("Uncle Bob".to_string())));
        q.set_filter(FilterUpdate::Available(FilterValue::Only(false)));
        q.add_sort_with(SortField::Rating, SortDirection::Desc);
        q.add_sort(SortField::Title);

        let params = q.server_params();
        assert_eq!(params.search.as_deref(), Some("clean"));
        assert_eq!(params.author.as_deref(), Some("Uncle Bob"));
        assert_eq!(params.publisher, None);
        assert_eq!(params.available, Some(false));
        assert_eq!(params.sort_param().as_deref(), Some("createdAt:desc,title:asc"));

        let pairs = params.query_pairs();
        assert!(pairs.iter().all(|(k, _)| *k != "genre"));
        assert!(pairs.contains(&("available", "false".to_string())));

        assert_eq!(
            q.client_sort(),
            vec![SortKey::new(SortField::Rating, SortDirection::Desc)]
        );
    }

    #[test]
    fn blank_search_is_not_sent() {
        let mut q = BooksQuery::default();
        q.set_search("   ");
        assert_eq!(q.server_params().search, None);
        assert!(q.server_params().export_pairs().iter().all(|(k, _)| *k != "search"));
    }

    #[test]
    fn sort_key_parsing() {
        let key: SortKey = "publishedYear:desc".parse().unwrap();
        assert_eq!(key, SortKey::new(SortField::PublishedYear, SortDirection::Desc));
        let key: SortKey = "rating".parse().unwrap();
        assert_eq!(key.direction, SortDirection::Asc);
        assert!("pages:asc".parse::<SortKey>().is_err());
        assert!("title:up".parse::<SortKey>().is_err());
    }

    #[test]
    fn hand_built_queries_are_checked() {
        assert!(BooksQuery::default().validate().is_ok());

        let mut q = BooksQuery::default();
        q.sort.push(SortKey::new(SortField::CreatedAt, SortDirection::Asc));
        assert!(q.validate().is_err());

        let mut q = BooksQuery::default();
        q.page_size = 15;
        assert!(q.validate().is_err());

        let mut q = BooksQuery::default();
        q.page = 0;
        assert!(q.validate().is_err());
    }
}
