//! Client-side pass over a server page: augmentation, filters the backend
//! ignores, and sort keys outside its allow-list.

use super::book::{BackendBook, Book, CatalogMetadata, PagedResult};
use super::extras::augment;
use super::query::{BooksQuery, Filters, SortDirection, SortField, SortKey};
use std::cmp::Ordering;
use std::collections::BTreeSet;

fn compare_field(a: &Book, b: &Book, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Genre => a.genre.label().cmp(b.genre.label()),
        SortField::Publisher => a.publisher.cmp(&b.publisher),
        SortField::Available => a.available.cmp(&b.available),
        SortField::PublishedYear => a.published_year.cmp(&b.published_year),
        SortField::Rating => a.rating.cmp(&b.rating),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

fn compare(a: &Book, b: &Book, keys: &[SortKey]) -> Ordering {
    keys.iter()
        .map(|key| {
            let ord = compare_field(a, b, key.field);
            match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Keep rows matching every selected filter.
pub fn apply_filters(books: Vec<Book>, filters: &Filters) -> Vec<Book> {
    books
        .into_iter()
        .filter(|b| {
            filters.genre.accepts(&b.genre)
                && filters.publisher.accepts(&b.publisher)
                && filters.author.accepts(&b.author)
                && filters.available.accepts(&b.available)
        })
        .collect()
}

/// Stable multi-key sort; ties keep their input order.
pub fn apply_sort(mut books: Vec<Book>, keys: &[SortKey]) -> Vec<Book> {
    if !keys.is_empty() {
        books.sort_by(|a, b| compare(a, b, keys));
    }
    books
}

/// Turn a normalized server page into what the list shows.
///
/// `total` is passed through untouched even when local filters drop rows.
pub fn reconcile(page: PagedResult<BackendBook>, query: &BooksQuery) -> PagedResult<Book> {
    let augmented: Vec<Book> = page.data.into_iter().map(augment).collect();
    let filtered = apply_filters(augmented, &query.filters);
    let data = apply_sort(filtered, &query.client_sort());

    PagedResult {
        data,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }
}

/// Distinct, sorted option lists from a sample of records.
pub fn derive_metadata(books: &[Book]) -> CatalogMetadata {
    let authors: BTreeSet<&str> = books.iter().map(|b| b.author.as_str()).collect();
    let publishers: BTreeSet<&str> = books.iter().map(|b| b.publisher.as_str()).collect();
    let genres: BTreeSet<&str> = books.iter().map(|b| b.genre.label()).collect();

    CatalogMetadata {
        authors: authors.into_iter().map(str::to_string).collect(),
        publishers: publishers.into_iter().map(str::to_string).collect(),
        genres: genres.into_iter().map(str::to_string).collect(),
    }
}
