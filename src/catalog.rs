pub mod book;
mod extras;
pub mod form;
pub mod query;
mod reconcile;

pub use book::{BackendBook, Book, BookInput, CatalogMetadata, Genre, PagedResult};
pub use extras::{BookExtras, augment, lookup_extras};
pub use form::{BookForm, FieldErrors};
pub use query::{
    BooksQuery, FilterUpdate, FilterValue, Filters, ListParams, PAGE_SIZE_OPTIONS, SortDirection,
    SortField, SortKey,
};
pub use reconcile::{apply_filters, apply_sort, derive_metadata, reconcile};
