//! Local metadata the backend does not store.
//!
//! Genre, publisher, availability and rating are looked up by ISBN first,
//! then by exact title, then fall back to fixed defaults.

use super::book::{BackendBook, Book, Genre, MAX_RATING};

/// Metadata merged into every fetched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookExtras {
    /// Genre.
    pub genre: Genre,
    /// Publisher name.
    pub publisher: &'static str,
    /// Availability.
    pub available: bool,
    /// Rating in `0..=5`.
    pub rating: u8,
}

impl Default for BookExtras {
    fn default() -> Self {
        Self {
            genre: Genre::Technology,
            publisher: "Editorial",
            available: true,
            rating: 4,
        }
    }
}

const fn tech(publisher: &'static str, available: bool, rating: u8) -> BookExtras {
    BookExtras {
        genre: Genre::Technology,
        publisher,
        available,
        rating,
    }
}

fn by_isbn(isbn: &str) -> Option<BookExtras> {
    let extras = match isbn {
        // Clean Code
        "9780132350884" => tech("Prentice Hall", true, 5),
        // The Pragmatic Programmer
        "9780201616224" => tech("Addison-Wesley", true, 5),
        // Refactoring, 1st and 2nd editions
        "9780201485677" | "9780134757599" => tech("Addison-Wesley", true, 5),
        // Design Patterns
        "9780201633610" => tech("Addison-Wesley", true, 5),
        // Domain-Driven Design
        "9780321125217" => tech("Addison-Wesley", true, 5),
        // Clean Architecture
        "9780134494166" => tech("Pearson", true, 4),
        // Introduction to Algorithms
        "9780262033848" => tech("MIT Press", false, 5),
        // You Don't Know JS
        "9781491904244" | "9781491904152" => tech("O'Reilly Media", true, 4),
        _ => return None,
    };
    Some(extras)
}

fn by_title(title: &str) -> Option<BookExtras> {
    match title {
        "Clean Code" => Some(tech("Prentice Hall", true, 5)),
        _ => None,
    }
}

/// Resolve extras for a record: ISBN, then title, then defaults.
pub fn lookup_extras(isbn: Option<&str>, title: &str) -> BookExtras {
    isbn.and_then(by_isbn)
        .or_else(|| by_title(title))
        .unwrap_or_default()
}

/// Merge local metadata into a backend record.
///
/// A boolean `available` coming from the backend wins over the table.
pub fn augment(book: BackendBook) -> Book {
    let extras = lookup_extras(book.isbn.as_deref(), &book.title);

    Book {
        available: book.available.unwrap_or(extras.available),
        published_year: book.published_year.unwrap_or(0),
        genre: extras.genre,
        publisher: extras.publisher.to_string(),
        rating: extras.rating.min(MAX_RATING),
        id: book.id,
        title: book.title,
        author: book.author,
        isbn: book.isbn,
        description: book.description,
        image_url: book.image_url,
        created_at: book.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn backend(title: &str, isbn: Option<&str>) -> BackendBook {
        BackendBook {
            id: "b-1".to_string(),
            title: title.to_string(),
            author: "Someone".to_string(),
            published_year: None,
            isbn: isbn.map(str::to_string),
            description: None,
            image_url: None,
            available: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn isbn_match_wins() {
        let book = augment(backend("Anything", Some("9780262033848")));
        assert_eq!(book.genre, Genre::Technology);
        assert_eq!(book.publisher, "MIT Press");
        assert!(!book.available);
        assert_eq!(book.rating, 5);
    }

    #[test]
    fn title_match_when_isbn_unknown() {
        let book = augment(backend("Clean Code", Some("0000000000")));
        assert_eq!(book.publisher, "Prentice Hall");
        assert_eq!(book.rating, 5);
    }

    #[test]
    fn defaults_when_nothing_matches() {
        let book = augment(backend("Unknown Title", None));
        assert_eq!(book.genre, Genre::Technology);
        assert_eq!(book.publisher, "Editorial");
        assert!(book.available);
        assert_eq!(book.rating, 4);
        assert_eq!(book.published_year, 0);
    }

    #[test]
    fn backend_availability_overrides_table() {
        let mut raw = backend("Anything", Some("9780262033848"));
        raw.available = Some(true);
        assert!(augment(raw).available);
    }

    #[test]
    fn augmentation_is_deterministic() {
        let raw = backend("Clean Code", None);
        assert_eq!(augment(raw.clone()), augment(raw));
    }
}
