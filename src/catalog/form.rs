//! Create/edit form state and its synchronous validation.

use super::book::{Book, BookInput};
use crate::error::{AppError, Result};
use std::collections::BTreeMap;

/// Field name to message key.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

/// Minimum ISBN length accepted by the form.
const MIN_ISBN_LEN: usize = 10;

/// Raw form fields, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    /// Title (required).
    pub title: String,
    /// Author (required).
    pub author: String,
    /// Four-digit year, or empty.
    pub published_year: String,
    /// ISBN, or empty.
    pub isbn: String,
    /// Description, or empty.
    pub description: String,
    /// Cover URL, or empty.
    pub image_url: String,
}

impl BookForm {
    /// Prefill from an existing book for editing.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            published_year: if book.published_year == 0 {
                String::new()
            } else {
                book.published_year.to_string()
            },
            isbn: book.isbn.clone().unwrap_or_default(),
            description: book.description.clone().unwrap_or_default(),
            image_url: book.image_url.clone().unwrap_or_default(),
        }
    }

    /// Current validation errors; empty when the form can be submitted.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.insert("title", "books.form.errors.title");
        }
        if self.author.trim().is_empty() {
            errors.insert("author", "books.form.errors.author");
        }

        let year = self.published_year.trim();
        if !year.is_empty() && !(year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())) {
            errors.insert("publishedYear", "books.form.errors.publishedYear");
        }

        let isbn = self.isbn.trim();
        if !isbn.is_empty() && isbn.chars().count() < MIN_ISBN_LEN {
            errors.insert("isbn", "books.form.errors.isbn");
        }

        errors
    }

    /// Build the request payload, refusing while any field is invalid.
    pub fn to_input(&self) -> Result<BookInput> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        Ok(BookInput {
            title: Some(self.title.trim().to_string()),
            author: Some(self.author.trim().to_string()),
            published_year: optional(&self.published_year).and_then(|y| y.parse().ok()),
            isbn: optional(&self.isbn),
            description: optional(&self.description),
            image_url: optional(&self.image_url),
            available: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> BookForm {
        BookForm {
            title: " Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            published_year: "1965".to_string(),
            isbn: String::new(),
            description: "  ".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn empty_form_requires_title_and_author() {
        let errors = BookForm::default().validate();
        assert_eq!(errors.get("title"), Some(&"books.form.errors.title"));
        assert_eq!(errors.get("author"), Some(&"books.form.errors.author"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn year_must_have_four_digits() {
        let mut form = filled();
        form.published_year = "65".to_string();
        assert!(form.validate().contains_key("publishedYear"));
        form.published_year = "19a5".to_string();
        assert!(form.validate().contains_key("publishedYear"));
    }

    #[test]
    fn short_isbn_is_rejected() {
        let mut form = filled();
        form.isbn = "12345".to_string();
        assert_eq!(form.validate().get("isbn"), Some(&"books.form.errors.isbn"));
    }

    #[test]
    fn submission_blocked_while_invalid() {
        let mut form = filled();
        form.author.clear();
        assert!(matches!(form.to_input(), Err(AppError::Validation(e)) if e.contains_key("author")));
    }

    #[test]
    fn input_is_trimmed_and_sparse() {
        let input = filled().to_input().unwrap();
        assert_eq!(input.title.as_deref(), Some("Dune"));
        assert_eq!(input.published_year, Some(1965));
        assert_eq!(input.description, None);
        assert_eq!(input.isbn, None);
    }
}
