//! shelfdesk: admin console client for a REST book catalog.
//!
//! The crate talks to a catalog backend over HTTP and keeps the state of a
//! filterable, sortable, paginated book list in sync with it. Rendering is
//! left to the caller, which subscribes to a reactive view.
//!
//! # Features
//!
//! - Debounced search and cancel-then-fetch list queries
//! - Server-side filters and sort where the backend supports them, a
//!   client-side pass for the rest
//! - Local metadata (genre, publisher, availability, rating) merged into
//!   backend records
//! - Login with durable or per-process sessions, registration
//! - Book create/edit with form validation, CSV export

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and session state.
pub mod auth;
/// Book models, query state and client-side reconciliation.
pub mod catalog;
/// REST client.
pub mod client;
/// Configuration and CLI.
pub mod config;
/// Book list controller.
pub mod controller;
/// Error types.
pub mod error;
/// Session persistence.
pub mod session;


pub use auth::AuthService;
pub use client::{ApiClient, BookSource};
pub use config::{Cli, Command, Config};
pub use controller::{BooksController, ControllerOptions, ListView};
pub use error::{AppError, Result};
