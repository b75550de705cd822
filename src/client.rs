//! REST backend access.

mod http;
mod payload;

pub use http::ApiClient;
pub use payload::{LoginResponse, RegisterInput, RemoteUser};

use crate::catalog::{BackendBook, Book, CatalogMetadata, ListParams, PagedResult};
use crate::catalog::{augment, derive_metadata};
use crate::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Anything that can serve pages of backend book records.
///
/// Implementations return [`crate::AppError::Cancelled`] once `cancel` fires
/// and must never hand back a page for a cancelled request.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Fetch one page, already normalized to the envelope shape.
    async fn fetch_page(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<BackendBook>>;

    /// Derive filter option lists from a first page of `sample_size` rows.
    async fn load_metadata(
        &self,
        sample_size: u32,
        cancel: &CancellationToken,
    ) -> Result<CatalogMetadata> {
        let page = self
            .fetch_page(&ListParams::sample(sample_size), cancel)
            .await?;
        let books: Vec<Book> = page.data.into_iter().map(augment).collect();
        Ok(derive_metadata(&books))
    }
}
