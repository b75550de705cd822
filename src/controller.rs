//! Book list controller.
//!
//! Owns the [`BooksQuery`], debounces the search text, and keeps exactly one
//! fetch authoritative at a time: every dispatch cancels the previous
//! request's token, and a response is only published if its token is still
//! live when it settles. Both steps run under the same lock, so a stale page
//! can never overwrite a newer one.

use crate::catalog::{
    Book, BooksQuery, CatalogMetadata, FilterUpdate, PagedResult, SortDirection, SortField,
    reconcile,
};
use crate::client::BookSource;
use crate::config::ListConfig;
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Controller tuning.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Idle gap before typed search text takes effect.
    pub debounce: Duration,
    /// Initial page size.
    pub page_size: u32,
    /// Rows requested to derive filter option lists.
    pub metadata_sample_size: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(350),
            page_size: 10,
            metadata_sample_size: 200,
        }
    }
}

impl From<&ListConfig> for ControllerOptions {
    fn from(config: &ListConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.search_debounce_ms),
            page_size: config.page_size,
            metadata_sample_size: config.metadata_sample_size,
        }
    }
}

/// What the list view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    /// A fetch is outstanding.
    pub loading: bool,
    /// Message key of the last failed fetch.
    pub error: Option<&'static str>,
    /// Last successfully fetched page.
    pub result: PagedResult<Book>,
    /// Filter option lists.
    pub metadata: CatalogMetadata,
}

struct Shared {
    query: BooksQuery,
    effective_search: String,
    search_rev: u64,
    dispatched: Option<BooksQuery>,
    inflight: Option<CancellationToken>,
    debounce: Option<JoinHandle<()>>,
    closed: bool,
}

struct Inner {
    source: Arc<dyn BookSource>,
    options: ControllerOptions,
    shared: Mutex<Shared>,
    view: watch::Sender<ListView>,
    root: CancellationToken,
}

impl Inner {
    fn effective(shared: &Shared) -> BooksQuery {
        shared.query.with_search(&shared.effective_search)
    }

    fn dispatch_if_changed(self: &Arc<Self>, shared: &mut Shared) {
        let effective = Self::effective(shared);
        if shared.dispatched.as_ref() != Some(&effective) {
            self.dispatch(shared, effective);
        }
    }

    fn dispatch(self: &Arc<Self>, shared: &mut Shared, query: BooksQuery) {
        if shared.closed {
            return;
        }

        if let Some(previous) = shared.inflight.take() {
            previous.cancel();
            tracing::debug!("Cancelled superseded book fetch");
        }

        let token = self.root.child_token();
        shared.inflight = Some(token.clone());
        shared.dispatched = Some(query.clone());
        self.view.send_modify(|v| {
            v.loading = true;
            v.error = None;
        });

        tracing::debug!(page = query.page, page_size = query.page_size, search = %query.search, "Dispatching book fetch");

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let params = query.server_params();
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(AppError::Cancelled),
                res = inner.source.fetch_page(&params, &token) => res,
            };
            inner.settle(&token, &query, outcome);
        });
    }

    fn settle(
        &self,
        token: &CancellationToken,
        query: &BooksQuery,
        outcome: Result<PagedResult<crate::catalog::BackendBook>>,
    ) {
        let mut shared = self.shared.lock();

        // Cancelled tokens belong to superseded fetches or a closed controller.
        if token.is_cancelled() {
            tracing::debug!("Discarding superseded book response");
            return;
        }
        shared.inflight = None;

        match outcome {
            Ok(page) => {
                let result = reconcile(page, query);
                tracing::debug!(rows = result.data.len(), total = result.total, "Book page loaded");
                self.view.send_modify(|v| {
                    v.loading = false;
                    v.error = None;
                    v.result = result;
                });
            }
            Err(e) if e.is_cancelled() => {
                self.view.send_modify(|v| v.loading = false);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load books");
                let key = e.message_key();
                self.view.send_modify(|v| {
                    v.loading = false;
                    v.error = Some(key);
                });
            }
        }
    }

    fn load_metadata(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        let token = self.root.child_token();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(AppError::Cancelled),
                res = inner.source.load_metadata(inner.options.metadata_sample_size, &token) => res,
            };

            match outcome {
                Ok(metadata) if !token.is_cancelled() => {
                    tracing::debug!(
                        authors = metadata.authors.len(),
                        publishers = metadata.publishers.len(),
                        genres = metadata.genres.len(),
                        "Catalog metadata loaded"
                    );
                    inner.view.send_modify(|v| v.metadata = metadata);
                }
                Ok(_) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::warn!(error = %e, "Failed to load catalog metadata"),
            }
        });
    }
}

/// Query-state controller for the book list.
///
/// Must be created inside a tokio runtime. Dropping it cancels everything
/// still in flight.
pub struct BooksController {
    inner: Arc<Inner>,
}

impl BooksController {
    /// Create the controller with the default query, start the metadata
    /// load and the first fetch.
    pub fn new(source: Arc<dyn BookSource>, options: ControllerOptions) -> Self {
        let mut query = BooksQuery::default();
        if let Err(e) = query.set_page_size(options.page_size) {
            tracing::warn!(error = %e, "Ignoring configured page size");
        }
        Self::start(source, options, query)
    }

    /// Create the controller starting from `query`, which must pass
    /// [`BooksQuery::validate`]. Its search takes effect immediately. A zero
    /// `metadata_sample_size` skips the metadata load.
    pub fn with_query(
        source: Arc<dyn BookSource>,
        options: ControllerOptions,
        query: BooksQuery,
    ) -> Result<Self> {
        query.validate()?;
        Ok(Self::start(source, options, query))
    }

    fn start(source: Arc<dyn BookSource>, options: ControllerOptions, query: BooksQuery) -> Self {
        let (view, _) = watch::channel(ListView {
            loading: false,
            error: None,
            result: PagedResult::empty(query.page, query.page_size),
            metadata: CatalogMetadata::default(),
        });

        let load_metadata = options.metadata_sample_size > 0;
        let inner = Arc::new(Inner {
            source,
            options,
            shared: Mutex::new(Shared {
                effective_search: query.search.clone(),
                query,
                search_rev: 0,
                dispatched: None,
                inflight: None,
                debounce: None,
                closed: false,
            }),
            view,
            root: CancellationToken::new(),
        });

        if load_metadata {
            inner.load_metadata();
        }
        inner.dispatch_if_changed(&mut inner.shared.lock());

        Self { inner }
    }

    /// Query as typed, including a search that has not settled yet.
    pub fn query(&self) -> BooksQuery {
        self.inner.shared.lock().query.clone()
    }

    /// Query used for fetching (debounced search).
    pub fn effective_query(&self) -> BooksQuery {
        Inner::effective(&self.inner.shared.lock())
    }

    /// Snapshot of the view.
    pub fn view(&self) -> ListView {
        self.inner.view.borrow().clone()
    }

    /// Receive every view change.
    pub fn subscribe(&self) -> watch::Receiver<ListView> {
        self.inner.view.subscribe()
    }

    /// Wait until no fetch is outstanding and return the view.
    pub async fn settled(&self) -> ListView {
        let mut rx = self.inner.view.subscribe();
        match rx.wait_for(|v| !v.loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        }
    }

    fn try_apply(&self, f: impl FnOnce(&mut BooksQuery) -> Result<()>) -> Result<()> {
        let mut shared = self.inner.shared.lock();
        f(&mut shared.query)?;
        self.inner.dispatch_if_changed(&mut shared);
        Ok(())
    }

    fn apply(&self, f: impl FnOnce(&mut BooksQuery)) {
        let mut shared = self.inner.shared.lock();
        f(&mut shared.query);
        self.inner.dispatch_if_changed(&mut shared);
    }

    /// Update the search text now; fetch with it after the debounce delay.
    /// Resets the page.
    pub fn set_search(&self, text: impl Into<String>) {
        let mut shared = self.inner.shared.lock();
        shared.query.set_search(text);
        shared.search_rev += 1;

        if let Some(pending) = shared.debounce.take() {
            pending.abort();
        }

        let rev = shared.search_rev;
        let delay = self.inner.options.debounce;
        let inner = Arc::clone(&self.inner);
        shared.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut guard = inner.shared.lock();
            let shared = &mut *guard;
            if shared.search_rev != rev || shared.closed {
                return;
            }
            shared.effective_search = shared.query.search.clone();
            shared.debounce = None;
            inner.dispatch_if_changed(shared);
        }));

        // The page reset alone may need a fetch before the search settles.
        self.inner.dispatch_if_changed(&mut shared);
    }

    /// Jump to a page.
    pub fn set_page(&self, page: u32) -> Result<()> {
        self.try_apply(|q| q.set_page(page))
    }

    /// Change the page size. Resets the page.
    pub fn set_page_size(&self, page_size: u32) -> Result<()> {
        self.try_apply(|q| q.set_page_size(page_size))
    }

    /// Replace one filter. Resets the page.
    pub fn set_filter(&self, update: FilterUpdate) {
        self.apply(|q| q.set_filter(update));
    }

    /// Sort on `field` ascending, unless already sorted on. Resets the page.
    pub fn add_sort(&self, field: SortField) {
        self.add_sort_with(field, SortDirection::default());
    }

    /// Sort on `field` in `direction`, unless already sorted on. Resets the page.
    pub fn add_sort_with(&self, field: SortField, direction: SortDirection) {
        self.apply(|q| q.add_sort_with(field, direction));
    }

    /// Stop sorting on `field`. Resets the page.
    pub fn remove_sort(&self, field: SortField) {
        self.apply(|q| q.remove_sort(field));
    }

    /// Flip the direction of `field`. Resets the page.
    pub fn toggle_sort_direction(&self, field: SortField) {
        self.apply(|q| q.toggle_sort_direction(field));
    }

    /// Fetch the current effective query again.
    pub fn refresh(&self) {
        let mut shared = self.inner.shared.lock();
        let effective = Inner::effective(&shared);
        self.inner.dispatch(&mut shared, effective);
    }

    /// Cancel in-flight work and stop reacting to changes.
    pub fn shutdown(&self) {
        let mut shared = self.inner.shared.lock();
        if shared.closed {
            return;
        }
        shared.closed = true;

        if let Some(pending) = shared.debounce.take() {
            pending.abort();
        }
        shared.inflight = None;
        self.inner.root.cancel();
        self.inner.view.send_modify(|v| v.loading = false);

        tracing::debug!("Book list controller shut down");
    }
}

impl Drop for BooksController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
