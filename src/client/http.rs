//! `reqwest`-backed client for the catalog REST API.

use super::BookSource;
use super::payload::{ListPayload, LoginResponse, RegisterInput, SinglePayload, error_message};
use crate::auth::{AuthError, Credentials};
use crate::catalog::{BackendBook, Book, BookInput, ListParams, PagedResult, augment};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::future::Future;
use tokio_util::sync::CancellationToken;

const USER_AGENT: &str = concat!("shelfdesk/", env!("CARGO_PKG_VERSION"));

/// Race `fut` against `cancel`; the future is dropped (and the request
/// aborted) as soon as the token fires.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        res = fut => res,
    }
}

/// Turn a non-success response into [`AppError::Http`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(AppError::Http {
        status: status.as_u16(),
        message,
    })
}

/// REST client. The bearer token is attached to every request once set.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:3000/api`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Config("API base URL is empty".to_string()));
        }

        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the bearer token.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Whether a bearer token is set.
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn book_path(id: &str) -> String {
        format!("/books/{}", urlencoding::encode(id))
    }

    /// `GET /books` with server-side parameters, normalized.
    pub async fn list_books(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<BackendBook>> {
        tracing::debug!(query = ?params.query_pairs(), "Fetching books");

        cancellable(cancel, async {
            let response = self
                .request(Method::GET, "/books")
                .query(&params.query_pairs())
                .send()
                .await?;
            let payload: ListPayload = check_status(response).await?.json().await?;
            Ok::<_, AppError>(payload.into_page(params))
        })
        .await
    }

    /// `GET /books/:id`, augmented.
    pub async fn get_book(&self, id: &str) -> Result<Book> {
        let response = self
            .request(Method::GET, &Self::book_path(id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(id.to_string()));
        }
        let payload: SinglePayload = check_status(response).await?.json().await?;
        Ok(augment(payload.into_book()))
    }

    /// `POST /books`.
    pub async fn create_book(&self, input: &BookInput) -> Result<()> {
        let response = self
            .request(Method::POST, "/books")
            .json(input)
            .send()
            .await?;
        check_status(response).await?;
        tracing::info!(title = ?input.title, "Book created");
        Ok(())
    }

    /// `PATCH /books/:id`.
    pub async fn update_book(&self, id: &str, input: &BookInput) -> Result<()> {
        let response = self
            .request(Method::PATCH, &Self::book_path(id))
            .json(input)
            .send()
            .await?;
        check_status(response).await?;
        tracing::info!(id = %id, "Book updated");
        Ok(())
    }

    /// `PATCH /books/:id` with only `available`.
    pub async fn set_available(&self, id: &str, available: bool) -> Result<()> {
        self.update_book(id, &BookInput::availability(available)).await
    }

    /// `GET /books/export` with search and server sort; returns CSV bytes.
    pub async fn export_csv(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        cancellable(cancel, async {
            let response = self
                .request(Method::GET, "/books/export")
                .query(&params.export_pairs())
                .send()
                .await?;
            let bytes = check_status(response).await?.bytes().await?;
            Ok::<_, AppError>(bytes.to_vec())
        })
        .await
    }

    /// `POST /auth/login`.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let response = self
            .request(Method::POST, "/auth/login")
            .json(credentials)
            .send()
            .await
            .map_err(|e| AuthError::LoginFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::classify_login(status.as_u16(), &error_message(&body)).into());
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::LoginFailed(e.to_string()).into())
    }

    /// `POST /auth/register`. Returns the backend's JSON body.
    pub async fn register(&self, input: &RegisterInput) -> Result<serde_json::Value> {
        let response = self
            .request(Method::POST, "/auth/register")
            .json(input)
            .send()
            .await
            .map_err(|e| AuthError::RegistrationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                AuthError::classify_register(status.as_u16(), &error_message(&body)).into(),
            );
        }

        Ok(response.json().await.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl BookSource for ApiClient {
    async fn fetch_page(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<BackendBook>> {
        self.list_books(params, cancel).await
    }
}
