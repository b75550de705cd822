//! Wire shapes and their normalization at the service boundary.

use crate::auth::User;
use crate::catalog::{BackendBook, ListParams, PagedResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    #[serde(default)]
    data: Vec<BackendBook>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    page_size: Option<u32>,
}

/// `GET /books` answers either with an envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload {
    Bare(Vec<BackendBook>),
    Envelope(Envelope),
}

impl ListPayload {
    /// Normalize to a page, filling gaps from the request.
    pub(crate) fn into_page(self, requested: &ListParams) -> PagedResult<BackendBook> {
        match self {
            ListPayload::Bare(data) => PagedResult {
                total: data.len() as u64,
                page: requested.page,
                page_size: requested.page_size,
                data,
            },
            ListPayload::Envelope(env) => PagedResult {
                total: env.total.unwrap_or(env.data.len() as u64),
                page: env.page.unwrap_or(requested.page),
                page_size: env.page_size.unwrap_or(requested.page_size),
                data: env.data,
            },
        }
    }
}

/// `GET /books/:id` answers with `{ data: {...} }` or the bare record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SinglePayload {
    Envelope { data: BackendBook },
    Bare(BackendBook),
}

impl SinglePayload {
    pub(crate) fn into_book(self) -> BackendBook {
        match self {
            SinglePayload::Envelope { data } => data,
            SinglePayload::Bare(book) => book,
        }
    }
}

/// Successful `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token.
    pub access_token: String,
    /// Account.
    pub user: RemoteUser,
}

/// Account as returned by the backend (no role).
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUser {
    /// Account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
}

impl From<RemoteUser> for User {
    fn from(user: RemoteUser) -> Self {
        User {
            id: user.id,
            name: user.name,
            email: user.email,
            role: Default::default(),
        }
    }
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Best-effort `message` field of an error body, else the raw text.
pub(crate) fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { message }) => message.to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str =
        r#"{"id":"1","title":"T","author":"A","createdAt":"2024-01-01T00:00:00Z"}"#;

    #[test]
    fn bare_array_is_wrapped() {
        let raw = format!("[{0},{0}]", RECORD);
        let payload: ListPayload = serde_json::from_str(&raw).unwrap();
        let page = payload.into_page(&ListParams::sample(10));
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total, 2);
        assert_eq!(page.page_size, 10);
    }

    #[test]
    fn envelope_keeps_server_total() {
        let raw = format!(r#"{{"data":[{}],"total":42,"page":3,"pageSize":20}}"#, RECORD);
        let payload: ListPayload = serde_json::from_str(&raw).unwrap();
        let page = payload.into_page(&ListParams::sample(10));
        assert_eq!(page.total, 42);
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 20);
    }

    #[test]
    fn single_record_in_either_shape() {
        let bare: SinglePayload = serde_json::from_str(RECORD).unwrap();
        let wrapped: SinglePayload =
            serde_json::from_str(&format!(r#"{{"data":{}}}"#, RECORD)).unwrap();
        assert_eq!(bare.into_book(), wrapped.into_book());
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"message":"Email already registered"}"#), "Email already registered");
        assert_eq!(error_message("plain failure"), "plain failure");
    }
}
