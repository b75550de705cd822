//! Authentication and session persistence.

use crate::client::{ApiClient, RegisterInput};
use crate::error::{AppError, Result};
use crate::session::{SessionStore, StorageTier};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Key the serialized auth state is stored under.
pub const AUTH_STORAGE_KEY: &str = "shelfdesk_auth_state";

/// Console role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access. Every console login is granted this role.
    #[default]
    Admin,
    /// Can edit books.
    Editor,
    /// Read-only.
    Viewer,
}

/// Logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Role.
    pub role: UserRole,
}

/// Login form input.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Persisted authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    /// Whether a session is active.
    pub is_authenticated: bool,
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Authentication failures, already classified for display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login failed for another reason.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Email already taken.
    #[error("Email already registered")]
    EmailExists,

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Registration failed for another reason.
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),
}

impl AuthError {
    /// Classify a failed login response. Only the status decides; the
    /// message is kept for the log.
    pub fn classify_login(status: u16, message: &str) -> Self {
        if status == 401 {
            AuthError::InvalidCredentials
        } else {
            AuthError::LoginFailed(format!("HTTP {}: {}", status, message))
        }
    }

    /// Classify a failed registration response.
    pub fn classify_register(status: u16, message: &str) -> Self {
        let lower = message.to_lowercase();
        if status == 409
            || ["exists", "registered", "existe"]
                .iter()
                .any(|w| lower.contains(w))
        {
            AuthError::EmailExists
        } else {
            AuthError::RegistrationFailed(format!("HTTP {}: {}", status, message))
        }
    }

    /// Display-ready message key.
    pub fn message_key(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "auth.login.errorInvalid",
            AuthError::LoginFailed(_) => "auth.login.errorGeneric",
            AuthError::EmailExists => "auth.register.errorEmailExists",
            AuthError::PasswordMismatch => "auth.register.passwordMismatch",
            AuthError::RegistrationFailed(_) => "auth.register.errorGeneric",
        }
    }
}

/// Authentication service: talks to the backend and keeps the session
/// in the injected store.
pub struct AuthService {
    api: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
    state: RwLock<AuthState>,
    tier: RwLock<StorageTier>,
}

impl AuthService {
    /// Create the service and restore any persisted session.
    pub fn new(api: Arc<ApiClient>, store: Arc<dyn SessionStore>) -> Result<Self> {
        let (state, tier) = Self::restore(store.as_ref())?;
        api.set_token(state.token.clone());

        if state.is_authenticated {
            tracing::debug!(tier = ?tier, "Restored session");
        }

        Ok(Self {
            api,
            store,
            state: RwLock::new(state),
            tier: RwLock::new(tier),
        })
    }

    /// Read state from the durable tier, then the ephemeral one.
    fn restore(store: &dyn SessionStore) -> Result<(AuthState, StorageTier)> {
        for tier in StorageTier::ALL {
            if let Some(raw) = store.get(tier, AUTH_STORAGE_KEY)? {
                let state = serde_json::from_str(&raw).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Ignoring unreadable auth state");
                    AuthState::default()
                });
                return Ok((state, tier));
            }
        }
        Ok((AuthState::default(), StorageTier::Durable))
    }

    fn persist(&self, state: &AuthState, tier: StorageTier) -> Result<()> {
        let data = serde_json::to_string(state)?;
        for other in StorageTier::ALL.into_iter().filter(|t| *t != tier) {
            self.store.remove(other, AUTH_STORAGE_KEY)?;
        }
        self.store.set(tier, AUTH_STORAGE_KEY, &data)
    }

    /// Current state.
    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    /// Tier the session is kept in.
    pub fn tier(&self) -> StorageTier {
        *self.tier.read()
    }

    /// Whether a session is active.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }

    /// Log in. `remember` keeps the session in the durable tier.
    pub async fn login(&self, credentials: &Credentials, remember: bool) -> Result<User> {
        let response = self.api.login(credentials).await?;
        let user: User = response.user.into();

        let state = AuthState {
            is_authenticated: true,
            token: Some(response.access_token),
            user: Some(user.clone()),
        };
        let tier = StorageTier::for_remember(remember);

        self.persist(&state, tier)?;
        self.api.set_token(state.token.clone());
        *self.state.write() = state;
        *self.tier.write() = tier;

        tracing::info!(email = %user.email, remember = remember, "Logged in");
        Ok(user)
    }

    /// Log out and forget the session in every tier.
    pub fn logout(&self) -> Result<()> {
        for tier in StorageTier::ALL {
            self.store.remove(tier, AUTH_STORAGE_KEY)?;
        }
        self.api.set_token(None);
        *self.state.write() = AuthState::default();
        tracing::info!("Logged out");
        Ok(())
    }

    /// Create an account, then log in for this session only.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<User> {
        if password != confirm {
            return Err(AppError::Auth(AuthError::PasswordMismatch));
        }

        let input = RegisterInput {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api.register(&input).await?;
        tracing::info!(email = %email, "Account created");

        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.login(&credentials, false).await
    }
}
