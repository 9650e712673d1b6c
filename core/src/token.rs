//! Auth token storage and the `/api/token` service.
//!
//! # Design
//! `TokenHolder` is the only mutable state a `Client` shares between calls.
//! Reads take a short synchronous lock and never span an await point.
//! Refreshes are single-flight: they queue on an async gate, and a caller that
//! finds the token already replaced while it waited reuses the new one
//! instead of refreshing again.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::Client;
use crate::config::Credentials;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::transport::Transport;

const TOKEN_PATH: &str = "/api/token";

/// A token issued by `/api/token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    #[serde(rename = "token")]
    pub keystone_token: String,
    #[serde(default)]
    pub expires_at: String,
}

/// Request payload for `/api/token`, tagged by `auth_method`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "auth_method", rename_all = "snake_case")]
pub enum TokenCreateRequest {
    Password {
        username: String,
        password: String,
    },
    ApplicationCredential {
        credential_id: String,
        credential_secret: String,
    },
}

impl std::fmt::Debug for TokenCreateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenCreateRequest::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            TokenCreateRequest::ApplicationCredential { credential_id, .. } => f
                .debug_struct("ApplicationCredential")
                .field("credential_id", credential_id)
                .finish_non_exhaustive(),
        }
    }
}

impl TokenCreateRequest {
    /// Payload for the configured credentials, if there are any.
    pub fn from_credentials(credentials: &Credentials) -> Option<Self> {
        match credentials {
            Credentials::None => None,
            Credentials::Password { username, password } => Some(Self::Password {
                username: username.clone(),
                password: password.clone(),
            }),
            Credentials::ApplicationCredential { id, secret } => Some(Self::ApplicationCredential {
                credential_id: id.clone(),
                credential_secret: secret.clone(),
            }),
        }
    }
}

/// Current auth token plus the gate that serializes refreshes.
#[derive(Debug, Default)]
pub struct TokenHolder {
    current: RwLock<Option<String>>,
    refresh_gate: Mutex<()>,
}

impl TokenHolder {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            current: RwLock::new(initial.filter(|t| !t.is_empty())),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store `token`; an empty string clears the holder.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) =
            (!token.is_empty()).then_some(token);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Obtain a fresh token after `stale` was rejected.
    ///
    /// Waits for any refresh already in flight. If the held token no longer
    /// equals `stale` by then, it is returned as is; otherwise `refresh` runs
    /// and its result is stored. Both the wait and `refresh` stop with
    /// `Cancelled` once `cancel` fires.
    pub async fn refresh_after<F, Fut>(
        &self,
        cancel: &CancellationToken,
        stale: Option<&str>,
        refresh: F,
    ) -> Result<String, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token, ApiError>>,
    {
        let _gate = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            gate = self.refresh_gate.lock() => gate,
        };

        if let Some(current) = self.get() {
            if stale != Some(current.as_str()) {
                debug!("token already refreshed by a concurrent caller");
                return Ok(current);
            }
        }

        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            token = refresh() => token?,
        };
        self.set(token.keystone_token.clone());
        Ok(token.keystone_token)
    }
}

/// `/api/token` operations.
pub struct TokenService<'a, T> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> TokenService<'a, T> {
    pub(crate) fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Issue a token for `request`.
    ///
    /// Sent once with no 401 retry, since the retry path itself lands here.
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        request: &TokenCreateRequest,
    ) -> Result<Token, ApiError> {
        let req = self.client.build(HttpMethod::Post, TOKEN_PATH, Some(request))?;
        let resp = self.client.send(cancel, &req).await?;
        if resp.status >= 400 {
            return Err(ApiError::from_status(resp.status, resp.body));
        }
        let token: Token = resp.json()?;
        if token.keystone_token.is_empty() {
            return Err(ApiError::EmptyToken);
        }
        Ok(token)
    }

    /// Issue a token with the client's configured credentials.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Token, ApiError> {
        let request = TokenCreateRequest::from_credentials(&self.client.config().credentials)
            .ok_or(ApiError::MissingCredentials)?;
        self.create(cancel, &request).await
    }
}
