//! Client configuration and its builder.

use std::env;

use url::Url;

use crate::client::Client;
use crate::error::ApiError;
use crate::token::TokenHolder;
use crate::transport::{ReqwestTransport, Transport};

pub const DEFAULT_API_URL: &str = "https://manage.bizflycloud.vn";
pub const DEFAULT_USER_AGENT: &str = concat!("bizfly-client-rust/", env!("CARGO_PKG_VERSION"));

/// Secrets used only to obtain or refresh the auth token.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    None,
    Password {
        username: String,
        password: String,
    },
    ApplicationCredential {
        id: String,
        secret: String,
    },
}

// Secrets stay out of debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::ApplicationCredential { id, .. } => f
                .debug_struct("ApplicationCredential")
                .field("id", id)
                .finish_non_exhaustive(),
        }
    }
}

/// Immutable settings shared by every request a `Client` builds.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub user_agent: String,
    /// Sent as `X-Tenant-Name`; slated for removal on the API side.
    pub tenant_name: String,
    /// Sent as `X-Tenant-Id`; slated for removal on the API side.
    pub tenant_id: String,
    pub credentials: Credentials,
}

/// Builder for `Client`.
///
/// ```no_run
/// # async fn run() -> Result<(), bizfly_core::ApiError> {
/// use bizfly_core::ClientBuilder;
/// use tokio_util::sync::CancellationToken;
///
/// let client = ClientBuilder::new()
///     .password("user@example.com", "s3cret")
///     .build()?;
/// client.login(&CancellationToken::new()).await?;
/// let zones = client.dns().list_zones(&CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    api_url: Option<String>,
    user_agent: Option<String>,
    tenant_name: String,
    tenant_id: String,
    credentials: Credentials,
    token: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `BIZFLY_*` environment variables. Unset variables keep
    /// their defaults; application credentials win over a password when both
    /// are present.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        let mut builder = Self::new();
        if let Some(url) = var("BIZFLY_API_URL") {
            builder = builder.api_url(url);
        }
        if let Some(name) = var("BIZFLY_TENANT_NAME") {
            builder = builder.tenant_name(name);
        }
        if let Some(id) = var("BIZFLY_TENANT_ID") {
            builder = builder.tenant_id(id);
        }
        if let (Some(username), Some(password)) = (var("BIZFLY_USERNAME"), var("BIZFLY_PASSWORD")) {
            builder = builder.password(username, password);
        }
        if let (Some(id), Some(secret)) = (
            var("BIZFLY_APP_CREDENTIAL_ID"),
            var("BIZFLY_APP_CREDENTIAL_SECRET"),
        ) {
            builder = builder.application_credential(id, secret);
        }
        builder
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn tenant_name(mut self, tenant_name: impl Into<String>) -> Self {
        self.tenant_name = tenant_name.into();
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn password(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Credentials::Password {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    pub fn application_credential(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.credentials = Credentials::ApplicationCredential {
            id: id.into(),
            secret: secret.into(),
        };
        self
    }

    /// Seed the client with an already issued token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn build(self) -> Result<Client<ReqwestTransport>, ApiError> {
        self.build_with_transport(ReqwestTransport::default())
    }

    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<Client<T>, ApiError> {
        let raw = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let api_url = Url::parse(raw).map_err(|source| ApiError::MalformedUrl {
            input: raw.to_string(),
            source,
        })?;

        let config = ClientConfig {
            api_url,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            tenant_name: self.tenant_name,
            tenant_id: self.tenant_id,
            credentials: self.credentials,
        };
        Ok(Client::from_parts(
            config,
            transport,
            TokenHolder::new(self.token),
        ))
    }
}
