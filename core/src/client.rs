//! Request builder and dispatcher shared by every resource service.
//!
//! # Design
//! `Client::build` turns a method, a path relative to the API URL, and an
//! optional JSON body into an `HttpRequest` with no I/O. `Client::execute`
//! sends it through the injected `Transport`, re-authenticates once on 401,
//! and maps any final status >= 400 to an `ApiError`. Resource services
//! (`dns()`, `token()`) are thin views that borrow the client.

use std::future::Future;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::dns::DnsService;
use crate::error::ApiError;
use crate::http::{self, HttpMethod, HttpRequest, HttpResponse};
use crate::token::{TokenHolder, TokenService};
use crate::transport::{ReqwestTransport, Transport};

/// Pass as `body` to `Client::build` for requests without a payload.
pub const NO_BODY: Option<&()> = None;

/// BizFly API client.
///
/// Cheap to share by reference; wrap in an `Arc` to use from several tasks.
#[derive(Debug)]
pub struct Client<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    tokens: TokenHolder,
}

impl<T> Client<T> {
    pub(crate) fn from_parts(config: ClientConfig, transport: T, tokens: TokenHolder) -> Self {
        Self {
            config,
            transport,
            tokens,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Token attached to the next request, if any.
    pub fn current_token(&self) -> Option<String> {
        self.tokens.get()
    }

    /// Use `token` for subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        self.tokens.set(token);
    }

    pub fn clear_token(&self) {
        self.tokens.clear();
    }

    /// Build a request for `path`, resolved against the API URL.
    pub fn build<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let url = self
            .config
            .api_url
            .join(path)
            .map_err(|source| ApiError::MalformedUrl {
                input: path.to_string(),
                source,
            })?;

        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(ApiError::Encoding)?;

        let mut headers = vec![
            (http::CONTENT_TYPE.to_string(), http::MEDIA_TYPE.to_string()),
            (http::ACCEPT.to_string(), http::MEDIA_TYPE.to_string()),
            (http::USER_AGENT.to_string(), self.config.user_agent.clone()),
            (http::TENANT_NAME.to_string(), self.config.tenant_name.clone()),
            (http::TENANT_ID.to_string(), self.config.tenant_id.clone()),
        ];
        if let Some(token) = self.tokens.get() {
            headers.push((http::AUTH_TOKEN.to_string(), token));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

impl<T: Transport> Client<T> {
    pub fn dns(&self) -> DnsService<'_, T> {
        DnsService::new(self)
    }

    pub fn token(&self) -> TokenService<'_, T> {
        TokenService::new(self)
    }

    /// Obtain a token with the configured credentials and keep it.
    pub async fn login(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        let token = self.token().refresh(cancel).await?;
        self.tokens.set(token.keystone_token);
        Ok(())
    }

    /// Perform exactly one round-trip, whatever the status.
    pub async fn send(
        &self,
        cancel: &CancellationToken,
        request: &HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = cancellable(cancel, async {
            self.transport.send(request).await.map_err(ApiError::from)
        })
        .await?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Send `request`, re-authenticating and retrying once on 401.
    ///
    /// Returns the response for any status below 400 and the mapped error
    /// otherwise.
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        mut request: HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        let mut response = self.send(cancel, &request).await?;

        if response.status == 401 {
            debug!(url = %request.url, "unauthorized, refreshing token");
            let stale = request.header(http::AUTH_TOKEN).map(str::to_owned);
            let refreshed = self
                .tokens
                .refresh_after(cancel, stale.as_deref(), || async move {
                    self.token().refresh(cancel).await
                })
                .await;
            let token = match refreshed {
                Ok(token) => token,
                Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                Err(err) => {
                    return Err(ApiError::AuthRefreshFailed {
                        body: response.body,
                        source: Box::new(err),
                    })
                }
            };
            request.set_header(http::AUTH_TOKEN, &token);
            response = self.send(cancel, &request).await?;
        }

        if response.status >= 400 {
            return Err(ApiError::from_status(response.status, response.body));
        }
        Ok(response)
    }

    /// `execute` and decode the JSON body.
    pub(crate) async fn execute_json<R: serde::de::DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        request: HttpRequest,
    ) -> Result<R, ApiError> {
        self.execute(cancel, request).await?.json()
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F, R>(cancel: &CancellationToken, fut: F) -> Result<R, ApiError>
where
    F: Future<Output = Result<R, ApiError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        result = fut => result,
    }
}
