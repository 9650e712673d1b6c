//! HTTP request and response types exchanged with a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. `Client::build` produces an
//! `HttpRequest` without touching the network, a `Transport` turns it into an
//! `HttpResponse`, and the dispatcher inspects the status before any decoding
//! happens. Keeping both sides as owned values lets tests script transports
//! without a live server.

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";
pub const USER_AGENT: &str = "User-Agent";
pub const TENANT_NAME: &str = "X-Tenant-Name";
pub const TENANT_ID: &str = "X-Tenant-Id";
pub const AUTH_TOKEN: &str = "X-Auth-Token";

/// Media type sent as both `Content-Type` and `Accept`.
pub const MEDIA_TYPE: &str = "application/json; charset=utf-8";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An outbound request described as plain data.
///
/// Built by `Client::build`. Header names are matched case-insensitively by
/// the accessors below, but stored exactly as they were set.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Value of the first header named `name`, if any.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every header named `name` with a single `name: value` pair.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }
}

/// An inbound response with its body already read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(ApiError::Decoding)
    }
}
