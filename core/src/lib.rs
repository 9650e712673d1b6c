//! Async client for the BizFly Cloud REST API.
//!
//! # Overview
//! Every call goes through one pipeline. `Client::build` resolves a path
//! against the API URL, encodes the JSON body, and attaches the tenant and
//! auth headers. `Client::execute` sends the request through a `Transport`,
//! refreshes the token and retries once on 401, and maps any final status
//! >= 400 to an `ApiError`. Resource services decode successful bodies into
//! the types in `types`.
//!
//! # Design
//! - The auth token lives in a `TokenHolder` with single-flight refresh; it is
//!   the only state shared between calls.
//! - `Transport` is injected, so tests can script responses without a
//!   server. `ReqwestTransport` is the default.
//! - Each I/O call takes a `CancellationToken`; cancelling aborts the
//!   in-flight send or refresh and never triggers a retry.

pub mod client;
pub mod config;
pub mod dns;
pub mod error;
pub mod http;
pub mod token;
pub mod transport;
pub mod types;

pub use client::{Client, NO_BODY};
pub use config::{ClientBuilder, ClientConfig, Credentials, DEFAULT_API_URL};
pub use dns::DnsService;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use token::{Token, TokenCreateRequest, TokenHolder, TokenService};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    CreateRecordPayload, CreateZonePayload, ExtendedZone, ListZonesResponse, Meta, Record,
    RecordData, RecordValue, RoutingPolicyData, UpdateRecordPayload, Zone,
};
