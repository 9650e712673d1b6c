//! In-memory stand-in for the BizFly token and DNS endpoints.
//!
//! Tokens are issued for fixed credentials and can be revoked in bulk through
//! `POST /_mock/revoke-tokens`, which lets client tests exercise the
//! 401 → refresh → retry path over real HTTP.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const USERNAME: &str = "admin@example.com";
pub const PASSWORD: &str = "secret";
pub const CREDENTIAL_ID: &str = "app-cred-id";
pub const CREDENTIAL_SECRET: &str = "app-cred-secret";

const NAMESERVERS: [&str; 2] = ["ns-captain.dev.bizflycloud.vn.", "ns-batman.dev.bizflycloud.vn."];
const TIMESTAMP: &str = "2020-10-19 09:54:46.718000";
const DEFAULT_TTL: u32 = 3600;

#[derive(Debug, Deserialize)]
#[serde(tag = "auth_method", rename_all = "snake_case")]
pub enum TokenRequest {
    Password {
        username: String,
        password: String,
    },
    ApplicationCredential {
        credential_id: String,
        credential_secret: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: u32,
    pub data: Vec<serde_json::Value>,
    pub routing_policy_data: serde_json::Value,
    pub deleted: i64,
    pub create_at: String,
    pub update_at: String,
    pub tenant_id: String,
    pub zone_id: Uuid,
}

#[derive(Clone, Debug)]
struct ZoneRow {
    id: Uuid,
    name: String,
    tenant_id: String,
    record_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct CreateZone {
    pub name: String,
}

#[derive(Deserialize)]
pub struct RecordInput {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: u32,
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub routing_policy_data: Option<serde_json::Value>,
}

#[derive(Default)]
pub struct Store {
    tokens: HashSet<String>,
    zones: HashMap<Uuid, ZoneRow>,
    records: HashMap<Uuid, Record>,
    issued: usize,
}

impl Store {
    /// Number of tokens issued since startup, revoked ones included.
    pub fn issued_tokens(&self) -> usize {
        self.issued
    }

    fn zone_json(&self, zone: &ZoneRow, expand: bool) -> serde_json::Value {
        let records_set: Vec<serde_json::Value> = if expand {
            zone.record_ids
                .iter()
                .filter_map(|id| self.records.get(id))
                .map(|r| {
                    json!({
                        "id": r.id,
                        "name": r.name,
                        "type": r.record_type,
                        "ttl": r.ttl,
                        "data": r.data,
                        "routing_policy_data": r.routing_policy_data,
                    })
                })
                .collect()
        } else {
            zone.record_ids.iter().map(|id| json!(id)).collect()
        };
        json!({
            "id": zone.id,
            "name": zone.name,
            "deleted": 0,
            "created_at": TIMESTAMP,
            "update_at": TIMESTAMP,
            "tenant_id": zone.tenant_id,
            "nameserver": NAMESERVERS,
            "ttl": DEFAULT_TTL,
            "active": false,
            "records_set": records_set,
        })
    }

    fn insert_record(&mut self, zone_id: Uuid, tenant_id: &str, input: RecordInput) -> Record {
        let record = Record {
            id: Uuid::new_v4(),
            name: input.name,
            record_type: input.record_type,
            ttl: input.ttl,
            data: input.data,
            routing_policy_data: input.routing_policy_data.unwrap_or_else(|| json!({})),
            deleted: 0,
            create_at: TIMESTAMP.to_string(),
            update_at: TIMESTAMP.to_string(),
            tenant_id: tenant_id.to_string(),
            zone_id,
        };
        if let Some(zone) = self.zones.get_mut(&zone_id) {
            zone.record_ids.push(record.id);
        }
        self.records.insert(record.id, record.clone());
        record
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_store(Db::default())
}

/// Router over a caller-owned store, so tests can inspect it.
pub fn app_with_store(db: Db) -> Router {
    let dns = Router::new()
        .route("/api/dns/zones", get(list_zones).post(create_zone))
        .route("/api/dns/zones/{id}", get(get_zone).delete(delete_zone))
        .route("/api/dns/zones/{id}/record", post(create_record))
        .route(
            "/api/dns/record/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route_layer(middleware::from_fn_with_state(db.clone(), require_token));

    Router::new()
        .route("/api/token", post(create_token))
        .route("/_mock/revoke-tokens", post(revoke_tokens))
        .merge(dns)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Db::default()).await
}

/// Serve over a caller-owned store.
pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(db)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

fn tenant_of(headers: &HeaderMap) -> String {
    headers
        .get("X-Tenant-Id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// A non-empty tenant header must match the owner; an empty one is accepted.
fn tenant_allowed(headers: &HeaderMap, owner: &str) -> bool {
    let tenant = tenant_of(headers);
    tenant.is_empty() || tenant == owner
}

async fn require_token(State(db): State<Db>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get("X-Auth-Token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let valid = match token {
        Some(token) => db.read().await.tokens.contains(&token),
        None => false,
    };
    if !valid {
        return error(StatusCode::UNAUTHORIZED, "The request you have made requires authentication.");
    }
    next.run(request).await
}

async fn create_token(State(db): State<Db>, Json(input): Json<TokenRequest>) -> Response {
    let accepted = match &input {
        TokenRequest::Password { username, password } => username == USERNAME && password == PASSWORD,
        TokenRequest::ApplicationCredential {
            credential_id,
            credential_secret,
        } => credential_id == CREDENTIAL_ID && credential_secret == CREDENTIAL_SECRET,
    };
    if !accepted {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let token = format!("gAAAA{}", Uuid::new_v4().simple());
    let mut store = db.write().await;
    store.tokens.insert(token.clone());
    store.issued += 1;
    info!(issued = store.issued, "issued token");
    (
        StatusCode::CREATED,
        Json(json!({ "token": token, "expires_at": "2099-01-01T00:00:00.000000Z" })),
    )
        .into_response()
}

async fn revoke_tokens(State(db): State<Db>) -> StatusCode {
    let mut store = db.write().await;
    let revoked = store.tokens.len();
    store.tokens.clear();
    info!(revoked, "revoked tokens");
    StatusCode::NO_CONTENT
}

async fn list_zones(State(db): State<Db>, headers: HeaderMap) -> Json<serde_json::Value> {
    let store = db.read().await;
    let zones: Vec<_> = store
        .zones
        .values()
        .filter(|z| tenant_allowed(&headers, &z.tenant_id))
        .map(|z| store.zone_json(z, false))
        .collect();
    let total = zones.len();
    Json(json!({
        "zones": zones,
        "_meta": { "max_results": total, "total": total, "page": 1 },
    }))
}

async fn create_zone(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateZone>,
) -> Response {
    let tenant_id = tenant_of(&headers);
    let zone = ZoneRow {
        id: Uuid::new_v4(),
        name: input.name.clone(),
        tenant_id: tenant_id.clone(),
        record_ids: Vec::new(),
    };
    let mut store = db.write().await;
    store.zones.insert(zone.id, zone.clone());
    for (record_type, data) in [
        ("NS", NAMESERVERS.to_vec()),
        ("SOA", vec![NAMESERVERS[0]]),
    ] {
        store.insert_record(
            zone.id,
            &tenant_id,
            RecordInput {
                name: input.name.clone(),
                record_type: record_type.to_string(),
                ttl: DEFAULT_TTL,
                data: data.into_iter().map(|d| json!(d)).collect(),
                routing_policy_data: None,
            },
        );
    }

    let zone = &store.zones[&zone.id];
    Json(store.zone_json(zone, true)).into_response()
}

async fn get_zone(State(db): State<Db>, headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    let store = db.read().await;
    match store.zones.get(&id) {
        None => not_found(),
        Some(zone) if !tenant_allowed(&headers, &zone.tenant_id) => {
            error(StatusCode::FORBIDDEN, "You are not allowed to do this action")
        }
        Some(zone) => Json(store.zone_json(zone, true)).into_response(),
    }
}

async fn delete_zone(State(db): State<Db>, headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    let mut store = db.write().await;
    let Some(zone) = store.zones.get(&id) else {
        return not_found();
    };
    if !tenant_allowed(&headers, &zone.tenant_id) {
        return error(StatusCode::FORBIDDEN, "You are not allowed to do this action");
    }
    if let Some(zone) = store.zones.remove(&id) {
        for record_id in zone.record_ids {
            store.records.remove(&record_id);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn create_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(zone_id): Path<Uuid>,
    Json(input): Json<RecordInput>,
) -> Response {
    let mut store = db.write().await;
    let Some(zone) = store.zones.get(&zone_id) else {
        return not_found();
    };
    if !tenant_allowed(&headers, &zone.tenant_id) {
        return error(StatusCode::FORBIDDEN, "You are not allowed to do this action");
    }
    let tenant_id = zone.tenant_id.clone();
    let record = store.insert_record(zone_id, &tenant_id, input);
    Json(record).into_response()
}

async fn get_record(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let store = db.read().await;
    match store.records.get(&id) {
        Some(record) => Json(record.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_record(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<RecordInput>,
) -> Response {
    let mut store = db.write().await;
    let Some(record) = store.records.get_mut(&id) else {
        return not_found();
    };
    record.name = input.name;
    record.record_type = input.record_type;
    record.ttl = input.ttl;
    record.data = input.data;
    if let Some(policy) = input.routing_policy_data {
        record.routing_policy_data = policy;
    }
    Json(record.clone()).into_response()
}

async fn delete_record(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let mut store = db.write().await;
    let Some(record) = store.records.remove(&id) else {
        return not_found();
    };
    if let Some(zone) = store.zones.get_mut(&record.zone_id) {
        zone.record_ids.retain(|r| *r != id);
    }
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_request_reads_password_method() {
        let input: TokenRequest = serde_json::from_str(
            r#"{"auth_method":"password","username":"u","password":"p"}"#,
        )
        .unwrap();
        assert!(matches!(input, TokenRequest::Password { .. }));
    }

    #[test]
    fn token_request_rejects_unknown_method() {
        let result: Result<TokenRequest, _> =
            serde_json::from_str(r#"{"auth_method":"kerberos"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn record_input_defaults_routing_policy() {
        let input: RecordInput = serde_json::from_str(
            r#"{"name":"www","type":"A","ttl":300,"data":["10.0.0.1"]}"#,
        )
        .unwrap();
        assert!(input.routing_policy_data.is_none());
        assert_eq!(input.record_type, "A");
    }

    #[test]
    fn zone_json_lists_record_ids_unless_expanded() {
        let mut store = Store::default();
        let zone_id = Uuid::new_v4();
        store.zones.insert(
            zone_id,
            ZoneRow {
                id: zone_id,
                name: "test.vn".to_string(),
                tenant_id: String::new(),
                record_ids: Vec::new(),
            },
        );
        let record = store.insert_record(
            zone_id,
            "",
            RecordInput {
                name: "www".to_string(),
                record_type: "A".to_string(),
                ttl: 300,
                data: vec![json!("10.0.0.1")],
                routing_policy_data: None,
            },
        );

        let zone = store.zones[&zone_id].clone();
        let flat = store.zone_json(&zone, false);
        assert_eq!(flat["records_set"][0], json!(record.id));
        let expanded = store.zone_json(&zone, true);
        assert_eq!(expanded["records_set"][0]["type"], "A");
        assert_eq!(expanded["deleted"], 0);
    }
}
