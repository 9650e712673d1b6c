//! DNS payloads exchanged with `/api/dns`.
//!
//! # Design
//! Field names follow the wire format, including its spellings (`create_at`
//! on records, `update_at` everywhere). Bookkeeping fields the API only
//! sometimes includes are optional or defaulted so the same types decode
//! list, get, and create responses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub page: u32,
}

/// A zone as returned by the list endpoint; records are referenced by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub deleted: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub update_at: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub nameserver: Vec<String>,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub records_set: Vec<Uuid>,
}

/// A zone with its records expanded, as returned by get and create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtendedZone {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub deleted: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub update_at: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub nameserver: Vec<String>,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub records_set: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListZonesResponse {
    pub zones: Vec<Zone>,
    #[serde(rename = "_meta", default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateZonePayload {
    pub name: String,
}

/// A prioritized record value, used by MX records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordData {
    pub value: String,
    pub priority: u32,
}

/// One entry of a record's `data` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecordValue {
    Plain(String),
    Prioritized(RecordData),
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::Plain(value.to_string())
    }
}

impl From<RecordData> for RecordValue {
    fn from(data: RecordData) -> Self {
        RecordValue::Prioritized(data)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TcpHealthCheck {
    pub tcp_port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpHealthCheck {
    pub http_port: u16,
    pub url_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vhost: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ok_codes: String,
    #[serde(default)]
    pub interval: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_connect: Option<TcpHealthCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<HttpHealthCheck>,
}

/// Geo-routing and health-check settings; empty (`{}`) for plain records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutingPolicyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_data: Option<HashMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub data: Vec<RecordValue>,
    #[serde(default)]
    pub routing_policy_data: RoutingPolicyData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRecordPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: u32,
    pub data: Vec<RecordValue>,
    #[serde(default)]
    pub routing_policy_data: RoutingPolicyData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateRecordPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: u32,
    pub data: Vec<RecordValue>,
    #[serde(default)]
    pub routing_policy_data: RoutingPolicyData,
}
