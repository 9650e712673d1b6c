//! DNS zones and records under `/api/dns`.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::{Client, NO_BODY};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::transport::Transport;
use crate::types::{
    CreateRecordPayload, CreateZonePayload, ExtendedZone, ListZonesResponse, Record,
    UpdateRecordPayload,
};

const ZONES_PATH: &str = "/api/dns/zones";
const RECORDS_PATH: &str = "/api/dns/record";

pub(crate) fn zone_item_path(id: Uuid) -> String {
    format!("{ZONES_PATH}/{id}")
}

pub(crate) fn zone_records_path(zone_id: Uuid) -> String {
    format!("{ZONES_PATH}/{zone_id}/record")
}

pub(crate) fn record_item_path(id: Uuid) -> String {
    format!("{RECORDS_PATH}/{id}")
}

/// DNS operations, borrowed from a `Client` via `Client::dns`.
pub struct DnsService<'a, T> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> DnsService<'a, T> {
    pub(crate) fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    pub async fn list_zones(&self, cancel: &CancellationToken) -> Result<ListZonesResponse, ApiError> {
        let req = self.client.build(HttpMethod::Get, ZONES_PATH, NO_BODY)?;
        self.client.execute_json(cancel, req).await
    }

    pub async fn create_zone(
        &self,
        cancel: &CancellationToken,
        payload: &CreateZonePayload,
    ) -> Result<ExtendedZone, ApiError> {
        let req = self.client.build(HttpMethod::Post, ZONES_PATH, Some(payload))?;
        self.client.execute_json(cancel, req).await
    }

    pub async fn get_zone(&self, cancel: &CancellationToken, id: Uuid) -> Result<ExtendedZone, ApiError> {
        let req = self.client.build(HttpMethod::Get, &zone_item_path(id), NO_BODY)?;
        self.client.execute_json(cancel, req).await
    }

    pub async fn delete_zone(&self, cancel: &CancellationToken, id: Uuid) -> Result<(), ApiError> {
        let req = self.client.build(HttpMethod::Delete, &zone_item_path(id), NO_BODY)?;
        self.client.execute(cancel, req).await?;
        Ok(())
    }

    pub async fn create_record(
        &self,
        cancel: &CancellationToken,
        zone_id: Uuid,
        payload: &CreateRecordPayload,
    ) -> Result<Record, ApiError> {
        let req = self
            .client
            .build(HttpMethod::Post, &zone_records_path(zone_id), Some(payload))?;
        self.client.execute_json(cancel, req).await
    }

    pub async fn get_record(&self, cancel: &CancellationToken, id: Uuid) -> Result<Record, ApiError> {
        let req = self.client.build(HttpMethod::Get, &record_item_path(id), NO_BODY)?;
        self.client.execute_json(cancel, req).await
    }

    pub async fn update_record(
        &self,
        cancel: &CancellationToken,
        id: Uuid,
        payload: &UpdateRecordPayload,
    ) -> Result<Record, ApiError> {
        let req = self
            .client
            .build(HttpMethod::Put, &record_item_path(id), Some(payload))?;
        self.client.execute_json(cancel, req).await
    }

    pub async fn delete_record(&self, cancel: &CancellationToken, id: Uuid) -> Result<(), ApiError> {
        let req = self.client.build(HttpMethod::Delete, &record_item_path(id), NO_BODY)?;
        self.client.execute(cancel, req).await?;
        Ok(())
    }
}
