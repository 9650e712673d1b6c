//! Token and DNS lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every DNS operation
//! through the default reqwest transport. Midway through, all tokens are
//! revoked server-side so the next call has to go through the
//! 401 → refresh → retry path over real HTTP.

use std::net::SocketAddr;

use bizfly_core::{
    ApiError, Client, ClientBuilder, CreateRecordPayload, CreateZonePayload, RecordData,
    RecordValue, RoutingPolicyData, UpdateRecordPayload,
};
use mock_server::Db;
use tokio_util::sync::CancellationToken;

async fn start_server() -> (SocketAddr, Db) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let db = Db::default();
    tokio::spawn(mock_server::serve(listener, db.clone()));
    (addr, db)
}

fn client(addr: SocketAddr) -> Client {
    ClientBuilder::new()
        .api_url(format!("http://{addr}"))
        .password(mock_server::USERNAME, mock_server::PASSWORD)
        .build()
        .unwrap()
}

async fn revoke_tokens(addr: SocketAddr) {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/_mock/revoke-tokens"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
}

#[tokio::test]
async fn dns_lifecycle() {
    let (addr, db) = start_server().await;
    let client = client(addr);
    let cancel = CancellationToken::new();
    let dns = client.dns();

    // Step 1: first call has no token; the 401 triggers a login and retry.
    let zones = dns.list_zones(&cancel).await.unwrap();
    assert!(zones.zones.is_empty(), "expected no zones");
    assert!(client.current_token().is_some());
    assert_eq!(db.read().await.issued_tokens(), 1);

    // Step 2: create a zone.
    let zone = dns
        .create_zone(
            &cancel,
            &CreateZonePayload {
                name: "test.vn".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(zone.deleted, 0);
    assert_eq!(zone.records_set.len(), 2);

    // Step 3: get it back.
    let fetched = dns.get_zone(&cancel, zone.id).await.unwrap();
    assert_eq!(fetched.name, "test.vn");
    assert_eq!(fetched.records_set, zone.records_set);

    // Step 4: list shows record ids only.
    let zones = dns.list_zones(&cancel).await.unwrap();
    assert_eq!(zones.meta.total, 1);
    assert_eq!(zones.zones[0].records_set.len(), 2);

    // Step 5: create an A record.
    let record = dns
        .create_record(
            &cancel,
            zone.id,
            &CreateRecordPayload {
                name: "testsdx.vn".to_string(),
                record_type: "A".to_string(),
                ttl: 300,
                data: vec!["10.5.23.1".into(), "20.1.1.1".into()],
                routing_policy_data: RoutingPolicyData::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(record.zone_id, Some(zone.id));
    assert_eq!(record.ttl, 300);

    // Step 6: expire every token server-side; the next call refreshes.
    let stale = client.current_token();
    revoke_tokens(addr).await;
    let updated = dns
        .update_record(
            &cancel,
            record.id,
            &UpdateRecordPayload {
                name: "mx".to_string(),
                record_type: "MX".to_string(),
                ttl: 300,
                data: vec![RecordValue::from(RecordData {
                    value: "imap1.vccloud.vn".to_string(),
                    priority: 20,
                })],
                routing_policy_data: RoutingPolicyData::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "mx");
    assert_ne!(client.current_token(), stale);
    assert_eq!(db.read().await.issued_tokens(), 2);

    // Step 7: get the record.
    let fetched = dns.get_record(&cancel, record.id).await.unwrap();
    assert_eq!(fetched.record_type, "MX");

    // Step 8: delete the record, then the zone.
    dns.delete_record(&cancel, record.id).await.unwrap();
    let err = dns.get_record(&cancel, record.id).await.unwrap_err();
    assert!(err.is_not_found());

    dns.delete_zone(&cancel, zone.id).await.unwrap();
    let err = dns.get_zone(&cancel, zone.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { ref body } if body == "not found"));
}

#[tokio::test]
async fn wrong_credentials_surface_refresh_failure() {
    let (addr, _db) = start_server().await;
    let client = ClientBuilder::new()
        .api_url(format!("http://{addr}"))
        .password(mock_server::USERNAME, "wrong")
        .build()
        .unwrap();

    let err = client
        .dns()
        .list_zones(&CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        ApiError::AuthRefreshFailed { body, source } => {
            assert!(body.contains("requires authentication"));
            assert!(source.to_string().contains("Invalid credentials"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn other_tenant_gets_permission_denied() {
    let (addr, _db) = start_server().await;
    let owner = ClientBuilder::new()
        .api_url(format!("http://{addr}"))
        .application_credential(mock_server::CREDENTIAL_ID, mock_server::CREDENTIAL_SECRET)
        .tenant_id("tenant-a")
        .build()
        .unwrap();
    let cancel = CancellationToken::new();
    owner.login(&cancel).await.unwrap();
    let zone = owner
        .dns()
        .create_zone(
            &cancel,
            &CreateZonePayload {
                name: "owned.vn".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(zone.tenant_id, "tenant-a");

    let intruder = ClientBuilder::new()
        .api_url(format!("http://{addr}"))
        .password(mock_server::USERNAME, mock_server::PASSWORD)
        .tenant_id("tenant-b")
        .build()
        .unwrap();
    let err = intruder.dns().get_zone(&cancel, zone.id).await.unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied { .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr)
        .dns()
        .list_zones(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
