//! End-to-end submission flow: SQLite-backed configuration, token exchange
//! against a mock auth endpoint, conversion, and dispatch with header
//! verification.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use simobridge_core::{convert, validate_phone_batch};
use simobridge_domain::{ApiCredentials, RecordType, SimoBridgeError, SourceRow, SourceValue};
use simobridge_infra::database::{init_schema, DbPool, PoolConfig};
use simobridge_infra::{HttpClient, RequestDispatcher, SqliteApiConfigStore, SqliteTokenStore, TokenManager};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    _temp_dir: TempDir,
    config_store: Arc<SqliteApiConfigStore>,
    token_store: Arc<SqliteTokenStore>,
}

async fn harness() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let pool = Arc::new(
        DbPool::new(temp_dir.path().join("config.db"), PoolConfig::default()).unwrap(),
    );
    init_schema(&pool).unwrap();

    let config_store = Arc::new(SqliteApiConfigStore::new(Arc::clone(&pool)));
    config_store
        .save_credentials(ApiCredentials {
            username: "reporter".to_string(),
            password: "secret".to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
        })
        .await
        .unwrap();

    Harness {
        _temp_dir: temp_dir,
        config_store,
        token_store: Arc::new(SqliteTokenStore::new(pool)),
    }
}

fn dispatcher(harness: &Harness) -> RequestDispatcher {
    let http = HttpClient::from_config(&simobridge_domain::HttpConfig::default()).unwrap();
    let token_store: Arc<dyn simobridge_core::TokenStore> = harness.token_store.clone();
    let config_store: Arc<dyn simobridge_core::ApiConfigStore> =
        harness.config_store.clone();
    let manager = Arc::new(TokenManager::new(token_store, Arc::clone(&config_store), http.clone()));
    RequestDispatcher::new(config_store, manager, http)
}

fn source_row(entries: &[(&str, &str)]) -> SourceRow {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), SourceValue::Text(v.to_string())))
        .collect()
}

#[tokio::test]
async fn converts_and_submits_a_batch_through_the_full_stack() {
    let server = MockServer::start().await;
    let h = harness().await;

    // Token exchange: Basic auth from the stored consumer pair, password
    // grant from the stored username/password. Expected exactly once even
    // though we submit twice.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("Authorization", format!("Basic {}", BASE64.encode("ck:cs"))))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=reporter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "issued-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/simo/012"))
        .and(header("Authorization", "Bearer issued-token"))
        .and(header_exists("maYeuCau"))
        .and(header_exists("kyBaoCao"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok"
        })))
        .expect(2)
        .mount(&server)
        .await;

    h.config_store
        .set_endpoint("token", &format!("{}/oauth/token", server.uri()))
        .await
        .unwrap();
    h.config_store
        .set_endpoint("simo_012", &format!("{}/simo/012", server.uri()))
        .await
        .unwrap();

    let rows = vec![
        source_row(&[
            ("Cif", "123"),
            ("SoTaiKhoan", "0001"),
            ("TenKhachHang", "Nguyen Van A"),
            ("TrangThaiHoatDongTaiKhoan", "1"),
            ("NghiNgo", ""),
            ("GhiChu", ""),
        ]),
        // Nothing matching the 012 schema: dropped during conversion.
        source_row(&[("Unrelated", "x")]),
    ];

    let records = convert(&rows, RecordType::Simo012);
    assert_eq!(records.len(), 1);
    assert!(records[0].get("NghiNgo").is_none());

    let report = validate_phone_batch(&records);
    assert!(report.is_valid);

    let dispatcher = dispatcher(&h);

    let body = dispatcher.submit(RecordType::Simo012, &records).await.unwrap();
    assert_eq!(body["status"], serde_json::json!("ok"));

    // Second submission reuses the persisted token: no second exchange.
    dispatcher.submit(RecordType::Simo012, &records).await.unwrap();

    let stored = h.token_store.latest_token().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "issued-token");
    assert_eq!(stored.id, 1);
}

#[tokio::test]
async fn missing_submission_endpoint_fails_whole_batch() {
    let server = MockServer::start().await;
    let h = harness().await;

    h.config_store
        .set_endpoint("token", &format!("{}/oauth/token", server.uri()))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "issued-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let records = convert(
        &[source_row(&[("Cif", "123")])],
        RecordType::Simo003,
    );

    let err = dispatcher(&h).submit(RecordType::Simo003, &records).await.unwrap_err();
    assert!(matches!(err, SimoBridgeError::EndpointNotConfigured(name) if name == "simo_003"));
}

#[tokio::test]
async fn remote_rejection_surfaces_the_error_field() {
    let server = MockServer::start().await;
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "issued-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/simo/002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "period already reported"
        })))
        .mount(&server)
        .await;

    h.config_store
        .set_endpoint("token", &format!("{}/oauth/token", server.uri()))
        .await
        .unwrap();
    h.config_store
        .set_endpoint("simo_002", &format!("{}/simo/002", server.uri()))
        .await
        .unwrap();

    let records = convert(
        &[source_row(&[("Cif", "123"), ("NghiNgo", "")])],
        RecordType::Simo002,
    );
    // The 002 shape defaults the suspicion flag rather than dropping it.
    assert_eq!(records[0].get("NghiNgo"), Some(&serde_json::json!(0)));

    let err = dispatcher(&h).submit(RecordType::Simo002, &records).await.unwrap_err();
    assert!(matches!(err, SimoBridgeError::RemoteRejection(msg) if msg.contains("already reported")));
}
