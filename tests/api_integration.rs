//! Integration tests for the docseq API.
//!
//! These tests spin up a real server instance and make HTTP requests to verify
//! the complete request/response cycle.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

use docseq::api::{AppState, create_router};
use docseq::config::{
    AllocatorConfig, AppConfig, AuthConfig, FileStorageConfig, ObservabilityConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
use docseq::storage::create_storage;

// ============================================================================
// Test Harness
// ============================================================================

/// Test server instance.
struct TestServer {
    addr: SocketAddr,
    client: Client,
    admin_token: String,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let admin_token = "test_admin_token_12345".to_string();

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".parse().unwrap(),
                port: 0,
            },
            storage: StorageConfig {
                backend: StorageBackend::File,
                file: FileStorageConfig {
                    data_dir: temp_dir.path().to_path_buf(),
                },
            },
            allocator: AllocatorConfig {
                max_attempts: 1000,
                preview_limit: 100,
            },
            auth: AuthConfig {
                admin_token: admin_token.clone(),
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                log_format: "text".to_string(),
                metrics_enabled: false,
            },
        };

        let storage = create_storage(&config.storage)
            .await
            .expect("Failed to create storage");

        let state = AppState::new(Arc::new(config), storage, None);
        let app = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr,
            client: Client::new(),
            admin_token,
            _temp_dir: temp_dir,
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn get_admin(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .header("Authorization", format!("Bearer {}", self.admin_token))
            .send()
            .await
            .expect("Request failed")
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    async fn post_admin<T: Serialize>(&self, path: &str, body: &T) -> Response {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .header("Authorization", format!("Bearer {}", self.admin_token))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Allocate one identifier, expecting success.
    async fn allocate(&self, document_type: &str) -> String {
        let response = self
            .get(&format!("/v1/sequence/next?document_type={document_type}"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: ApiResponse<IdentifierData> = response.json().await.unwrap();
        assert!(body.is_success());
        body.data.unwrap().identifier
    }
}

/// API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i32,
    #[allow(dead_code)]
    message: String,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn is_success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Deserialize)]
struct IdentifierData {
    document_type: String,
    identifier: String,
}

// ============================================================================
// Health Endpoint Tests
// ============================================================================

#[derive(Debug, Deserialize)]
struct HealthData {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ReadyData {
    ready: bool,
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<HealthData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert_eq!(body.data.unwrap().status, "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<ReadyData> = response.json().await.unwrap();
    assert!(body.is_success());
    assert!(body.data.unwrap().ready);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = response.text().await.unwrap();
    assert!(text.contains("docseq_up"));
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_unauthorized_access_to_admin() {
    let server = TestServer::new().await;
    let response = server.get("/v1/admin/config?document_type=invoice").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_admin_token() {
    let server = TestServer::new().await;
    let response = server
        .client
        .get(format!(
            "{}/v1/admin/config?document_type=invoice",
            server.base_url()
        ))
        .header("Authorization", "Bearer wrong_token")
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sequence_routes_do_not_require_auth() {
    let server = TestServer::new().await;
    let response = server.get("/v1/sequence/next?document_type=invoice").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Allocation Tests
// ============================================================================

#[tokio::test]
async fn test_allocate_materializes_default_config() {
    let server = TestServer::new().await;

    let id = server.allocate("invoice").await;
    assert_eq!(id, "INV-000001");

    // The default config is now visible through the admin surface.
    let response = server.get_admin("/v1/admin/config?document_type=invoice").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<serde_json::Value> = response.json().await.unwrap();
    let config = body.data.unwrap();
    assert_eq!(config["prefix"], "INV");
    assert_eq!(config["format"], "prefix-sequential");
    assert_eq!(config["pad_length"], 6);
}

#[tokio::test]
async fn test_allocate_monotonic_cursor() {
    let server = TestServer::new().await;

    assert_eq!(server.allocate("customer").await, "CUS-000001");
    assert_eq!(server.allocate("customer").await, "CUS-000002");
    assert_eq!(server.allocate("customer").await, "CUS-000003");
}

#[tokio::test]
async fn test_allocate_independent_per_type() {
    let server = TestServer::new().await;

    assert_eq!(server.allocate("invoice").await, "INV-000001");
    assert_eq!(server.allocate("customer").await, "CUS-000001");
    assert_eq!(server.allocate("invoice").await, "INV-000002");
}

#[tokio::test]
async fn test_allocate_with_year_format() {
    let server = TestServer::new().await;

    let response = server
        .post_admin(
            "/v1/admin/config",
            &json!({
                "document_type": "invoice",
                "format": "prefix-year-sequential",
                "pad_length": 4
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let id = server.allocate("invoice").await;
    let year = chrono::Utc::now().format("%Y").to_string();
    assert_eq!(id, format!("INV-{year}-0001"));
}

#[tokio::test]
async fn test_allocate_with_custom_pattern() {
    let server = TestServer::new().await;

    let response = server
        .post_admin(
            "/v1/admin/config",
            &json!({
                "document_type": "commission",
                "format": "custom",
                "custom_pattern": "{prefix}/{date}/{sequence}",
                "date_format": "YYYYMM",
                "pad_length": 4
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let id = server.allocate("commission").await;
    let yearmonth = chrono::Utc::now().format("%Y%m").to_string();
    assert_eq!(id, format!("COM/{yearmonth}/0001"));
}

#[tokio::test]
async fn test_allocate_inactive_config_conflict() {
    let server = TestServer::new().await;

    server.allocate("quote").await;

    let response = server
        .post_admin(
            "/v1/admin/config",
            &json!({"document_type": "quote", "is_active": false}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.get("/v1/sequence/next?document_type=quote").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: ApiResponse<IdentifierData> = response.json().await.unwrap();
    assert_eq!(body.code, 1002);
}

#[tokio::test]
async fn test_allocate_missing_document_type() {
    let server = TestServer::new().await;
    let response = server.get("/v1/sequence/next?document_type=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Reservation Tests
// ============================================================================

#[tokio::test]
async fn test_reservation_is_skipped_by_allocation() {
    let server = TestServer::new().await;

    // Materialize the default config, then reserve the third number.
    let response = server
        .post_admin("/v1/admin/config", &json!({"document_type": "shipment", "prefix": "PFX"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .post(
            "/v1/sequence/reserve",
            &json!({"document_type": "shipment", "identifier": "PFX-000003"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(server.allocate("shipment").await, "PFX-000001");
    assert_eq!(server.allocate("shipment").await, "PFX-000002");
    // The reserved number is skipped silently.
    assert_eq!(server.allocate("shipment").await, "PFX-000004");
}

#[tokio::test]
async fn test_reserve_conflict() {
    let server = TestServer::new().await;

    let request = json!({"document_type": "invoice", "identifier": "INV-000009"});

    let response = server.post("/v1/sequence/reserve", &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.post("/v1/sequence/reserve", &request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: ApiResponse<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(body.code, 4001);
}

#[tokio::test]
async fn test_reserve_rejects_mismatched_shape() {
    let server = TestServer::new().await;

    // Wrong prefix for the invoice defaults.
    let response = server
        .post(
            "/v1/sequence/reserve",
            &json!({"document_type": "invoice", "identifier": "XYZ-000001"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Numeric tail narrower than the default pad length.
    let response = server
        .post(
            "/v1/sequence/reserve",
            &json!({"document_type": "invoice", "identifier": "INV-01"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[derive(Debug, Deserialize)]
struct ReleaseData {
    released: bool,
}

#[tokio::test]
async fn test_release() {
    let server = TestServer::new().await;

    let id = server.allocate("invoice").await;

    let request = json!({"document_type": "invoice", "identifier": id});

    let response = server.post("/v1/sequence/release", &request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<ReleaseData> = response.json().await.unwrap();
    assert!(body.data.unwrap().released);

    // Releasing again reports the identifier as absent.
    let response = server.post("/v1/sequence/release", &request).await;
    let body: ApiResponse<ReleaseData> = response.json().await.unwrap();
    assert!(!body.data.unwrap().released);

    // The counter does not rewind.
    assert_eq!(server.allocate("invoice").await, "INV-000002");
}

// ============================================================================
// Preview Tests
// ============================================================================

#[derive(Debug, Deserialize)]
struct PreviewData {
    candidates: Vec<String>,
}

#[tokio::test]
async fn test_preview_is_idempotent() {
    let server = TestServer::new().await;

    let response = server
        .get("/v1/sequence/preview?document_type=invoice&count=5")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let first: ApiResponse<PreviewData> = response.json().await.unwrap();

    let response = server
        .get("/v1/sequence/preview?document_type=invoice&count=5")
        .await;
    let second: ApiResponse<PreviewData> = response.json().await.unwrap();

    let first = first.data.unwrap().candidates;
    let second = second.data.unwrap().candidates;
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec!["INV-000001", "INV-000002", "INV-000003", "INV-000004", "INV-000005"]
    );
}

#[tokio::test]
async fn test_preview_advances_with_cursor() {
    let server = TestServer::new().await;

    server.allocate("invoice").await;

    let response = server
        .get("/v1/sequence/preview?document_type=invoice&count=2")
        .await;
    let body: ApiResponse<PreviewData> = response.json().await.unwrap();
    assert_eq!(
        body.data.unwrap().candidates,
        vec!["INV-000002", "INV-000003"]
    );
}

#[tokio::test]
async fn test_preview_count_validation() {
    let server = TestServer::new().await;

    let response = server
        .get("/v1/sequence/preview?document_type=invoice&count=0")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .get("/v1/sequence/preview?document_type=invoice&count=101")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Admin Config Tests
// ============================================================================

#[tokio::test]
async fn test_get_nonexistent_config() {
    let server = TestServer::new().await;
    let response = server
        .get_admin("/v1/admin/config?document_type=nonexistent")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_config_rejects_invalid_custom_pattern() {
    let server = TestServer::new().await;

    // Custom format without {sequence} in the pattern.
    let response = server
        .post_admin(
            "/v1/admin/config",
            &json!({
                "document_type": "invoice",
                "format": "custom",
                "custom_pattern": "{prefix}-FIXED"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ApiResponse<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(body.code, 1003);
}

#[tokio::test]
async fn test_update_config_rejects_date_pattern_without_date_format() {
    let server = TestServer::new().await;

    let response = server
        .post_admin(
            "/v1/admin/config",
            &json!({
                "document_type": "invoice",
                "format": "custom",
                "custom_pattern": "{prefix}-{date}-{sequence}"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_format_change_does_not_rewrite_issued_identifiers() {
    let server = TestServer::new().await;

    let before = server.allocate("invoice").await;
    assert_eq!(before, "INV-000001");

    server
        .post_admin(
            "/v1/admin/config",
            &json!({"document_type": "invoice", "separator": "/", "pad_length": 4}),
        )
        .await;

    // The already-issued identifier stays reserved under its old shape;
    // new allocations pick up the new shape.
    assert_eq!(server.allocate("invoice").await, "INV/0002");

    let response = server
        .post(
            "/v1/sequence/release",
            &json!({"document_type": "invoice", "identifier": "INV-000001"}),
        )
        .await;
    let body: ApiResponse<ReleaseData> = response.json().await.unwrap();
    assert!(body.data.unwrap().released);
}

#[tokio::test]
async fn test_list_configs() {
    let server = TestServer::new().await;

    server.allocate("invoice").await;
    server.allocate("customer").await;

    let response = server.get_admin("/v1/admin/config/list").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<Vec<serde_json::Value>> = response.json().await.unwrap();
    let configs = body.data.unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0]["document_type"], "customer");
    assert_eq!(configs[1]["document_type"], "invoice");
}

// ============================================================================
// Bulk Format Tests
// ============================================================================

#[derive(Debug, Deserialize)]
struct BulkFailureData {
    document_type: String,
    #[allow(dead_code)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct BulkFormatData {
    updated: Vec<String>,
    failed: Vec<BulkFailureData>,
}

#[tokio::test]
async fn test_bulk_format_applies_to_all_types() {
    let server = TestServer::new().await;

    server.allocate("invoice").await;
    server.allocate("customer").await;

    let response = server
        .post_admin(
            "/v1/admin/config/bulk-format",
            &json!({"format": "prefix-yearmonth-sequential", "separator": ".", "pad_length": 5}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<BulkFormatData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data.updated.len(), 2);
    assert!(data.failed.is_empty());

    let yearmonth = chrono::Utc::now().format("%Y%m").to_string();
    assert_eq!(
        server.allocate("invoice").await,
        format!("INV.{yearmonth}.00002")
    );
}

#[tokio::test]
async fn test_bulk_format_reports_partial_failure() {
    let server = TestServer::new().await;

    // "commission" carries a custom pattern; "invoice" does not, so switching
    // every type to the custom format can only partially succeed.
    server
        .post_admin(
            "/v1/admin/config",
            &json!({
                "document_type": "commission",
                "custom_pattern": "{prefix}#{sequence}"
            }),
        )
        .await;
    server.allocate("invoice").await;

    let response = server
        .post_admin(
            "/v1/admin/config/bulk-format",
            &json!({"format": "custom", "separator": "-", "pad_length": 4}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<BulkFormatData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data.updated, vec!["commission".to_string()]);
    assert_eq!(data.failed.len(), 1);
    assert_eq!(data.failed[0].document_type, "invoice");

    // The successful type is not rolled back.
    assert_eq!(server.allocate("commission").await, "COM#0001");
}

// ============================================================================
// Reset Tests
// ============================================================================

#[tokio::test]
async fn test_reset_requires_confirmation() {
    let server = TestServer::new().await;

    server.allocate("invoice").await;

    let response = server
        .post_admin("/v1/admin/reset", &json!({"document_type": "invoice"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was cleared.
    assert_eq!(server.allocate("invoice").await, "INV-000002");
}

#[tokio::test]
async fn test_reset_clears_counter_and_used_index() {
    let server = TestServer::new().await;

    server.allocate("invoice").await;
    server.allocate("invoice").await;

    let response = server
        .post_admin(
            "/v1/admin/reset",
            &json!({"document_type": "invoice", "confirm": true}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Numbering starts over; the old identifiers are no longer reserved.
    assert_eq!(server.allocate("invoice").await, "INV-000001");
}

#[tokio::test]
async fn test_reset_unknown_type() {
    let server = TestServer::new().await;

    let response = server
        .post_admin(
            "/v1/admin/reset",
            &json!({"document_type": "nonexistent", "confirm": true}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Statistics Tests
// ============================================================================

#[derive(Debug, Deserialize)]
struct StatisticsData {
    total_generated: i64,
    next_number_preview: String,
    used_count: u64,
}

#[tokio::test]
async fn test_statistics() {
    let server = TestServer::new().await;

    server.allocate("invoice").await;
    server.allocate("invoice").await;
    server
        .post(
            "/v1/sequence/reserve",
            &json!({"document_type": "invoice", "identifier": "INV-000100"}),
        )
        .await;

    let response = server
        .get_admin("/v1/admin/statistics?document_type=invoice")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<StatisticsData> = response.json().await.unwrap();
    let stats = body.data.unwrap();
    assert_eq!(stats.total_generated, 2);
    assert_eq!(stats.used_count, 3);
    assert_eq!(stats.next_number_preview, "INV-000003");
}

// ============================================================================
// Concurrency Tests
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc as StdArc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_concurrent_allocations_are_unique() {
    let server = StdArc::new(TestServer::new().await);

    let num_tasks = 5;
    let ids_per_task = 20;
    let barrier = StdArc::new(Barrier::new(num_tasks));

    let mut handles = Vec::new();

    for _ in 0..num_tasks {
        let server = StdArc::clone(&server);
        let barrier = StdArc::clone(&barrier);

        let handle = tokio::spawn(async move {
            barrier.wait().await;

            let mut all_ids = Vec::new();
            for _ in 0..ids_per_task {
                all_ids.push(server.allocate("stock-movement").await);
            }
            all_ids
        });

        handles.push(handle);
    }

    let mut all_ids = Vec::new();
    for handle in handles {
        let ids = handle.await.expect("Task panicked");
        all_ids.extend(ids);
    }

    let unique_ids: HashSet<String> = all_ids.iter().cloned().collect();
    assert_eq!(
        unique_ids.len(),
        all_ids.len(),
        "All identifiers should be unique"
    );
    assert_eq!(unique_ids.len(), num_tasks * ids_per_task);
}

// ============================================================================
// Edge Case Tests
// ============================================================================

#[tokio::test]
async fn test_identifier_response_echoes_document_type() {
    let server = TestServer::new().await;

    let response = server
        .get("/v1/sequence/next?document_type=goods-return")
        .await;
    let body: ApiResponse<IdentifierData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert_eq!(data.document_type, "goods-return");
    assert_eq!(data.identifier, "GOO-000001");
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::new().await;
    let response = server.get("/unknown/route").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
