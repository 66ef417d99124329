//! Media ingestion pipeline integration tests

use axum::{http::header, routing::get, Json, Router};
use serde_json::json;

use agribot_gateway::config::StorageConfig;
use agribot_gateway::db::{MediaRepo, MessageLogRepo};
use agribot_gateway::{Error, IngestJob, MediaIngestor, ObjectStore, WhatsAppChannel};

mod common;
use common::{dead_endpoint, setup_test_db, test_whatsapp_config};

/// Storage settings pointing at an endpoint nothing serves
async fn unreachable_storage() -> StorageConfig {
    StorageConfig {
        access_key_id: "test-key".to_string(),
        secret_access_key: "test-secret".to_string(),
        bucket: "test-bucket".to_string(),
        endpoint_url: dead_endpoint().await,
    }
}

/// Spawn a stub Graph server whose media metadata has no download URL
async fn spawn_stub_graph_without_url() -> String {
    let app = Router::new().route(
        "/v17.0/{media_id}",
        get(|| async { Json(json!({"messaging_product": "whatsapp"})) }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub server");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });

    format!("http://{addr}")
}

/// Spawn a stub Graph server resolving media ids to a served download
async fn spawn_stub_graph_with_media() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub server");
    let addr = listener.local_addr().expect("no local addr");
    let download_url = format!("http://{addr}/download");

    let app = Router::new()
        .route(
            "/v17.0/{media_id}",
            get(move || {
                let url = download_url.clone();
                async move { Json(json!({"url": url})) }
            }),
        )
        .route(
            "/download",
            get(|| async { ([(header::CONTENT_TYPE, "image/jpeg")], &b"jpeg-bytes"[..]) }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });

    format!("http://{addr}")
}

fn job(message_log_id: &str) -> IngestJob {
    IngestJob {
        sender: Some("15551234567".to_string()),
        message_log_id: message_log_id.to_string(),
        whatsapp_message_id: Some("wamid.abc".to_string()),
        media_id: "media-1".to_string(),
        mime_type: Some("image/jpeg".to_string()),
    }
}

#[tokio::test]
async fn test_fetch_media_resolves_and_downloads() {
    let graph = spawn_stub_graph_with_media().await;
    let channel = WhatsAppChannel::new(&test_whatsapp_config()).with_graph_base_url(&graph);

    let (bytes, content_type) = channel.fetch_media("media-1").await.unwrap();

    assert_eq!(bytes, b"jpeg-bytes");
    assert_eq!(content_type, "image/jpeg");
}

#[tokio::test]
async fn test_fetch_media_fails_without_url() {
    let graph = spawn_stub_graph_without_url().await;
    let channel = WhatsAppChannel::new(&test_whatsapp_config()).with_graph_base_url(&graph);

    let err = channel.fetch_media("media-1").await.unwrap_err();

    assert!(matches!(err, Error::Upstream(_)));
    assert!(err.to_string().contains("media URL not found"));
}

#[tokio::test]
async fn test_ingest_aborts_before_upload_when_unresolvable() {
    let graph = spawn_stub_graph_without_url().await;
    let db = setup_test_db();

    let log = MessageLogRepo::new(db.clone())
        .insert(Some("15551234567"), "photo", Some("wamid.abc"))
        .unwrap();

    let media_repo = MediaRepo::new(db);
    let ingestor = MediaIngestor::new(
        WhatsAppChannel::new(&test_whatsapp_config()).with_graph_base_url(&graph),
        ObjectStore::new(&unreachable_storage().await),
        media_repo.clone(),
    );

    let err = ingestor.ingest(job(&log.id)).await.unwrap_err();

    // The fetch failed, so neither the upload nor the media row happened
    assert!(matches!(err, Error::Upstream(_)));
    assert_eq!(media_repo.count().unwrap(), 0);
}

#[tokio::test]
async fn test_ingest_surfaces_storage_failure() {
    let graph = spawn_stub_graph_with_media().await;
    let db = setup_test_db();

    let log = MessageLogRepo::new(db.clone())
        .insert(Some("15551234567"), "photo", Some("wamid.abc"))
        .unwrap();

    let media_repo = MediaRepo::new(db);
    let ingestor = MediaIngestor::new(
        WhatsAppChannel::new(&test_whatsapp_config()).with_graph_base_url(&graph),
        ObjectStore::new(&unreachable_storage().await),
        media_repo.clone(),
    );

    let err = ingestor.ingest(job(&log.id)).await.unwrap_err();

    assert!(matches!(err, Error::Storage(_)));
    assert_eq!(media_repo.count().unwrap(), 0);
}
