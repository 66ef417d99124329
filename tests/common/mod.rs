//! Shared test utilities

use agribot_gateway::config::WhatsAppConfig;
use agribot_gateway::{db, DbPool};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// WhatsApp settings used across tests
#[must_use]
pub fn test_whatsapp_config() -> WhatsAppConfig {
    WhatsAppConfig {
        verify_token: "test-verify-token".to_string(),
        access_token: "test-access-token".to_string(),
        phone_number_id: "12345".to_string(),
        graph_api_version: "v17.0".to_string(),
    }
}

/// Bind and immediately drop a listener, yielding a URL nothing serves
///
/// Requests against it fail at the transport level (connection refused).
#[allow(dead_code)]
pub async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");
    drop(listener);
    format!("http://{addr}")
}
