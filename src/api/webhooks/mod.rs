//! Webhook endpoints for channel integrations

use std::sync::Arc;

use axum::{routing::get, Router};

use super::ApiState;

pub mod whatsapp;

/// Build webhooks router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/webhook", get(whatsapp::verify).post(whatsapp::receive))
        .with_state(state)
}
