//! `WhatsApp` webhook handler
//!
//! GET verifies the subscription handshake; POST receives event envelopes.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::ApiState;
use crate::channels::whatsapp::WhatsAppWebhook;
use crate::ingest::IngestJob;
use crate::{Error, Result};

/// Canned reply sent for every inbound message with a sender
const WELCOME_TEXT: &str = "Welcome in AgriBot how can i help you?";

/// Fixed rejection body for a failed handshake
const VERIFICATION_FAILED: &str = "Verification failed";

/// Handshake query parameters
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub hub_mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub hub_verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub hub_challenge: Option<String>,
}

/// Decide the handshake outcome
///
/// Accepts only `mode == "subscribe"` with a matching token and a non-empty
/// challenge, and returns the challenge to echo. Pure function, no side
/// effects.
///
/// # Errors
///
/// Returns `Error::Handshake` describing the first failed condition
pub fn verify_handshake(query: &VerifyQuery, expected_token: &str) -> Result<String> {
    if query.hub_mode.as_deref() != Some("subscribe") {
        return Err(Error::Handshake("mode is not subscribe".to_string()));
    }

    if query.hub_verify_token.as_deref() != Some(expected_token) {
        return Err(Error::Handshake("verify token mismatch".to_string()));
    }

    match query.hub_challenge.as_deref() {
        Some(challenge) if !challenge.is_empty() => Ok(challenge.to_string()),
        _ => Err(Error::Handshake("challenge missing".to_string())),
    }
}

/// Handle the subscription handshake (GET /webhook)
pub async fn verify(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    match verify_handshake(&query, &state.verify_token) {
        Ok(challenge) => (StatusCode::OK, challenge).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "webhook verification failed");
            (StatusCode::FORBIDDEN, VERIFICATION_FAILED).into_response()
        }
    }
}

/// Handle an inbound event envelope (POST /webhook)
///
/// Any error in the processing sequence is caught here and collapsed into a
/// 500 carrying the error's message.
pub async fn receive(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<WhatsAppWebhook>,
) -> Response {
    match receive_inner(&state, payload).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn receive_inner(state: &ApiState, payload: WhatsAppWebhook) -> Result<Response> {
    let entry = payload
        .entry
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedInput("envelope has no entries".to_string()))?;

    let change = entry
        .changes
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedInput("entry has no changes".to_string()))?;

    let Some(message) = change
        .value
        .messages
        .unwrap_or_default()
        .into_iter()
        .next()
    else {
        return Ok((StatusCode::OK, Json(json!("No messages to process"))).into_response());
    };

    let sender = message.from.clone();
    let whatsapp_message_id = message.id.clone();
    let text = message
        .text
        .as_ref()
        .map(|t| t.body.clone())
        .unwrap_or_default();

    // Synchronous insert; the row survives any later failure in this handler
    let log = state
        .message_repo
        .insert(sender.as_deref(), &text, whatsapp_message_id.as_deref())?;

    tracing::info!(
        log_id = %log.id,
        from = ?sender,
        wa_message_id = ?whatsapp_message_id,
        "message logged"
    );

    if message.message_type.as_deref() == Some("image") {
        let image = message.image.as_ref().ok_or_else(|| {
            Error::MalformedInput("image message has no image payload".to_string())
        })?;

        if let Some(ingestor) = &state.ingestor {
            ingestor.spawn(IngestJob {
                sender: sender.clone(),
                message_log_id: log.id.clone(),
                whatsapp_message_id: whatsapp_message_id.clone(),
                media_id: image.id.clone(),
                mime_type: image.mime_type.clone(),
            });
        } else {
            tracing::warn!(
                media_id = %image.id,
                "object storage not configured, skipping media ingestion"
            );
        }
    }

    // The welcome reply is awaited on the critical path; a transport failure
    // here turns into the 500 path above
    if let Some(to) = sender.as_deref() {
        let (status, _body) = state.whatsapp.send_text(to, WELCOME_TEXT).await?;
        tracing::debug!(to, status = status.as_u16(), "welcome reply sent");
    }

    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))).into_response())
}
