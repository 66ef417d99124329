//! `WhatsApp` channel adapter
//!
//! Uses the `WhatsApp` Business (Graph) API for outbound messages and media
//! resolution. Inbound messages arrive through the webhook endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::WhatsAppConfig;
use crate::{Error, Result};

/// Default Graph API host
const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Bounded wait for every Graph API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// `WhatsApp` channel adapter
#[derive(Clone)]
pub struct WhatsAppChannel {
    /// `WhatsApp` Business API access token
    access_token: String,
    /// Phone number ID for sending messages
    phone_number_id: String,
    /// Graph API version segment (e.g. "v17.0")
    graph_api_version: String,
    /// Graph API host, overridable for tests
    graph_base_url: String,
    client: Client,
}

impl WhatsAppChannel {
    /// Create a new `WhatsApp` channel adapter
    #[must_use]
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            graph_api_version: config.graph_api_version.clone(),
            graph_base_url: GRAPH_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Override the Graph API host (used by tests to point at a stub server)
    #[must_use]
    pub fn with_graph_base_url(mut self, url: impl Into<String>) -> Self {
        self.graph_base_url = url.into();
        self
    }

    /// Send a text message to a `WhatsApp` number
    ///
    /// Returns the provider's status code and parsed response body verbatim.
    /// A non-2xx response is ordinary return data, not a failure; only a
    /// transport-level error raises.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be completed or the response body
    /// is not valid JSON
    pub async fn send_text(&self, to: &str, text: &str) -> Result<(StatusCode, Value)> {
        let url = format!(
            "{}/{}/{}/messages",
            self.graph_base_url, self.graph_api_version, self.phone_number_id
        );

        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": {
                "body": text
            }
        });

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("WhatsApp API error: {e}")))?;

        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| Error::Upstream(format!("WhatsApp API response error: {e}")))?;

        tracing::debug!(to, status = status.as_u16(), "WhatsApp message sent");
        Ok((status, body))
    }

    /// Resolve a media id to its bytes and content type
    ///
    /// Two sequential Graph API calls: resolve the media id to a temporary
    /// signed URL, then download from it. Any non-success status aborts the
    /// fetch.
    ///
    /// # Errors
    ///
    /// Returns error if either request fails or no download URL is present
    /// in the metadata response
    pub async fn fetch_media(&self, media_id: &str) -> Result<(Vec<u8>, String)> {
        let meta_url = format!(
            "{}/{}/{}?phone_number_id={}",
            self.graph_base_url, self.graph_api_version, media_id, self.phone_number_id
        );

        let meta_response = self
            .client
            .get(&meta_url)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("media metadata error: {e}")))?;

        if !meta_response.status().is_success() {
            return Err(Error::Upstream(format!(
                "media metadata error: {}",
                meta_response.status()
            )));
        }

        let metadata = meta_response
            .json::<Value>()
            .await
            .map_err(|e| Error::Upstream(format!("media metadata response error: {e}")))?;

        let media_url = metadata
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::Upstream("media URL not found in metadata response".to_string())
            })?;

        let media_response = self
            .client
            .get(media_url)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("media download error: {e}")))?;

        if !media_response.status().is_success() {
            return Err(Error::Upstream(format!(
                "media download error: {}",
                media_response.status()
            )));
        }

        let content_type = media_response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = media_response
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("media download error: {e}")))?;

        Ok((bytes.to_vec(), content_type))
    }
}

/// `WhatsApp` webhook payload from the Cloud API
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhook {
    /// Webhook entries
    #[serde(default)]
    pub entry: Vec<WhatsAppWebhookEntry>,
}

/// `WhatsApp` webhook entry
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhookEntry {
    /// Changes in this entry
    #[serde(default)]
    pub changes: Vec<WhatsAppWebhookChange>,
}

/// `WhatsApp` webhook change
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhookChange {
    /// The change value
    #[serde(default)]
    pub value: WhatsAppWebhookValue,
}

/// `WhatsApp` webhook value containing messages
#[derive(Debug, Default, Deserialize)]
pub struct WhatsAppWebhookValue {
    /// Incoming messages (if any)
    pub messages: Option<Vec<WhatsAppMessage>>,
}

/// `WhatsApp` message
#[derive(Debug, Deserialize)]
pub struct WhatsAppMessage {
    /// Sender phone number
    pub from: Option<String>,
    /// Message ID
    pub id: Option<String>,
    /// Message type
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    /// Text content (for text messages)
    pub text: Option<WhatsAppTextContent>,
    /// Image content
    pub image: Option<WhatsAppMedia>,
}

/// `WhatsApp` media object
#[derive(Debug, Deserialize)]
pub struct WhatsAppMedia {
    /// Media ID (use to fetch URL)
    pub id: String,
    /// Declared MIME type
    pub mime_type: Option<String>,
}

/// `WhatsApp` text message content
#[derive(Debug, Deserialize)]
pub struct WhatsAppTextContent {
    /// Message body
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_deserializes() {
        let payload = serde_json::json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{
                            "from": "15551234567",
                            "id": "wamid.abc",
                            "type": "image",
                            "image": { "id": "media-1", "mime_type": "image/jpeg" }
                        }]
                    }
                }]
            }]
        });

        let webhook: WhatsAppWebhook = serde_json::from_value(payload).unwrap();
        let message = webhook.entry[0].changes[0].value.messages.as_ref().unwrap();
        assert_eq!(message[0].from.as_deref(), Some("15551234567"));
        assert_eq!(message[0].message_type.as_deref(), Some("image"));
        assert_eq!(message[0].image.as_ref().unwrap().id, "media-1");
    }

    #[test]
    fn test_envelope_tolerates_missing_fields() {
        let webhook: WhatsAppWebhook = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(webhook.entry.is_empty());

        let webhook: WhatsAppWebhook =
            serde_json::from_value(serde_json::json!({"entry": [{"changes": [{}]}]})).unwrap();
        assert!(webhook.entry[0].changes[0].value.messages.is_none());
    }
}
