//! AgriBot Gateway - WhatsApp webhook bridge
//!
//! This library provides the core functionality for the gateway:
//! - Webhook handshake verification and event receipt
//! - Message log persistence
//! - Asynchronous media ingestion into object storage
//! - Outbound replies via the WhatsApp Business API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              WhatsApp Cloud API (webhook)           │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 AgriBot Gateway                     │
//! │   Webhook  │  Message Log  │  Media Ingestion      │
//! └──────┬──────────────┬──────────────────┬───────────┘
//!        │              │                  │
//!   Graph API        SQLite        S3-compatible bucket
//! ```

pub mod api;
pub mod channels;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod storage;

pub use api::{ApiServer, ApiState};
pub use channels::WhatsAppChannel;
pub use config::{Config, StorageConfig, WhatsAppConfig};
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use ingest::{IngestJob, MediaIngestor};
pub use storage::ObjectStore;
