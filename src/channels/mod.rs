//! Messaging channel adapters

pub mod whatsapp;

pub use whatsapp::WhatsAppChannel;
