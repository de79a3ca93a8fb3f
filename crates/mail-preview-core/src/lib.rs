//! Core types and configuration for Mail Preview
//!
//! This crate provides:
//! - Configuration management (`Config`, environment parsing)
//! - The `Message` model rendered by previews
//! - Viewer identity / URL slug normalization
//! - MIME lookup for format negotiation
//! - Common error types

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod identity;
pub mod mime;
pub mod models;

// Re-export key types for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use identity::{canonical_identity, identity_to_slug, slug_to_identity};
pub use mime::{content_type_matches, extension_for_mime_type, mime_type_for_extension};
pub use models::Message;
