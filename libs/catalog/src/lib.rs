//! # imgvault-catalog
//!
//! Authenticated, retryable HTTP access to the vendor image catalog.
//!
//! The catalog exposes three read endpoints (images by release and
//! architecture, images by content-set, and a redirect-style download
//! endpoint keyed by checksum) plus an OAuth token-exchange endpoint.
//! This crate wraps them behind:
//!
//! - [`TokenBroker`]: exchanges a long-lived offline token for short-lived
//!   bearer tokens and caches them until shortly before expiry.
//! - [`CatalogClient`]: attaches the bearer credential to every call and
//!   retries transport failures and 5xx responses with bounded backoff.
//!
//! # Invariants
//!
//! - "Release does not exist" (404 or empty list) is a normal outcome,
//!   not an error; discovery probing relies on it
//! - Authentication failures are never retried
//! - Secret material never appears in errors, `Debug` output, or logs

mod auth;
mod client;
mod config;
mod error;

pub use auth::TokenBroker;
pub use client::{CatalogClient, DownloadHandle};
pub use config::CatalogConfig;
pub use error::CatalogError;
