//! nanit-http - reqwest-backed [`VendorApi`](nanit_core::VendorApi) for the
//! Nanit API.
//!
//! [`NanitClient`] talks either to the vendor directly
//! ([`ApiFlavor::Upstream`]) or to a nanit proxy ([`ApiFlavor::Proxy`]), which
//! exposes the same operations under `/api` with bearer tokens.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nanit_core::{Authenticator, MemoryStorage, SessionStore};
//! use nanit_http::NanitClient;
//!
//! # async fn example() -> nanit_core::Result<()> {
//! let api = Arc::new(NanitClient::upstream()?);
//! let session = Arc::new(SessionStore::new(MemoryStorage::new()));
//! let auth = Authenticator::new(api, session);
//! let babies = auth.babies().await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
pub mod endpoints;
mod vendor;

pub use client::{HttpClient, Reply};
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use endpoints::ApiFlavor;
pub use vendor::NanitClient;
