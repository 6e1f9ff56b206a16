//! nanit-core - session handling and login flow for the Nanit care toolkit.
//!
//! All authenticated data access goes through an [`Authenticator`], which
//! reads tokens from a [`SessionStore`] and refreshes them once when the
//! vendor answers 401. Logging in is driven by a [`LoginFlow`], which handles
//! the optional MFA step. The vendor itself sits behind the [`VendorApi`]
//! trait and token persistence behind [`TokenStorage`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nanit_core::{Authenticator, Credentials, LoginFlow, LoginState, MemoryStorage, SessionStore, VendorApi};
//!
//! # async fn example<V: VendorApi>(api: Arc<V>) -> nanit_core::Result<()> {
//! let session = Arc::new(SessionStore::new(MemoryStorage::new()));
//!
//! let mut flow = LoginFlow::new(Arc::clone(&api), Arc::clone(&session));
//! flow.submit_credentials(Credentials::new("parent@example.com", "pw"))
//!     .await?;
//! if flow.challenge().is_some() {
//!     flow.submit_code("123456").await?;
//! }
//! assert_eq!(flow.state(), &LoginState::Authenticated);
//!
//! let auth = Authenticator::new(api, session);
//! for baby in auth.babies().await? {
//!     println!("{}", baby.display_name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod care;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod login;
pub mod session;
pub mod storage;
pub mod tokens;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use authenticator::Authenticator;
pub use care::{Baby, CareEvent, CareKind, CareSummary, DiaperKind};
pub use credentials::Credentials;
pub use error::Error;
pub use flow::{LoginFlow, LoginState, PendingMfa};
pub use login::{LoginResult, MfaChallenge};
pub use session::SessionStore;
pub use storage::MemoryStorage;
pub use tokens::{AccessToken, RefreshToken, TokenPair};
pub use traits::{TokenStorage, VendorApi};
pub use types::{ApiUrl, BabyUid, TimeRange};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
