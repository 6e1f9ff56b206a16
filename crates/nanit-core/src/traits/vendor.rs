//! Vendor API trait.

use async_trait::async_trait;

use crate::care::{Baby, CareEvent};
use crate::login::{LoginResult, MfaChallenge};
use crate::tokens::{AccessToken, RefreshToken, TokenPair};
use crate::types::{BabyUid, TimeRange};
use crate::{Credentials, Result};

/// Calls against the baby-monitor vendor, either directly or through the proxy.
///
/// Data calls fail with [`AuthError::Unauthorized`](crate::error::AuthError::Unauthorized)
/// when the vendor answers 401 and with [`UpstreamError`](crate::error::UpstreamError)
/// for any other failure status.
#[async_trait]
pub trait VendorApi: Send + Sync {
    /// Submit email and password. An MFA challenge is a result, not an error.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult>;

    /// Complete an MFA challenge with the one-time code.
    async fn verify_mfa(
        &self,
        credentials: &Credentials,
        challenge: &MfaChallenge,
        code: &str,
    ) -> Result<TokenPair>;

    /// Exchange a refresh token and the (possibly expired) access token for new tokens.
    async fn refresh(&self, access: &AccessToken, refresh: &RefreshToken) -> Result<TokenPair>;

    /// List the babies on the account.
    async fn babies(&self, token: &AccessToken) -> Result<Vec<Baby>>;

    /// Fetch care events for one baby in a time window.
    async fn calendar(
        &self,
        token: &AccessToken,
        baby: &BabyUid,
        range: TimeRange,
    ) -> Result<Vec<CareEvent>>;
}
