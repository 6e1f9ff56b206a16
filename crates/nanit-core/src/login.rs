//! Outcomes of the password step of the login handshake.

use serde::Serialize;

use crate::tokens::TokenPair;

/// The second-factor challenge issued when a password login needs MFA.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct MfaChallenge {
    /// Opaque token tying the code submission to this login attempt.
    #[serde(skip)]
    pub mfa_token: String,
    /// Delivery channel for the code, e.g. `sms`.
    pub channel: String,
    /// Last digits of the phone the code was sent to, for display.
    pub phone_suffix: Option<String>,
}

impl MfaChallenge {
    pub fn new(
        mfa_token: impl Into<String>,
        channel: impl Into<String>,
        phone_suffix: Option<String>,
    ) -> Self {
        Self {
            mfa_token: mfa_token.into(),
            channel: channel.into(),
            phone_suffix,
        }
    }
}

impl std::fmt::Debug for MfaChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MfaChallenge")
            .field("mfa_token", &"[REDACTED]")
            .field("channel", &self.channel)
            .field("phone_suffix", &self.phone_suffix)
            .finish()
    }
}

/// Result of submitting email and password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    /// The vendor issued tokens directly.
    Authenticated(TokenPair),
    /// A one-time code must be submitted before tokens are issued.
    MfaRequired(MfaChallenge),
}
