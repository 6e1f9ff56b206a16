//! Two-step login: password, then an optional one-time code.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::{Error, InvalidInputError};
use crate::login::{LoginResult, MfaChallenge};
use crate::session::SessionStore;
use crate::tokens::TokenPair;
use crate::traits::{TokenStorage, VendorApi};
use crate::{Credentials, Result};

/// Where the login handshake currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    AwaitingCredentials,
    AwaitingMfaCode(PendingMfa),
    Authenticated,
}

/// Credentials and challenge held between the password and code steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMfa {
    credentials: Credentials,
    challenge: MfaChallenge,
}

impl PendingMfa {
    pub fn challenge(&self) -> &MfaChallenge {
        &self.challenge
    }

    pub fn email(&self) -> &str {
        self.credentials.email()
    }
}

/// Drives the login handshake and stores the resulting tokens.
///
/// Failures leave the state where it was and are kept in
/// [`last_error`](Self::last_error) for display.
pub struct LoginFlow<V, S> {
    api: Arc<V>,
    session: Arc<SessionStore<S>>,
    state: LoginState,
    last_error: Option<String>,
}

impl<V: VendorApi, S: TokenStorage> LoginFlow<V, S> {
    pub fn new(api: Arc<V>, session: Arc<SessionStore<S>>) -> Self {
        Self {
            api,
            session,
            state: LoginState::AwaitingCredentials,
            last_error: None,
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// The message of the most recent failed step, cleared on the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The pending challenge while a code is awaited.
    pub fn challenge(&self) -> Option<&MfaChallenge> {
        match &self.state {
            LoginState::AwaitingMfaCode(pending) => Some(pending.challenge()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == LoginState::Authenticated
    }

    /// Submit email and password.
    #[instrument(skip_all, fields(email = %credentials.email()))]
    pub async fn submit_credentials(&mut self, credentials: Credentials) -> Result<&LoginState> {
        if self.state != LoginState::AwaitingCredentials {
            return Err(Error::invalid_state("credentials were already accepted"));
        }

        let result = self.api.login(&credentials).await;
        let outcome = match result {
            Ok(LoginResult::Authenticated(pair)) => self.complete(pair),
            Ok(LoginResult::MfaRequired(challenge)) => {
                info!(channel = %challenge.channel, "MFA code required");
                self.state = LoginState::AwaitingMfaCode(PendingMfa {
                    credentials,
                    challenge,
                });
                Ok(())
            }
            Err(err) => Err(err),
        };

        self.settle(outcome)
    }

    /// Submit the one-time code for the pending challenge.
    #[instrument(skip_all)]
    pub async fn submit_code(&mut self, code: &str) -> Result<&LoginState> {
        let LoginState::AwaitingMfaCode(pending) = &self.state else {
            return Err(Error::invalid_state("no MFA challenge is pending"));
        };

        let code = code.trim();
        let outcome = if code.is_empty() {
            Err(InvalidInputError::Other {
                message: "MFA code cannot be empty".to_string(),
            }
            .into())
        } else {
            let result = self
                .api
                .verify_mfa(&pending.credentials, &pending.challenge, code)
                .await;
            match result {
                Ok(pair) => self.complete(pair),
                Err(err) => Err(err),
            }
        };

        self.settle(outcome)
    }

    /// Abandon the pending challenge and return to credential entry.
    pub fn back(&mut self) -> Result<()> {
        match self.state {
            LoginState::AwaitingMfaCode(_) => {
                debug!("Returning to credential entry");
                self.state = LoginState::AwaitingCredentials;
                self.last_error = None;
                Ok(())
            }
            _ => Err(Error::invalid_state("no MFA challenge to go back from")),
        }
    }

    fn complete(&mut self, pair: TokenPair) -> Result<()> {
        self.session.store(pair)?;
        self.state = LoginState::Authenticated;
        info!("Logged in");
        Ok(())
    }

    fn settle(&mut self, outcome: Result<()>) -> Result<&LoginState> {
        match outcome {
            Ok(()) => {
                self.last_error = None;
                Ok(&self.state)
            }
            Err(err) => {
                warn!(error = %err, "Login step failed");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

impl<V, S> std::fmt::Debug for LoginFlow<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
