//! The process-wide session: access and refresh tokens over durable storage.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, instrument};

use crate::Result;
use crate::tokens::{AccessToken, RefreshToken, TokenPair};
use crate::traits::TokenStorage;

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Holds the current tokens and mirrors every change into [`TokenStorage`].
///
/// Tokens are read from storage lazily on first access and cached in memory
/// afterwards. Only this type mutates the session; the
/// [`Authenticator`](crate::Authenticator) and [`LoginFlow`](crate::LoginFlow)
/// go through its setters. Share it between them with an `Arc`.
pub struct SessionStore<S> {
    storage: S,
    cached: Mutex<Option<SessionTokens>>,
}

#[derive(Default)]
struct SessionTokens {
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
}

impl<S: TokenStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            cached: Mutex::new(None),
        }
    }

    /// Returns the backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The current access token, if any.
    pub fn access_token(&self) -> Result<Option<AccessToken>> {
        self.with_tokens(|tokens| Ok(tokens.access_token.clone()))
    }

    /// The current refresh token, if any.
    pub fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        self.with_tokens(|tokens| Ok(tokens.refresh_token.clone()))
    }

    /// True when an access token is held.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token()?.is_some())
    }

    /// Replace the access token and persist it.
    pub fn set_access_token(&self, token: AccessToken) -> Result<()> {
        self.with_tokens(|tokens| {
            self.storage.set(ACCESS_TOKEN_KEY, token.as_str())?;
            tokens.access_token = Some(token);
            Ok(())
        })
    }

    /// Replace the refresh token and persist it.
    pub fn set_refresh_token(&self, token: RefreshToken) -> Result<()> {
        self.with_tokens(|tokens| {
            self.storage.set(REFRESH_TOKEN_KEY, token.as_str())?;
            tokens.refresh_token = Some(token);
            Ok(())
        })
    }

    /// Store freshly issued tokens. A pair without a refresh token keeps the
    /// one already held.
    ///
    /// The refresh token is written first. If the access token write then
    /// fails, the stale access token is answered with a 401 and the new
    /// refresh token recovers the session.
    #[instrument(skip_all, fields(rotated = pair.refresh_token.is_some()))]
    pub fn store(&self, pair: TokenPair) -> Result<()> {
        debug!("Storing session tokens");
        if let Some(refresh_token) = pair.refresh_token {
            self.set_refresh_token(refresh_token)?;
        }
        self.set_access_token(pair.access_token)
    }

    /// Erase both tokens from memory and storage.
    #[instrument(skip_all)]
    pub fn clear(&self) -> Result<()> {
        debug!("Clearing session tokens");
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        // Forget the cache first so a failed remove re-reads storage next time.
        *cached = None;
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        *cached = Some(SessionTokens::default());
        Ok(())
    }

    fn with_tokens<R>(&self, f: impl FnOnce(&mut SessionTokens) -> Result<R>) -> Result<R> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        let tokens = match cached.take() {
            Some(tokens) => tokens,
            None => self.hydrate()?,
        };
        f(cached.insert(tokens))
    }

    fn hydrate(&self) -> Result<SessionTokens> {
        debug!("Loading session tokens from storage");
        Ok(SessionTokens {
            access_token: non_empty(self.storage.get(ACCESS_TOKEN_KEY)?).map(AccessToken::new),
            refresh_token: non_empty(self.storage.get(REFRESH_TOKEN_KEY)?).map(RefreshToken::new),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl<S> std::fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
