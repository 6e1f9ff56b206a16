//! Authenticated calls with one-shot token refresh.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::care::{Baby, CareEvent};
use crate::error::{AuthError, Error};
use crate::session::SessionStore;
use crate::tokens::AccessToken;
use crate::traits::{TokenStorage, VendorApi};
use crate::types::{BabyUid, TimeRange};
use crate::Result;

/// Runs vendor calls with the stored access token and recovers from a single
/// 401 by refreshing the session.
///
/// Each call makes at most two attempts:
///
/// 1. Send with the stored access token. No token means
///    [`AuthError::NotAuthenticated`] without touching the network. Any
///    outcome other than 401 is returned as is.
/// 2. On 401, refresh once and resend with the new token. A failed refresh,
///    a missing token, or a second 401 clears the session and fails with
///    [`AuthError::SessionExpired`].
///
/// Refreshes are single-flight: concurrent calls that are rejected with the
/// same token wait for one refresh and then reuse its result.
pub struct Authenticator<V, S> {
    api: Arc<V>,
    session: Arc<SessionStore<S>>,
    refresh_gate: Arc<Mutex<()>>,
}

impl<V, S> Clone for Authenticator<V, S> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            session: Arc::clone(&self.session),
            refresh_gate: Arc::clone(&self.refresh_gate),
        }
    }
}

impl<V: VendorApi, S: TokenStorage> Authenticator<V, S> {
    pub fn new(api: Arc<V>, session: Arc<SessionStore<S>>) -> Self {
        Self {
            api,
            session,
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    /// The session this authenticator reads and refreshes.
    pub fn session(&self) -> &Arc<SessionStore<S>> {
        &self.session
    }

    /// List the babies on the account.
    #[instrument(skip(self))]
    pub async fn babies(&self) -> Result<Vec<Baby>> {
        let api = &self.api;
        self.call(|token| async move { api.babies(&token).await })
            .await
    }

    /// Fetch care events for one baby.
    #[instrument(skip(self, range), fields(start = range.start(), end = range.end()))]
    pub async fn calendar(&self, baby: &BabyUid, range: TimeRange) -> Result<Vec<CareEvent>> {
        let api = &self.api;
        self.call(|token| async move { api.calendar(&token, baby, range).await })
            .await
    }

    /// Run `op` with the current access token, refreshing once on 401.
    ///
    /// `op` is invoked at most twice.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(AccessToken) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self
            .session
            .access_token()?
            .ok_or(AuthError::NotAuthenticated)?;

        match op(token.clone()).await {
            Err(err) if err.is_unauthorized() => {
                debug!(error = %err, "Access token rejected, refreshing session");
            }
            outcome => return outcome,
        }

        let fresh = self.refresh_after_rejection(&token).await?;

        match op(fresh).await {
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "Refreshed token rejected, ending session");
                Err(self.expire())
            }
            outcome => outcome,
        }
    }

    /// Obtain a token to retry with after `rejected` got a 401.
    async fn refresh_after_rejection(&self, rejected: &AccessToken) -> Result<AccessToken> {
        let _gate = self.refresh_gate.lock().await;

        let (Some(access), Some(refresh)) =
            (self.session.access_token()?, self.session.refresh_token()?)
        else {
            warn!("Cannot refresh without both tokens, ending session");
            return Err(self.expire());
        };

        if access != *rejected {
            debug!("Session already refreshed by a concurrent call");
            return Ok(access);
        }

        match self.api.refresh(&access, &refresh).await {
            Ok(pair) => {
                let fresh = pair.access_token.clone();
                if let Err(err) = self.session.store(pair) {
                    warn!(error = %err, "Failed to persist refreshed tokens, ending session");
                    return Err(self.expire());
                }
                info!("Session refreshed");
                Ok(fresh)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed, ending session");
                Err(self.expire())
            }
        }
    }

    /// Clear the session and produce the error the caller sees.
    fn expire(&self) -> Error {
        if let Err(err) = self.session.clear() {
            warn!(error = %err, "Failed to clear expired session");
        }
        AuthError::SessionExpired.into()
    }
}

impl<V, S> std::fmt::Debug for Authenticator<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use crate::storage::MemoryStorage;
    use crate::testing::{ScriptedVendor, baby, pair};
    use crate::tokens::RefreshToken;

    fn setup(
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> (
        Arc<ScriptedVendor>,
        Arc<SessionStore<MemoryStorage>>,
        Authenticator<ScriptedVendor, MemoryStorage>,
    ) {
        let vendor = Arc::new(ScriptedVendor::new());
        let session = Arc::new(SessionStore::new(MemoryStorage::new()));
        if let Some(access) = access {
            session.set_access_token(AccessToken::new(access)).unwrap();
        }
        if let Some(refresh) = refresh {
            session.set_refresh_token(RefreshToken::new(refresh)).unwrap();
        }
        let auth = Authenticator::new(Arc::clone(&vendor), Arc::clone(&session));
        (vendor, session, auth)
    }

    fn unauthorized() -> Error {
        AuthError::Unauthorized.into()
    }

    #[tokio::test]
    async fn no_token_fails_without_network() {
        let (vendor, _session, auth) = setup(None, Some("r1"));

        let err = auth.babies().await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::NotAuthenticated)));
        assert!(vendor.calls().is_empty());
    }

    #[tokio::test]
    async fn success_passes_through_without_refresh() {
        let (vendor, _session, auth) = setup(Some("old"), Some("r1"));
        vendor.push_babies(Ok(vec![baby("b1")]));

        let babies = auth.babies().await.unwrap();

        assert_eq!(babies, vec![baby("b1")]);
        assert_eq!(vendor.refresh_count(), 0);
    }

    #[tokio::test]
    async fn non_auth_error_passes_through_without_refresh() {
        let (vendor, session, auth) = setup(Some("old"), Some("r1"));
        vendor.push_babies(Err(UpstreamError::new(500, Some("boom".into())).into()));

        let err = auth.babies().await.unwrap_err();

        match err {
            Error::Upstream(e) => assert_eq!(e.status, 500),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(vendor.refresh_count(), 0);
        assert!(session.is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn refreshes_once_and_retries_with_new_token() {
        let (vendor, session, auth) = setup(Some("old"), Some("r1"));
        vendor
            .push_babies(Err(unauthorized()))
            .push_refresh(Ok(pair("new", Some("r2"))))
            .push_babies(Ok(vec![baby("b1")]));

        let babies = auth.babies().await.unwrap();

        assert_eq!(babies, vec![baby("b1")]);
        assert_eq!(vendor.refresh_count(), 1);
        assert_eq!(vendor.data_tokens(), vec!["old", "new"]);
        assert!(vendor.calls().contains(&crate::testing::Call::Refresh {
            access: "old".into(),
            refresh: "r1".into(),
        }));
        assert_eq!(session.access_token().unwrap(), Some(AccessToken::new("new")));
        assert_eq!(
            session.refresh_token().unwrap(),
            Some(RefreshToken::new("r2"))
        );
    }

    #[tokio::test]
    async fn refresh_without_rotation_keeps_refresh_token() {
        let (vendor, session, auth) = setup(Some("old"), Some("r1"));
        vendor
            .push_babies(Err(unauthorized()))
            .push_refresh(Ok(pair("new", None)))
            .push_babies(Ok(vec![]));

        auth.babies().await.unwrap();

        assert_eq!(
            session.refresh_token().unwrap(),
            Some(RefreshToken::new("r1"))
        );
    }

    #[tokio::test]
    async fn failed_refresh_expires_session() {
        let (vendor, session, auth) = setup(Some("old"), Some("r1"));
        vendor
            .push_babies(Err(unauthorized()))
            .push_refresh(Err(UpstreamError::new(400, None).into()));

        let err = auth.babies().await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
        assert!(err.requires_login());
        assert_eq!(session.access_token().unwrap(), None);
        assert_eq!(session.refresh_token().unwrap(), None);
        assert_eq!(vendor.data_tokens(), vec!["old"]);
    }

    #[tokio::test]
    async fn missing_refresh_token_expires_session() {
        let (vendor, session, auth) = setup(Some("old"), None);
        vendor.push_babies(Err(unauthorized()));

        let err = auth.babies().await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
        assert_eq!(vendor.refresh_count(), 0);
        assert_eq!(session.access_token().unwrap(), None);
    }

    #[tokio::test]
    async fn second_rejection_expires_without_second_refresh() {
        let (vendor, session, auth) = setup(Some("old"), Some("r1"));
        vendor
            .push_babies(Err(unauthorized()))
            .push_refresh(Ok(pair("new", Some("r2"))))
            .push_babies(Err(unauthorized()));

        let err = auth.babies().await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
        assert_eq!(vendor.refresh_count(), 1);
        assert_eq!(session.access_token().unwrap(), None);
        assert_eq!(session.refresh_token().unwrap(), None);
    }

    #[tokio::test]
    async fn next_call_after_expiry_is_not_authenticated() {
        let (vendor, _session, auth) = setup(Some("old"), Some("r1"));
        vendor
            .push_babies(Err(unauthorized()))
            .push_refresh(Err(unauthorized()));

        auth.babies().await.unwrap_err();
        let err = auth.babies().await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::NotAuthenticated)));
    }

    /// Memory storage whose writes can be switched off.
    #[derive(Default)]
    struct SwitchedStorage {
        inner: MemoryStorage,
        read_only: std::sync::atomic::AtomicBool,
    }

    impl TokenStorage for SwitchedStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.read_only.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(crate::error::StorageError::Io {
                    location: key.to_string(),
                    message: "read-only".to_string(),
                }
                .into());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn unpersisted_refresh_expires_session() {
        let vendor = Arc::new(ScriptedVendor::new());
        let storage = Arc::new(SwitchedStorage::default());
        let session = Arc::new(SessionStore::new(Arc::clone(&storage)));
        session.set_access_token(AccessToken::new("old")).unwrap();
        session.set_refresh_token(RefreshToken::new("r1")).unwrap();
        storage
            .read_only
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let auth = Authenticator::new(Arc::clone(&vendor), Arc::clone(&session));
        vendor
            .push_babies(Err(unauthorized()))
            .push_refresh(Ok(pair("new", Some("r2"))));

        let err = auth.babies().await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
        assert_eq!(vendor.data_tokens(), vec!["old"]);
        assert_eq!(session.access_token().unwrap(), None);
        assert_eq!(session.refresh_token().unwrap(), None);
        assert_eq!(storage.inner.get("refresh_token").unwrap(), None);
    }

    #[tokio::test]
    async fn calendar_goes_through_the_same_path() {
        let (vendor, _session, auth) = setup(Some("old"), Some("r1"));
        vendor
            .push_calendar(Err(unauthorized()))
            .push_refresh(Ok(pair("new", None)))
            .push_calendar(Ok(vec![]));

        let uid = BabyUid::new("b1").unwrap();
        let range = TimeRange::new(1_700_000_000, 1_700_086_400).unwrap();
        let events = auth.calendar(&uid, range).await.unwrap();

        assert!(events.is_empty());
        assert_eq!(vendor.data_tokens(), vec!["old", "new"]);
    }

    #[tokio::test]
    async fn concurrent_rejections_share_one_refresh() {
        let (vendor, session, auth) = setup(Some("old"), Some("r1"));
        vendor.push_refresh(Ok(pair("new", Some("r2"))));

        // Both calls see "old" rejected; only one refresh may happen.
        let run = |auth: Authenticator<ScriptedVendor, MemoryStorage>| async move {
            auth.call(|token| async move {
                tokio::task::yield_now().await;
                if token.as_str() == "old" {
                    Err(AuthError::Unauthorized.into())
                } else {
                    Ok(token.as_str().to_string())
                }
            })
            .await
        };

        let (a, b) = tokio::join!(run(auth.clone()), run(auth.clone()));

        assert_eq!(a.unwrap(), "new");
        assert_eq!(b.unwrap(), "new");
        assert_eq!(vendor.refresh_count(), 1);
        assert_eq!(session.access_token().unwrap(), Some(AccessToken::new("new")));
    }
}
