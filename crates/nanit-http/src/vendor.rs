//! [`VendorApi`] over HTTP.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use nanit_core::error::UpstreamError;
use nanit_core::{
    AccessToken, ApiUrl, Baby, BabyUid, CareEvent, Credentials, Error, LoginResult, MfaChallenge,
    RefreshToken, Result, TimeRange, TokenPair, VendorApi,
};

use crate::client::{HttpClient, Reply};
use crate::config::ClientConfig;
use crate::endpoints::{
    ApiFlavor, AuthResponse, BabiesResponse, CALENDAR_HEADERS, CalendarQuery, CalendarResponse,
    LoginRequest, MFA_REQUIRED_STATUS, MfaLoginRequest, ProxyVerifyMfaRequest, RefreshRequest,
    VENDOR_USER_AGENT,
};

/// Client for the Nanit API, or for a nanit proxy in front of it.
///
/// Every call carries `Accept: application/json` and `nanit-api-version: 1`.
/// The auth paths decide what a status means; data paths map 401 to
/// [`AuthError::Unauthorized`](nanit_core::error::AuthError::Unauthorized)
/// so an [`Authenticator`](nanit_core::Authenticator) can refresh.
#[derive(Debug, Clone)]
pub struct NanitClient {
    http: HttpClient,
}

impl NanitClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    /// Client for the vendor API at its default address.
    pub fn upstream() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    pub fn base_url(&self) -> &ApiUrl {
        self.http.base_url()
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.http.flavor()
    }

    /// Login calls mimic the vendor's own app when talking to it directly.
    fn auth_headers(&self) -> &'static [(&'static str, &'static str)] {
        match self.flavor() {
            ApiFlavor::Upstream => &[("user-agent", VENDOR_USER_AGENT)],
            ApiFlavor::Proxy => &[],
        }
    }

    fn calendar_headers(&self) -> &'static [(&'static str, &'static str)] {
        match self.flavor() {
            ApiFlavor::Upstream => &CALENDAR_HEADERS,
            ApiFlavor::Proxy => &[],
        }
    }
}

/// Decode a token-bearing success body, or fail with the vendor's message.
fn expect_tokens(reply: Reply, what: &str) -> Result<TokenPair> {
    if !reply.is_success() {
        return Err(UpstreamError::new(reply.status.as_u16(), reply.error_message()).into());
    }
    reply
        .json::<AuthResponse>()?
        .token_pair()
        .ok_or_else(|| Error::invalid_response(format!("{} response carried no access token", what)))
}

#[async_trait]
impl VendorApi for NanitClient {
    #[instrument(skip_all, fields(base_url = %self.base_url()))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult> {
        let request = LoginRequest {
            email: credentials.email().to_string(),
            password: credentials.password().to_string(),
        };
        let reply = self
            .http
            .post_json(self.flavor().login_path(), &request, None, self.auth_headers())
            .await?;

        if reply.status.as_u16() == MFA_REQUIRED_STATUS {
            let body: AuthResponse = reply.json()?;
            return body.challenge().map(LoginResult::MfaRequired).ok_or_else(|| {
                Error::invalid_response("MFA required but no mfa_token was sent")
            });
        }
        if !reply.is_success() {
            return Err(UpstreamError::new(reply.status.as_u16(), reply.error_message()).into());
        }

        let result = reply.json::<AuthResponse>()?.into_login_result()?;
        match &result {
            LoginResult::Authenticated(_) => info!("Login accepted"),
            LoginResult::MfaRequired(challenge) => {
                debug!(channel = %challenge.channel, "Login needs an MFA code")
            }
        }
        Ok(result)
    }

    #[instrument(skip_all, fields(base_url = %self.base_url(), channel = %challenge.channel))]
    async fn verify_mfa(
        &self,
        credentials: &Credentials,
        challenge: &MfaChallenge,
        code: &str,
    ) -> Result<TokenPair> {
        let path = self.flavor().verify_mfa_path();
        let reply = match self.flavor() {
            ApiFlavor::Upstream => {
                let request = MfaLoginRequest {
                    mfa_token: challenge.mfa_token.clone(),
                    channel: challenge.channel.clone(),
                    mfa_code: code.to_string(),
                    password: credentials.password().to_string(),
                    email: credentials.email().to_string(),
                };
                self.http
                    .post_json(path, &request, None, self.auth_headers())
                    .await?
            }
            ApiFlavor::Proxy => {
                let request = ProxyVerifyMfaRequest {
                    email: credentials.email().to_string(),
                    password: credentials.password().to_string(),
                    mfa_token: challenge.mfa_token.clone(),
                    mfa_code: code.to_string(),
                    channel: challenge.channel.clone(),
                };
                self.http.post_json(path, &request, None, &[]).await?
            }
        };

        let pair = expect_tokens(reply, "MFA verification")?;
        info!("MFA code accepted");
        Ok(pair)
    }

    #[instrument(skip_all, fields(base_url = %self.base_url()))]
    async fn refresh(&self, access: &AccessToken, refresh: &RefreshToken) -> Result<TokenPair> {
        let request = RefreshRequest {
            refresh_token: refresh.as_str().to_string(),
        };
        let reply = self
            .http
            .post_json(self.flavor().refresh_path(), &request, Some(access), &[])
            .await?;

        let pair = expect_tokens(reply, "refresh")?;
        debug!(rotated = pair.refresh_token.is_some(), "Tokens refreshed");
        Ok(pair)
    }

    #[instrument(skip_all, fields(base_url = %self.base_url()))]
    async fn babies(&self, token: &AccessToken) -> Result<Vec<Baby>> {
        let response: BabiesResponse = self
            .http
            .get_authed::<(), _>(self.flavor().babies_path(), None, token, &[])
            .await?;

        response.babies.into_iter().map(Baby::try_from).collect()
    }

    #[instrument(skip_all, fields(base_url = %self.base_url(), %baby, start = range.start(), end = range.end()))]
    async fn calendar(
        &self,
        token: &AccessToken,
        baby: &BabyUid,
        range: TimeRange,
    ) -> Result<Vec<CareEvent>> {
        let query = CalendarQuery {
            start: range.start(),
            end: range.end(),
        };
        let response: CalendarResponse = self
            .http
            .get_authed(
                &self.flavor().calendar_path(baby),
                Some(&query),
                token,
                self.calendar_headers(),
            )
            .await?;

        response
            .calendar
            .into_iter()
            .map(CareEvent::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_sends_vendor_headers() {
        let client = NanitClient::upstream().unwrap();
        assert_eq!(client.auth_headers()[0].1, VENDOR_USER_AGENT);
        assert_eq!(client.calendar_headers().len(), 2);
    }

    #[test]
    fn proxy_sends_no_vendor_headers() {
        let url = ApiUrl::new("http://localhost:3000").unwrap();
        let client = NanitClient::new(ClientConfig::proxy(url)).unwrap();
        assert!(client.auth_headers().is_empty());
        assert!(client.calendar_headers().is_empty());
    }

    #[test]
    fn failed_token_reply_keeps_vendor_message() {
        let reply = Reply {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: r#"{"message":"Invalid code"}"#.to_string(),
        };
        match expect_tokens(reply, "MFA verification").unwrap_err() {
            Error::Upstream(e) => {
                assert_eq!(e.status, 400);
                assert_eq!(e.message.as_deref(), Some("Invalid code"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
