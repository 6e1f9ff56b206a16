//! HTTP plumbing shared by every vendor call.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace, warn};

use nanit_core::error::{AuthError, InvalidInputError, TransportError, UpstreamError};
use nanit_core::{AccessToken, ApiUrl, Error, Result};

use crate::config::ClientConfig;
use crate::endpoints::{API_VERSION, API_VERSION_HEADER, ApiFlavor, ErrorResponse};

/// A status and body read off the wire, before interpretation.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON.
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_str(&self.body).map_err(|e| {
            Error::invalid_response(format!("undecodable body (HTTP {}): {}", self.status, e))
        })
    }

    /// The vendor's message for a failure, falling back to the raw body.
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_str::<ErrorResponse>(&self.body)
            .ok()
            .and_then(ErrorResponse::text)
            .or_else(|| {
                let body = self.body.trim();
                (!body.is_empty()).then(|| body.to_string())
            })
    }

    /// Map a failure status to an error. 401 becomes [`AuthError::Unauthorized`].
    pub fn into_error(self) -> Error {
        if self.status == StatusCode::UNAUTHORIZED {
            return AuthError::Unauthorized.into();
        }
        UpstreamError::new(self.status.as_u16(), self.error_message()).into()
    }
}

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Build a client. Fails only if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        if config.accept_invalid_certs {
            warn!(
                base_url = %config.base_url,
                local = config.base_url.is_localhost(),
                "TLS certificate verification is disabled for this client"
            );
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("nanit-care/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &ApiUrl {
        &self.config.base_url
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.config.flavor
    }

    /// GET `path` with a bearer of `token` and decode the JSON body.
    #[instrument(skip(self, query, token, extra), fields(base_url = %self.config.base_url))]
    pub async fn get_authed<Q, R>(
        &self,
        path: &str,
        query: Option<&Q>,
        token: &AccessToken,
        extra: &[(&'static str, &'static str)],
    ) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.config.base_url.endpoint(path);
        debug!(path, "GET");
        trace!(?query, "query parameters");

        let mut request = self.client.get(&url).headers(self.auth_headers(token)?);
        if let Some(query) = query {
            request = request.query(query);
        }
        for (name, value) in extra {
            request = request.header(*name, *value);
        }

        let reply = self.send(request).await?;
        if reply.is_success() {
            reply.json()
        } else {
            Err(reply.into_error())
        }
    }

    /// POST a JSON body and return the reply uninterpreted.
    ///
    /// Used on the auth paths, where some failure statuses carry meaning.
    #[instrument(skip(self, body, token, extra), fields(base_url = %self.config.base_url))]
    pub async fn post_json<B>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AccessToken>,
        extra: &[(&'static str, &'static str)],
    ) -> Result<Reply>
    where
        B: Serialize,
    {
        let url = self.config.base_url.endpoint(path);
        debug!(path, "POST");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = token {
            request = request.headers(self.auth_headers(token)?);
        }
        for (name, value) in extra {
            request = request.header(*name, *value);
        }

        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Reply> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        trace!(status = %status, bytes = body.len(), "response");
        Ok(Reply { status, body })
    }

    fn auth_headers(&self, token: &AccessToken) -> Result<HeaderMap> {
        let value = format!("{} {}", self.config.flavor.auth_scheme(), token.as_str());
        let mut value = HeaderValue::from_str(&value).map_err(|_| InvalidInputError::Other {
            message: "access token contains characters not allowed in a header".to_string(),
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        let err = if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: duration_ms(self.config.timeout),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        };
        err.into()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
