//! Endpoint paths and request/response bodies.
//!
//! The wire types are shared with the proxy, which speaks the same JSON
//! shapes to its clients.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};

use nanit_core::care::{Baby, CareEvent, CareKind};
use nanit_core::{AccessToken, BabyUid, Error, LoginResult, MfaChallenge, RefreshToken, Result, TokenPair};

// ============================================================================
// Paths and headers
// ============================================================================

/// Status the vendor uses on the login path to ask for an MFA code.
pub const MFA_REQUIRED_STATUS: u16 = 482;

/// API version header sent on every call.
pub const API_VERSION_HEADER: &str = "nanit-api-version";
pub const API_VERSION: &str = "1";

/// User agent the vendor expects on login calls.
pub const VENDOR_USER_AGENT: &str = "Nanit/6.0.0 (iOS; iPhone; Scale/2.00)";

/// Extra headers the vendor expects on calendar queries.
pub const CALENDAR_HEADERS: [(&str, &str); 2] = [
    ("X-Nanit-Platform", "unknown"),
    ("X-Nanit-Service", "3.52.0 (882)"),
];

/// Which API a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiFlavor {
    /// The vendor API itself.
    #[default]
    Upstream,
    /// The local proxy, which re-exposes the vendor API under `/api`.
    Proxy,
}

impl ApiFlavor {
    pub fn login_path(&self) -> &'static str {
        match self {
            ApiFlavor::Upstream => "/login",
            ApiFlavor::Proxy => "/api/auth/login",
        }
    }

    pub fn verify_mfa_path(&self) -> &'static str {
        match self {
            ApiFlavor::Upstream => "/login",
            ApiFlavor::Proxy => "/api/auth/verify-mfa",
        }
    }

    pub fn refresh_path(&self) -> &'static str {
        match self {
            ApiFlavor::Upstream => "/tokens/refresh",
            ApiFlavor::Proxy => "/api/auth/refresh",
        }
    }

    pub fn babies_path(&self) -> &'static str {
        match self {
            ApiFlavor::Upstream => "/babies",
            ApiFlavor::Proxy => "/api/babies",
        }
    }

    pub fn calendar_path(&self, baby: &BabyUid) -> String {
        match self {
            ApiFlavor::Upstream => format!("/babies/{}/calendar", baby),
            ApiFlavor::Proxy => format!("/api/calendar/{}", baby),
        }
    }

    /// Scheme word placed before the token in the Authorization header.
    pub fn auth_scheme(&self) -> &'static str {
        match self {
            ApiFlavor::Upstream => "token",
            ApiFlavor::Proxy => "Bearer",
        }
    }
}

// ============================================================================
// Auth bodies
// ============================================================================

/// Password step of the login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Code step of the login, as the vendor expects it on `/login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MfaLoginRequest {
    pub mfa_token: String,
    pub channel: String,
    pub mfa_code: String,
    pub password: String,
    pub email: String,
}

/// Code step of the login, as the proxy expects it on `/api/auth/verify-mfa`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyVerifyMfaRequest {
    pub email: String,
    pub password: String,
    pub mfa_token: String,
    pub mfa_code: String,
    pub channel: String,
}

/// Body for a token refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Every response on the auth paths: tokens, an MFA challenge, or a message.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Older responses name the access token `token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResponse {
    /// The MFA challenge, if the body carries one.
    pub fn challenge(&self) -> Option<MfaChallenge> {
        self.mfa_token.as_ref().map(|mfa_token| {
            MfaChallenge::new(
                mfa_token.clone(),
                self.channel.clone().unwrap_or_default(),
                self.phone_suffix.clone(),
            )
        })
    }

    /// The issued tokens, if the body carries an access token.
    pub fn token_pair(&self) -> Option<TokenPair> {
        self.access_token
            .as_ref()
            .or(self.token.as_ref())
            .filter(|t| !t.is_empty())
            .map(|access| {
                TokenPair::new(
                    AccessToken::new(access.clone()),
                    self.refresh_token
                        .as_ref()
                        .filter(|t| !t.is_empty())
                        .map(|t| RefreshToken::new(t.clone())),
                )
            })
    }

    /// Interpret a successful login body.
    pub fn into_login_result(self) -> Result<LoginResult> {
        if let Some(challenge) = self.challenge() {
            return Ok(LoginResult::MfaRequired(challenge));
        }
        self.token_pair()
            .map(LoginResult::Authenticated)
            .ok_or_else(|| {
                Error::invalid_response("login response carried neither a token nor an MFA challenge")
            })
    }
}

impl From<&TokenPair> for AuthResponse {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: Some(pair.access_token.as_str().to_string()),
            refresh_token: pair
                .refresh_token
                .as_ref()
                .map(|t| t.as_str().to_string()),
            ..Self::default()
        }
    }
}

impl From<&MfaChallenge> for AuthResponse {
    fn from(challenge: &MfaChallenge) -> Self {
        Self {
            mfa_token: Some(challenge.mfa_token.clone()),
            channel: Some(challenge.channel.clone()),
            phone_suffix: challenge.phone_suffix.clone(),
            ..Self::default()
        }
    }
}

/// Error body shape used by the vendor and the proxy.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            message: None,
        }
    }

    /// The human-readable part, preferring `message`.
    pub fn text(self) -> Option<String> {
        self.message.or(self.error)
    }
}

// ============================================================================
// Data bodies
// ============================================================================

/// Response from the babies listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct BabiesResponse {
    pub babies: Vec<BabyEntry>,
}

/// A baby as the vendor sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BabyEntry {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

impl TryFrom<BabyEntry> for Baby {
    type Error = Error;

    fn try_from(entry: BabyEntry) -> Result<Self> {
        let uid = BabyUid::new(entry.uid)
            .map_err(|e| Error::invalid_response(format!("bad baby uid: {}", e)))?;
        Ok(Baby {
            uid,
            first_name: entry.first_name,
            last_name: entry.last_name,
            birthday: entry.birthday,
        })
    }
}

impl From<&Baby> for BabyEntry {
    fn from(baby: &Baby) -> Self {
        Self {
            uid: baby.uid.to_string(),
            first_name: baby.first_name.clone(),
            last_name: baby.last_name.clone(),
            birthday: baby.birthday.clone(),
        }
    }
}

/// Query string for calendar requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub start: i64,
    pub end: i64,
}

/// Response from a calendar query.
#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub calendar: Vec<CalendarEntry>,
}

/// A care event as the vendor sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Epoch seconds; the vendor may send a fractional value.
    pub time: f64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_amount: Option<f64>,
}

impl TryFrom<CalendarEntry> for CareEvent {
    type Error = Error;

    fn try_from(entry: CalendarEntry) -> Result<Self> {
        let timestamp = entry
            .time
            .is_finite()
            .then(|| {
                let secs = entry.time.floor();
                let nanos = ((entry.time - secs) * 1e9).round().min(999_999_999.0) as u32;
                DateTime::from_timestamp(secs as i64, nanos)
            })
            .flatten()
            .ok_or_else(|| {
                Error::invalid_response(format!("event {} has bad time {}", entry.id, entry.time))
            })?;

        Ok(CareEvent {
            kind: CareKind::from_wire(
                &entry.event_type,
                entry.change_type.as_deref(),
                entry.feed_amount,
            ),
            id: entry.id,
            timestamp,
        })
    }
}

impl From<&CareEvent> for CalendarEntry {
    fn from(event: &CareEvent) -> Self {
        let (change_type, feed_amount) = match &event.kind {
            CareKind::DiaperChange { subtype } => {
                (subtype.as_ref().map(|k| k.as_str().to_string()), None)
            }
            CareKind::BottleFeed { volume_ml } => (None, *volume_ml),
            CareKind::Other { .. } => (None, None),
        };
        Self {
            id: event.id.clone(),
            time: event.timestamp.timestamp() as f64
                + f64::from(event.timestamp.timestamp_subsec_nanos()) / 1e9,
            event_type: event.kind.wire_type().to_string(),
            change_type,
            feed_amount,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}
