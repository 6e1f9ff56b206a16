//! Route table and handlers for the `/api` surface.
//!
//! Handlers take the caller's bearer token, call the vendor through
//! [`VendorApi`](nanit_core::VendorApi) and reply with the vendor's JSON shapes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use nanit_core::{AccessToken, BabyUid, Credentials, LoginResult, MfaChallenge, RefreshToken, TimeRange, VendorApi};
use nanit_http::endpoints::{
    AuthResponse, BabiesResponse, BabyEntry, CalendarEntry, CalendarResponse, LoginRequest,
    MFA_REQUIRED_STATUS, ProxyVerifyMfaRequest,
};

use crate::error::ProxyError;

/// Shared handler state: the vendor every request is forwarded to.
pub struct AppState<V> {
    pub vendor: Arc<V>,
}

impl<V> Clone for AppState<V> {
    fn clone(&self) -> Self {
        Self {
            vendor: Arc::clone(&self.vendor),
        }
    }
}

/// Build the `/api` router.
pub fn router<V: VendorApi + 'static>(vendor: Arc<V>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login::<V>))
        .route("/api/auth/verify-mfa", post(verify_mfa::<V>))
        .route("/api/auth/refresh", post(refresh::<V>))
        .route("/api/babies", get(babies::<V>))
        .route("/api/calendar/{baby_uid}", get(calendar::<V>))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { vendor })
}

/// The token from `Authorization: Bearer <t>`; the vendor's `token <t>` form is accepted too.
fn bearer(headers: &HeaderMap) -> Option<AccessToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("token "))
        .unwrap_or(value)
        .trim();
    (!token.is_empty()).then(|| AccessToken::new(token))
}

// ── Auth ───────────────────────────────────────────────────────────

async fn login<V: VendorApi>(
    State(state): State<AppState<V>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ProxyError> {
    let credentials = Credentials::new(body.email, body.password);

    match state.vendor.login(&credentials).await? {
        LoginResult::Authenticated(pair) => {
            info!("Login forwarded");
            Ok(Json(AuthResponse::from(&pair)).into_response())
        }
        LoginResult::MfaRequired(challenge) => {
            debug!(channel = %challenge.channel, "Login needs an MFA code");
            let status =
                StatusCode::from_u16(MFA_REQUIRED_STATUS).expect("482 is a valid status code");
            Ok((status, Json(AuthResponse::from(&challenge))).into_response())
        }
    }
}

async fn verify_mfa<V: VendorApi>(
    State(state): State<AppState<V>>,
    Json(body): Json<ProxyVerifyMfaRequest>,
) -> Result<Json<AuthResponse>, ProxyError> {
    let credentials = Credentials::new(body.email, body.password);
    let challenge = MfaChallenge::new(body.mfa_token, body.channel, None);

    let pair = state
        .vendor
        .verify_mfa(&credentials, &challenge, &body.mfa_code)
        .await?;
    info!("MFA verification forwarded");
    Ok(Json(AuthResponse::from(&pair)))
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    #[serde(default)]
    refresh_token: Option<String>,
}

async fn refresh<V: VendorApi>(
    State(state): State<AppState<V>>,
    headers: HeaderMap,
    Json(body): Json<RefreshBody>,
) -> Result<Json<AuthResponse>, ProxyError> {
    let refresh_token = body
        .refresh_token
        .filter(|t| !t.is_empty())
        .map(RefreshToken::new)
        .ok_or_else(|| ProxyError::BadRequest("Missing refresh_token".to_string()))?;
    let access_token = bearer(&headers).ok_or(ProxyError::MissingToken)?;

    let pair = state.vendor.refresh(&access_token, &refresh_token).await?;
    debug!("Token refresh forwarded");
    Ok(Json(AuthResponse::from(&pair)))
}

// ── Data ───────────────────────────────────────────────────────────

async fn babies<V: VendorApi>(
    State(state): State<AppState<V>>,
    headers: HeaderMap,
) -> Result<Json<BabiesResponse>, ProxyError> {
    let token = bearer(&headers).ok_or(ProxyError::MissingToken)?;

    let babies = state.vendor.babies(&token).await?;
    Ok(Json(BabiesResponse {
        babies: babies.iter().map(BabyEntry::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
struct RangeParams {
    start: Option<i64>,
    end: Option<i64>,
}

async fn calendar<V: VendorApi>(
    State(state): State<AppState<V>>,
    Path(baby_uid): Path<String>,
    Query(params): Query<RangeParams>,
    headers: HeaderMap,
) -> Result<Json<CalendarResponse>, ProxyError> {
    let token = bearer(&headers).ok_or(ProxyError::MissingToken)?;

    let (Some(start), Some(end)) = (params.start, params.end) else {
        return Err(ProxyError::BadRequest("Missing start or end time".to_string()));
    };
    let range = TimeRange::new(start, end).map_err(|e| ProxyError::BadRequest(e.to_string()))?;
    let baby = BabyUid::new(baby_uid).map_err(|e| ProxyError::BadRequest(e.to_string()))?;

    let events = state.vendor.calendar(&token, &baby, range).await?;
    Ok(Json(CalendarResponse {
        calendar: events.iter().map(CalendarEntry::from).collect(),
    }))
}
