//! Scripted vendor used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::care::{Baby, CareEvent};
use crate::login::{LoginResult, MfaChallenge};
use crate::tokens::{AccessToken, RefreshToken, TokenPair};
use crate::traits::VendorApi;
use crate::types::{BabyUid, TimeRange};
use crate::{Credentials, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Login { email: String },
    VerifyMfa { mfa_token: String, channel: String, code: String },
    Refresh { access: String, refresh: String },
    Babies { token: String },
    Calendar { token: String, baby: String },
}

/// Replays queued responses in order and records every call.
#[derive(Default)]
pub(crate) struct ScriptedVendor {
    login: Mutex<VecDeque<Result<LoginResult>>>,
    verify: Mutex<VecDeque<Result<TokenPair>>>,
    refresh: Mutex<VecDeque<Result<TokenPair>>>,
    babies: Mutex<VecDeque<Result<Vec<Baby>>>>,
    calendar: Mutex<VecDeque<Result<Vec<CareEvent>>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedVendor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_login(&self, r: Result<LoginResult>) -> &Self {
        self.login.lock().unwrap().push_back(r);
        self
    }

    pub(crate) fn push_verify(&self, r: Result<TokenPair>) -> &Self {
        self.verify.lock().unwrap().push_back(r);
        self
    }

    pub(crate) fn push_refresh(&self, r: Result<TokenPair>) -> &Self {
        self.refresh.lock().unwrap().push_back(r);
        self
    }

    pub(crate) fn push_babies(&self, r: Result<Vec<Baby>>) -> &Self {
        self.babies.lock().unwrap().push_back(r);
        self
    }

    pub(crate) fn push_calendar(&self, r: Result<Vec<CareEvent>>) -> &Self {
        self.calendar.lock().unwrap().push_back(r);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn refresh_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Refresh { .. }))
            .count()
    }

    /// Tokens presented to data calls, in order.
    pub(crate) fn data_tokens(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Babies { token } | Call::Calendar { token, .. } => Some(token),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T>>>, what: &str) -> Result<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("unexpected {} call", what))
}

#[async_trait]
impl VendorApi for ScriptedVendor {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult> {
        self.record(Call::Login {
            email: credentials.email().to_string(),
        });
        next(&self.login, "login")
    }

    async fn verify_mfa(
        &self,
        _credentials: &Credentials,
        challenge: &MfaChallenge,
        code: &str,
    ) -> Result<TokenPair> {
        self.record(Call::VerifyMfa {
            mfa_token: challenge.mfa_token.clone(),
            channel: challenge.channel.clone(),
            code: code.to_string(),
        });
        next(&self.verify, "verify_mfa")
    }

    async fn refresh(&self, access: &AccessToken, refresh: &RefreshToken) -> Result<TokenPair> {
        self.record(Call::Refresh {
            access: access.as_str().to_string(),
            refresh: refresh.as_str().to_string(),
        });
        next(&self.refresh, "refresh")
    }

    async fn babies(&self, token: &AccessToken) -> Result<Vec<Baby>> {
        self.record(Call::Babies {
            token: token.as_str().to_string(),
        });
        next(&self.babies, "babies")
    }

    async fn calendar(
        &self,
        token: &AccessToken,
        baby: &BabyUid,
        _range: TimeRange,
    ) -> Result<Vec<CareEvent>> {
        self.record(Call::Calendar {
            token: token.as_str().to_string(),
            baby: baby.to_string(),
        });
        next(&self.calendar, "calendar")
    }
}

pub(crate) fn pair(access: &str, refresh: Option<&str>) -> TokenPair {
    TokenPair::new(AccessToken::new(access), refresh.map(RefreshToken::new))
}

pub(crate) fn baby(uid: &str) -> Baby {
    Baby {
        uid: BabyUid::new(uid).unwrap(),
        first_name: Some("Test".to_string()),
        last_name: None,
        birthday: None,
    }
}
