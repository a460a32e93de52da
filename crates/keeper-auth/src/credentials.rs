//! OAuth credentials held by a Keeper client
//!
//! Credentials are created by the authorization-code exchange and updated in
//! place by every refresh. Persistence belongs to the caller: the client hands
//! each new value to the registered refresh callback.
//!
//! `expire_time` is a unix timestamp in milliseconds (absolute), computed from
//! the token response's `expires_in` (seconds delta) at the time it was received.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::UNKNOWN_IDENTITY;
use crate::token::TokenResponse;

/// Standard-alphabet base64 accepting the payload with or without `=` padding.
/// URL-safe input is mapped onto this alphabet before decoding.
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Tokens and derived identity for one authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token presented on every API call
    pub access_token: String,
    /// Absent when the server issued none; refresh is impossible without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, as issued
    #[serde(default)]
    pub expires_in: u64,
    /// Expiration as unix timestamp in milliseconds. Unset means stale.
    #[serde(default)]
    pub expire_time: Option<u64>,
    /// Expected to be "bearer"
    pub token_type: String,
    /// `email`, else `name`, from the access token payload
    pub display_name: String,
}

impl Credentials {
    /// Build credentials from a first-issue token response.
    ///
    /// The refresh token is stored as returned, whatever the grant mode.
    pub fn from_token_response(response: TokenResponse, now_millis: u64) -> Self {
        let display_name = display_name(&decode_identity(&response.access_token));
        Self {
            expire_time: Some(expiry(now_millis, response.expires_in)),
            expires_in: response.expires_in,
            display_name,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
        }
    }

    /// Fold a refresh response into these credentials.
    ///
    /// Access token, expiry, token type and display name always change. The
    /// refresh token is replaced only when `rotate_refresh_token` is set and the
    /// server sent a new one. Returns whether the refresh token was replaced.
    pub fn apply_refresh(
        &mut self,
        response: TokenResponse,
        now_millis: u64,
        rotate_refresh_token: bool,
    ) -> bool {
        self.display_name = display_name(&decode_identity(&response.access_token));
        self.access_token = response.access_token;
        self.expires_in = response.expires_in;
        self.expire_time = Some(expiry(now_millis, response.expires_in));
        self.token_type = response.token_type;

        match response.refresh_token {
            Some(rotated) if rotate_refresh_token => {
                self.refresh_token = Some(rotated);
                true
            }
            _ => false,
        }
    }

    /// True when the access token must not be sent without refreshing first.
    pub fn is_stale(&self, now_millis: u64) -> bool {
        match self.expire_time {
            Some(expire_time) => expire_time <= now_millis,
            None => true,
        }
    }

    /// Milliseconds until expiry, zero if already stale.
    pub fn remaining_millis(&self, now_millis: u64) -> u64 {
        self.expire_time
            .map(|t| t.saturating_sub(now_millis))
            .unwrap_or(0)
    }
}

fn expiry(now_millis: u64, expires_in: u64) -> u64 {
    now_millis.saturating_add(expires_in.saturating_mul(1000))
}

/// Current wall-clock time as unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Decode the payload segment of a JWT-style access token.
///
/// Never fails: a token that is not three dot-separated segments, or whose
/// middle segment is not base64 JSON, decodes as `{"email": "Unknown"}`.
/// Both the URL-safe and the standard alphabet are accepted, even mixed.
pub fn decode_identity(token: &str) -> Value {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return unknown_identity();
    }
    let payload: String = segments[1]
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    BASE64_LENIENT
        .decode(payload)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(unknown_identity)
}

/// `email`, falling back to `name`, falling back to "Unknown".
pub fn display_name(identity: &Value) -> String {
    ["email", "name"]
        .iter()
        .find_map(|key| {
            identity
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(UNKNOWN_IDENTITY)
        .to_owned()
}

fn unknown_identity() -> Value {
    json!({ "email": UNKNOWN_IDENTITY })
}
