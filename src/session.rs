//! Shared-password admin gate and signed session tokens.
//!
//! There are no accounts: one configured password unlocks the management
//! routes. A successful login is remembered in an HMAC-signed cookie, which is
//! checked on every request and turned into an [`AdminContext`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use cookie::{Cookie, SameSite};
use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::config::AdminConfig;

pub const SESSION_COOKIE: &str = "session";

/// Proof that the current request carries a valid admin session.
/// Only [`AdminGate`] can create one.
#[derive(Debug, Clone)]
pub struct AdminContext {
    issued_at: DateTime<Utc>,
}

impl AdminContext {
    /// When the session was established
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    logged_in: bool,
    issued_at: i64,
    nonce: String,
}

pub struct AdminGate {
    key: hmac::Key,
    password_tag: Option<hmac::Tag>,
}

impl AdminGate {
    pub fn new(config: &AdminConfig) -> Self {
        let key = hmac::Key::new(hmac::HMAC_SHA256, &config.secret_key);
        let password_tag = config
            .password
            .as_ref()
            .map(|p| hmac::sign(&key, &password_message(p)));
        Self { key, password_tag }
    }

    /// Compare `password` against the configured secret in constant time.
    /// Always false when no password is configured.
    pub fn authenticate(&self, password: &str) -> bool {
        match self.password_tag {
            Some(ref expected) => {
                hmac::verify(&self.key, &password_message(password), expected.as_ref()).is_ok()
            }
            None => false,
        }
    }

    /// Issue a signed token recording a successful login.
    pub fn issue_token(&self) -> String {
        let claims = SessionClaims {
            logged_in: true,
            issued_at: Utc::now().timestamp(),
            nonce: uuid::Uuid::new_v4().to_string(),
        };
        // Serializing a struct of plain fields cannot fail.
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let tag = hmac::sign(&self.key, &session_message(&payload));
        format!("{payload}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }

    /// Validate a token from the session cookie.
    pub fn verify_token(&self, token: &str) -> Option<AdminContext> {
        let (payload, signature) = token.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        hmac::verify(&self.key, &session_message(payload), &signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: SessionClaims = serde_json::from_slice(&json).ok()?;
        if !claims.logged_in {
            return None;
        }

        let issued_at = Utc.timestamp_opt(claims.issued_at, 0).single()?;
        Some(AdminContext { issued_at })
    }

    /// Cookie carrying a freshly issued token. Lives for the browser session.
    pub fn session_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, self.issue_token()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .build()
    }
}

// Domain-separate the two uses of the signing key.
fn password_message(password: &str) -> Vec<u8> {
    [b"password:".as_slice(), password.as_bytes()].concat()
}

fn session_message(payload: &str) -> Vec<u8> {
    [b"session:".as_slice(), payload.as_bytes()].concat()
}
