//! Server-side sessions addressed by a signed cookie.
//!
//! The cookie only carries a token naming the session; the user id and any
//! pending flash messages stay in this process.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::auth::{AuthError, TokenKeys};

pub const SESSION_COOKIE: &str = "todo_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
    Message,
}

/// One-shot messages surfaced on the next rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlashMessages {
    pub success: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl FlashMessages {
    pub fn set(&mut self, kind: FlashKind, text: String) {
        match kind {
            FlashKind::Success => self.success = Some(text),
            FlashKind::Error => self.error = Some(text),
            FlashKind::Message => self.message = Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_none() && self.error.is_none() && self.message.is_none()
    }
}

#[derive(Debug)]
struct SessionData {
    user_id: Option<u64>,
    flash: FlashMessages,
    expires_at: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionData>>,
    keys: TokenKeys,
}

impl SessionStore {
    pub fn new(secret: &str, lifetime_minutes: u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            keys: TokenKeys::new(secret, Duration::minutes(i64::from(lifetime_minutes))),
        }
    }

    /// Start an anonymous session.
    pub fn create(&self) -> Uuid {
        let sid = Uuid::new_v4();
        let data = SessionData {
            user_id: None,
            flash: FlashMessages::default(),
            expires_at: Utc::now() + self.keys.lifetime(),
        };
        self.sessions.write().unwrap_or_else(PoisonError::into_inner).insert(sid, data);
        sid
    }

    /// Session named by a cookie token, if the token verifies and the session
    /// is still alive. Resolving a session extends its lifetime.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let claims = self.keys.verify_token(token).ok()?;
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        match sessions.get_mut(&claims.sid) {
            Some(data) if data.expires_at > now => {
                data.expires_at = now + self.keys.lifetime();
                Some(claims.sid)
            }
            Some(_) => {
                sessions.remove(&claims.sid);
                None
            }
            None => None,
        }
    }

    pub fn issue_token(&self, sid: Uuid) -> Result<String, AuthError> {
        self.keys.create_token(sid)
    }

    pub fn contains(&self, sid: Uuid) -> bool {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).contains_key(&sid)
    }

    pub fn user_id(&self, sid: Uuid) -> Option<u64> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&sid)
            .and_then(|data| data.user_id)
    }

    /// Bind a user to the session. Returns false for an unknown session.
    pub fn login(&self, sid: Uuid, user_id: u64) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(&sid) {
            Some(data) => {
                data.user_id = Some(user_id);
                true
            }
            None => false,
        }
    }

    pub fn invalidate(&self, sid: Uuid) {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner).remove(&sid);
    }

    pub fn push_flash(&self, sid: Uuid, kind: FlashKind, text: impl Into<String>) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(data) = sessions.get_mut(&sid) {
            data.flash.set(kind, text.into());
        }
    }

    /// Pending flash messages, cleared on read.
    pub fn take_flash(&self, sid: Uuid) -> FlashMessages {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get_mut(&sid)
            .map(|data| std::mem::take(&mut data.flash))
            .unwrap_or_default()
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, data| data.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_age_seconds(&self) -> i64 {
        self.keys.lifetime().num_seconds()
    }
}

// ── Cookie plumbing ────────────────────────────────────────────

/// Value of the session cookie, if the request carries one.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_str) = value.to_str() else {
            continue;
        };
        for cookie in cookie_str.split(';') {
            let parts: Vec<&str> = cookie.trim().splitn(2, '=').collect();
            if parts.len() == 2 && parts[0] == SESSION_COOKIE && !parts[1].is_empty() {
                return Some(parts[1].to_string());
            }
        }
    }
    None
}

pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
