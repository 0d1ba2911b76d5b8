//! Session cookie handling. The actor name lives in a plain cookie; the
//! local store trusts whoever presents it.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use hof_core::error::{AppError, Result};
use hof_core::models::Session;

pub const SESSION_COOKIE: &str = "hof_actor";

/// The session, if the request carried a valid one.
#[derive(Debug, Clone, Default)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
    /// Writes need an actor.
    pub fn require(self) -> Result<Session> {
        self.0.ok_or_else(|| {
            AppError::Unauthorized("choose an actor name in settings first".to_string())
        })
    }

    pub fn actor(&self) -> Option<&str> {
        self.0.as_ref().map(|s| s.actor.as_str())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(MaybeSession(session_from_headers(&parts.headers)))
    }
}

pub fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, actor)| Session::new(actor).ok())
}

/// `Set-Cookie` for signing in, or for signing out when `session` is `None`.
pub fn session_cookie(session: Option<&Session>) -> (axum::http::HeaderName, HeaderValue) {
    let value = match session {
        Some(session) => format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            session.actor
        ),
        None => format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    };
    // Actor names are restricted to header-safe characters
    let value = HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""));
    (SET_COOKIE, value)
}
