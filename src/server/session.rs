use super::state::ServerState;
use crate::account::AuthTokenValue;
use crate::error::CompanionError;
use crate::profile::Profile;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Session {
    pub account_id: usize,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";
pub const HEADER_PROFILE_ID_KEY: &str = "x-profile-id";

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Accepts both `Bearer <token>` and a bare token.
fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?;
    let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
    let token = value
        .strip_prefix("Bearer ")
        .unwrap_or(&value)
        .trim()
        .to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn extract_session_from_request_parts(parts: &Parts, ctx: &ServerState) -> Option<Session> {
    let token = match extract_session_token_from_headers(parts)
        .or_else(|| extract_session_token_from_cookies(parts))
    {
        None => {
            debug!("No token in headers nor cookies.");
            return None;
        }
        Some(x) => x,
    };

    match ctx
        .account_manager
        .current_user(&AuthTokenValue(token.clone()))
    {
        Ok(account) => Some(Session {
            account_id: account.id,
            token,
        }),
        Err(err) => {
            debug!("Could not resolve session token: {}", err);
            None
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = CompanionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).ok_or(CompanionError::Unauthorized)
    }
}

impl FromRequestParts<ServerState> for Option<Session> {
    type Rejection = CompanionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx))
    }
}

/// The profile named by the `x-profile-id` header. It must belong to the
/// session's account.
#[derive(Debug)]
pub struct ActingProfile {
    pub session: Session,
    pub profile: Profile,
}

impl FromRequestParts<ServerState> for ActingProfile {
    type Rejection = CompanionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx).await?;
        let profile_id = parts
            .headers
            .get(HEADER_PROFILE_ID_KEY)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CompanionError::Forbidden("An acting profile is required".to_string())
            })?
            .to_string();

        match ctx
            .profile_registry
            .owned_profile(session.account_id, &profile_id)
        {
            Ok(profile) => Ok(ActingProfile { session, profile }),
            Err(CompanionError::NotFound(_)) => {
                warn!(
                    "Account {} acted as profile {} it does not own",
                    session.account_id, profile_id
                );
                Err(CompanionError::Forbidden(
                    "The acting profile does not belong to this account".to_string(),
                ))
            }
            Err(err) => Err(err),
        }
    }
}
