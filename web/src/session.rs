//! Cookie-backed session: who is signed in and with which API token.
//!
//! The session is a single encrypted cookie holding `{"userId","userJwt"}`.
//! It is never stored server-side; the remote API is asked for the user on
//! every page that needs one. Only a 401 from `/users/me` ends the session.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use simpledo_core::{safe_redirect, ApiError, User, DEFAULT_REDIRECT};
use time::Duration;

use crate::{api::RemoteApi, error::PageError, state::AppState};

pub const SESSION_COOKIE: &str = "__session";

/// Lifetime of a "remember me" session.
pub const REMEMBER_ME: Duration = Duration::days(7);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user_id: String,
    pub user_jwt: String,
}

/// Derive the 64-byte cookie key from the configured secret.
pub fn session_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// The decoded session, if the cookie is present, decrypts and parses.
pub fn session_data(jar: &PrivateCookieJar) -> Option<SessionData> {
    let cookie = jar.get(SESSION_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

pub fn user_jwt(jar: &PrivateCookieJar) -> Option<String> {
    session_data(jar)
        .map(|data| data.user_jwt)
        .filter(|token| !token.is_empty())
}

/// The stored token, or a redirect to the login page that comes back to
/// `path` afterwards. Makes no network call.
pub fn require_user_jwt(jar: &PrivateCookieJar, path: &str) -> Result<String, PageError> {
    user_jwt(jar).ok_or_else(|| PageError::Unauthenticated {
        redirect_to: path.to_string(),
    })
}

/// Resolve the session into a user. No token is `Ok(None)`; a token the API
/// rejects ends the session.
pub async fn get_user(
    api: &RemoteApi,
    jar: &PrivateCookieJar,
    secure: bool,
) -> Result<Option<User>, PageError> {
    let Some(token) = user_jwt(jar) else {
        return Ok(None);
    };
    user_for_token(api, &token, secure).await.map(Some)
}

/// Like `get_user`, but a missing session redirects to login.
pub async fn require_user(
    api: &RemoteApi,
    jar: &PrivateCookieJar,
    path: &str,
    secure: bool,
) -> Result<(String, User), PageError> {
    let token = require_user_jwt(jar, path)?;
    let user = user_for_token(api, &token, secure).await?;
    Ok((token, user))
}

/// Look up the owner of `token`; a rejected token ends the session.
pub async fn user_for_token(api: &RemoteApi, token: &str, secure: bool) -> Result<User, PageError> {
    api.current_user(token)
        .await?
        .ok_or_else(|| token_rejected(secure))
}

/// A todo call answered 401. The session ends only if `/users/me` rejects
/// the token too; otherwise the failure is reported as a remote error.
pub async fn rejected_call(api: &RemoteApi, token: &str, secure: bool) -> PageError {
    match user_for_token(api, token, secure).await {
        Ok(user) => {
            tracing::warn!(user_id = %user.id, "api rejected a todo call for a valid token");
            PageError::Remote(ApiError::Status {
                status: 401,
                message: "Unauthorized".to_string(),
            })
        }
        Err(err) => err,
    }
}

/// `/users/me` answered 401 for a stored token: clear the cookie and go home.
fn token_rejected(secure: bool) -> PageError {
    tracing::info!("api rejected session token, signing out");
    PageError::TokenRejected {
        jar: clear_session(secure),
    }
}

/// Store the session and redirect to a validated `redirect_to`.
///
/// `remember` persists the cookie for seven days; otherwise it lives for
/// the browser session.
pub fn create_user_session(
    jar: PrivateCookieJar,
    data: &SessionData,
    remember: bool,
    redirect_to: Option<&str>,
    secure: bool,
) -> Result<(PrivateCookieJar, Redirect), PageError> {
    let payload = serde_json::to_string(data)
        .map_err(|err| PageError::Remote(ApiError::Serialization(err.to_string())))?;
    let max_age = remember.then_some(REMEMBER_ME);
    let target = safe_redirect(redirect_to, DEFAULT_REDIRECT);
    tracing::info!(user_id = %data.user_id, remember, "session created");
    Ok((jar.add(session_cookie(payload, max_age, secure)), Redirect::to(target)))
}

/// An already-expired replacement cookie. Works whether or not the current
/// cookie still decrypts.
pub fn clear_session(secure: bool) -> CookieJar {
    CookieJar::new().add(session_cookie(String::new(), Some(Duration::ZERO), secure))
}

pub fn logout(secure: bool) -> (CookieJar, Redirect) {
    (clear_session(secure), Redirect::to("/"))
}

fn session_cookie(value: String, max_age: Option<Duration>, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    if let Some(max_age) = max_age {
        cookie.set_max_age(max_age);
    }
    cookie
}

fn request_path(parts: &Parts) -> String {
    // Nested routers strip their prefix from `uri`; `OriginalUri` keeps it.
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// The stored API token. Rejects with a login redirect when there is none.
pub struct UserToken(pub String);

impl FromRequestParts<AppState> for UserToken {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.key.clone());
        require_user_jwt(&jar, &request_path(parts)).map(UserToken)
    }
}

/// The signed-in user, resolved through `GET /users/me`.
pub struct CurrentUser {
    pub token: String,
    pub user: User,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.key.clone());
        let (token, user) =
            require_user(&state.api, &jar, &request_path(parts), state.secure_cookies()).await?;
        Ok(Self { token, user })
    }
}
