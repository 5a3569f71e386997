//! Login, signup and logout pages.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::context;
use serde::Deserialize;
use simpledo_core::{ApiError, AuthResponse, DEFAULT_REDIRECT};

use super::page;
use crate::{
    error::PageError,
    forms::{FieldErrors, JoinForm, LoginForm},
    session::{self, SessionData},
    state::AppState,
};

const FALLBACK_BANNER: &str = "Ups! Something happened. Please try again.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RedirectQuery {
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
}

/// The value for the hidden `redirectTo` field. Validated on submit, not here.
fn hidden_redirect(redirect_to: Option<&str>) -> &str {
    redirect_to
        .filter(|target| !target.is_empty())
        .unwrap_or(DEFAULT_REDIRECT)
}

/// Text for the error banner: the remote API's own message when it sent one.
fn banner(err: &ApiError) -> String {
    match err {
        ApiError::Status { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => FALLBACK_BANNER.to_string(),
    }
}

fn signed_in(jar: &PrivateCookieJar) -> bool {
    session::session_data(jar).is_some_and(|data| !data.user_id.is_empty())
}

// =============================================================================
// LOGIN
// =============================================================================

/// `GET /login`
pub async fn login_page(
    jar: PrivateCookieJar,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, PageError> {
    if signed_in(&jar) {
        return Ok(Redirect::to(DEFAULT_REDIRECT).into_response());
    }
    let form = LoginForm {
        redirect_to: query.redirect_to,
        ..LoginForm::default()
    };
    login_form(StatusCode::OK, &form, &FieldErrors::new(), None)
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => return login_form(StatusCode::BAD_REQUEST, &form, &errors, None),
    };

    match state.api.login(&request).await {
        Ok(Some(auth)) => start_session(&state, jar, auth, form.remember(), form.redirect_to.as_deref()),
        Ok(None) => {
            let errors = FieldErrors::single("email", "Invalid email or password");
            login_form(StatusCode::BAD_REQUEST, &form, &errors, None)
        }
        Err(err) => {
            tracing::error!(error = %err, "login request failed");
            login_form(StatusCode::INTERNAL_SERVER_ERROR, &form, &FieldErrors::new(), Some(banner(&err)))
        }
    }
}

fn login_form(
    status: StatusCode,
    form: &LoginForm,
    errors: &FieldErrors,
    banner: Option<String>,
) -> Result<Response, PageError> {
    page(
        status,
        "login.html",
        context! {
            form,
            errors,
            banner,
            redirect_to => hidden_redirect(form.redirect_to.as_deref()),
            remember => form.remember(),
        },
    )
}

// =============================================================================
// JOIN
// =============================================================================

/// `GET /join`
pub async fn join_page(
    jar: PrivateCookieJar,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, PageError> {
    if signed_in(&jar) {
        return Ok(Redirect::to(DEFAULT_REDIRECT).into_response());
    }
    let form = JoinForm {
        redirect_to: query.redirect_to,
        ..JoinForm::default()
    };
    join_form(StatusCode::OK, &form, &FieldErrors::new(), None)
}

/// `POST /join`
pub async fn join(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<JoinForm>,
) -> Result<Response, PageError> {
    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => return join_form(StatusCode::BAD_REQUEST, &form, &errors, None),
    };

    match state.api.register(&request).await {
        Ok(Some(auth)) => start_session(&state, jar, auth, false, form.redirect_to.as_deref()),
        Ok(None) => {
            tracing::warn!("register answered 401");
            join_form(StatusCode::INTERNAL_SERVER_ERROR, &form, &FieldErrors::new(), Some(FALLBACK_BANNER.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "register request failed");
            join_form(StatusCode::INTERNAL_SERVER_ERROR, &form, &FieldErrors::new(), Some(banner(&err)))
        }
    }
}

fn join_form(
    status: StatusCode,
    form: &JoinForm,
    errors: &FieldErrors,
    banner: Option<String>,
) -> Result<Response, PageError> {
    page(
        status,
        "join.html",
        context! {
            form,
            errors,
            banner,
            redirect_to => hidden_redirect(form.redirect_to.as_deref()),
        },
    )
}

fn start_session(
    state: &AppState,
    jar: PrivateCookieJar,
    auth: AuthResponse,
    remember: bool,
    redirect_to: Option<&str>,
) -> Result<Response, PageError> {
    let data = SessionData {
        user_id: auth.user.id,
        user_jwt: auth.token,
    };
    let session = session::create_user_session(jar, &data, remember, redirect_to, state.secure_cookies())?;
    Ok(session.into_response())
}

// =============================================================================
// LOGOUT
// =============================================================================

/// `POST /logout`
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    session::logout(state.secure_cookies())
}
