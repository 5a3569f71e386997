//! Page-level failures and how each one turns into a response.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use minijinja::context;
use simpledo_core::ApiError;

use crate::render;

const GENERIC_FAILURE: &str = "Ups! Something happened. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// No usable session; the browser is sent to the login page.
    #[error("authentication required for {redirect_to}")]
    Unauthenticated { redirect_to: String },
    /// The remote API rejected the stored token. `jar` clears the cookie.
    #[error("session token rejected")]
    TokenRejected { jar: CookieJar },
    #[error(transparent)]
    Remote(#[from] ApiError),
    #[error("not found")]
    NotFound,
    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
}

/// `/login?redirectTo=<path>` with the path form-encoded.
pub fn login_url(redirect_to: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirectTo", redirect_to)
        .finish();
    format!("/login?{query}")
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Unauthenticated { redirect_to } => {
                Redirect::to(&login_url(&redirect_to)).into_response()
            }
            PageError::TokenRejected { jar } => (jar, Redirect::to("/")).into_response(),
            PageError::NotFound => fallback_page(
                StatusCode::NOT_FOUND,
                "not_found.html",
                "Todo not found",
            ),
            PageError::Remote(err) => {
                tracing::error!(error = %err, status = ?err.status(), "remote api failure");
                fallback_page(StatusCode::INTERNAL_SERVER_ERROR, "error.html", GENERIC_FAILURE)
            }
            PageError::Render(err) => {
                tracing::error!(error = %err, "template rendering failed");
                plain_error(GENERIC_FAILURE)
            }
        }
    }
}

fn fallback_page(status: StatusCode, template: &str, message: &str) -> Response {
    match render::render(template, context! { message }) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, template, "error page rendering failed");
            plain_error(message)
        }
    }
}

fn plain_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("<!doctype html><title>Error</title><p>{message}</p>")),
    )
        .into_response()
}
