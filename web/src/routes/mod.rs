//! HTTP surface of the web app.

pub mod auth;
pub mod todos;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{error::PageError, render, session::UserToken, state::AppState};

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/join", get(auth::join_page).post(auth::join))
        .route("/logout", post(auth::logout))
        .route("/todos", get(todos::list))
        .route("/todos/new", post(todos::create))
        .route(
            "/todos/{id}",
            get(todos::show)
                .post(todos::submit)
                .patch(todos::update)
                .delete(todos::delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn index(_token: UserToken) -> Redirect {
    Redirect::to("/todos")
}

async fn healthz() -> &'static str {
    "ok"
}

/// Render `template` as an HTML response with the given status.
pub(crate) fn page<S: Serialize>(
    status: StatusCode,
    template: &str,
    ctx: S,
) -> Result<Response, PageError> {
    let html = render::render(template, ctx)?;
    Ok((status, Html(html)).into_response())
}
