#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request},
    response::{IntoResponse, Response},
    Router,
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};
use http_body_util::BodyExt;
use simpledo_web::{
    session::{self, SessionData, SESSION_COOKIE},
    AppState, Config,
};
use tokio::net::TcpListener;

pub const SECRET: &str = "integration-secret-with-at-least-32-bytes";

pub fn config(api_base_url: &str) -> Config {
    Config {
        api_base_url: api_base_url.to_string(),
        session_secret: SECRET.to_string(),
        port: 0,
        secure_cookies: false,
        api_timeout: Duration::from_secs(5),
    }
}

pub fn web_app(api_base_url: &str) -> Router {
    simpledo_web::app(AppState::new(config(api_base_url)).unwrap())
}

/// Serve `router` on a random local port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub async fn mock_api() -> String {
    spawn(mock_server::app()).await
}

/// A base URL nothing listens on; any remote call fails with a transport error.
pub fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// --- requests ---

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delete(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

// --- responses ---

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// The raw `Set-Cookie` value for the session cookie, if the response set one.
pub fn session_set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .map(str::to_string)
}

/// Convert the session `Set-Cookie` into a request `Cookie` header value.
pub fn request_cookie(response: &Response) -> String {
    let raw = session_set_cookie(response).expect("session cookie set");
    let cookie = Cookie::parse(raw).unwrap();
    format!("{}={}", cookie.name(), cookie.value())
}

/// Decrypt the session written by `response` with the app key.
pub fn decrypt_session(response: &Response) -> Option<SessionData> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&request_cookie(response)).unwrap(),
    );
    let jar = PrivateCookieJar::from_headers(&headers, session::session_key(SECRET));
    session::session_data(&jar)
}

/// A request `Cookie` header carrying an encrypted session.
pub fn cookie_for(user_id: &str, token: &str) -> String {
    let data = SessionData {
        user_id: user_id.to_string(),
        user_jwt: token.to_string(),
    };
    let jar = PrivateCookieJar::new(session::session_key(SECRET));
    let response = session::create_user_session(jar, &data, false, None, false)
        .unwrap()
        .into_response();
    request_cookie(&response)
}
