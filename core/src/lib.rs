//! Synchronous API client core for the SimpleDo web app.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The web server executes the
//! actual HTTP round-trip, so the request defaults and the outcome policy are
//! deterministic and testable on their own.
//!
//! # Design
//! - `ApiClient` is stateless: it holds only `base_url`.
//! - `RequestConfig` names every per-call option and documents its default.
//! - A remote 401 is `Ok(None)`, not an error; see `ApiClient::parse_response`.
//! - Redirect-target and form-field validation live here too, since they are
//!   pure functions the web layer must not get wrong.

pub mod client;
pub mod error;
pub mod http;
pub mod redirect;
pub mod request;
pub mod types;
pub mod validate;

pub use client::ApiClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use redirect::{safe_redirect, DEFAULT_REDIRECT};
pub use request::{RequestConfig, TransportOptions};
pub use types::{
    AuthResponse, CreateTodo, LoginRequest, RegisterRequest, Todo, TodoEnvelope,
    TodoListEnvelope, TodoStatus, UpdateTodo, User, UserEnvelope, UserRef,
};
pub use validate::{validate_email, validate_new_password, PasswordError};
