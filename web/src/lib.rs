//! Server-rendered front end for the SimpleDo todo API.
//!
//! # Overview
//! Every page is rendered on the server. The browser holds one encrypted
//! session cookie; all data lives behind the remote REST API, reached
//! through `simpledo_core`'s request builder and response parser.
//!
//! # Design
//! - `session` guards pages: no token means a login redirect, a token the
//!   API rejects means the session is cleared.
//! - Handlers return `Result<Response, PageError>`; every failure renders
//!   HTML or redirects.
//! - Forms are validated locally before any remote call.

pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;

pub use config::Config;
pub use routes::{app, run};
pub use state::AppState;
