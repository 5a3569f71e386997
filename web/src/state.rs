use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::{api::RemoteApi, config::Config, render, session};

/// Shared, immutable per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: RemoteApi,
    pub key: Key,
}

impl AppState {
    /// Build the HTTP client, derive the cookie key and compile the
    /// templates. Fails instead of deferring errors to the first request.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let api = RemoteApi::new(&config.api_base_url, config.api_timeout)?;
        let key = session::session_key(&config.session_secret);
        render::environment()?;
        Ok(Self {
            config: Arc::new(config),
            api,
            key,
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.secure_cookies
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}
