use anyhow::Context;
use simpledo_web::{AppState, Config};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("simpledo_web=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(api = %config.api_base_url, secure_cookies = config.secure_cookies, "configuration loaded");

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config).context("failed to initialise application state")?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "simpledo web listening");

    simpledo_web::run(listener, state).await.context("server error")
}
