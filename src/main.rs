mod config;
mod csrf;
mod db;
mod entities;
mod error;
mod forms;
mod models;
mod routes;
mod store;
mod templates;

use axum::extract::FromRef;
use cookie::Key;

use crate::{config::Config, store::MovieStore};

#[derive(Clone)]
pub struct AppState {
    pub store: MovieStore,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(store: MovieStore, secret_key: &str) -> Self {
        Self { store, cookie_key: csrf::signing_key(secret_key) }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,top_movies=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(db::connect_options(
        &config.database_url,
        config.db_max_connections,
    ))
    .await?;
    let store = MovieStore::new(db);

    let state = AppState::new(store.clone(), &config.secret_key);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, database = %config.database_url, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("shutting down");
    store.close().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
