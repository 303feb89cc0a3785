//! # Complaint Box Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use cb_api::{AppState, CookieSettings};
use cb_config::Settings;
use cb_core::traits::{AuthProvider, ComplaintRepo, UserRepo};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// Feature-gated imports: each port is filled by exactly one plugin
#[cfg(feature = "db-sqlite")]
use cb_db_sqlite::SqliteStore;

#[cfg(feature = "auth-jwt")]
use cb_auth_jwt::JwtAuthProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "auth-jwt")))]
compile_error!("complaint-box needs a storage plugin (db-sqlite) and an auth plugin (auth-jwt)");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("invalid configuration")?;
    init_tracing(settings.log.json);

    // 1. Initialize Database Implementation
    let store = Arc::new(
        SqliteStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("failed to initialize sqlite store")?,
    );
    let complaints: Arc<dyn ComplaintRepo> = store.clone();
    let users: Arc<dyn UserRepo> = store;

    // 2. Initialize Auth Implementation
    let ttl = chrono::Duration::hours(settings.auth.token_ttl_hours);
    let auth: Arc<dyn AuthProvider> = Arc::new(JwtAuthProvider::new(
        settings.auth.jwt_secret.expose_secret(),
        ttl,
    ));

    // 3. Wrap in AppState (dynamic dispatch keeps plugins swappable)
    let cookies = CookieSettings {
        secure: settings.is_production(),
        max_age_secs: ttl.num_seconds(),
    };
    let state = AppState::new(complaints, users, auth, cookies);

    let origin = HeaderValue::from_str(&settings.cors.allowed_origin)
        .context("cors.allowed_origin is not a valid header value")?;
    let app = cb_api::app(state, origin);

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, environment = %settings.environment, "complaint-box listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shut down cleanly");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
