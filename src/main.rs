use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mergington::services::{auth_service, notification_service};
use mergington::web::{self, AppState};
use mergington::{database, AppConfig, AppError, AppResult};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mergington=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    info!(database = %config.database_url, "connecting to database");
    let pool = database::init(&config).await?;

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        if auth_service::ensure_admin(&pool, email, password).await? {
            info!(email = %email, "bootstrapped admin account");
        }
    }

    if let Some(url) = config.notify_webhook_url.clone() {
        let _dispatcher =
            notification_service::spawn_dispatcher(pool.clone(), url, config.notify_interval);
    }

    let listener = bind_with_fallback(&config.host, config.port).await?;
    let bound_addr = listener.local_addr()?;

    let app = web::router(AppState::new(pool, config));
    info!("server listening on http://{}", bound_addr);
    info!("API documentation at http://{}/openapi.json", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;
    info!("server shut down");
    Ok(())
}

/// Tries `port`, then `port + 1`.
async fn bind_with_fallback(host: &str, port: u16) -> AppResult<TcpListener> {
    let addr = socket_addr(host, port)?;
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            let fallback = socket_addr(host, port.saturating_add(1))?;
            warn!(addr = %addr, error = %e, fallback = %fallback, "bind failed, trying fallback port");
            Ok(TcpListener::bind(fallback).await?)
        }
    }
}

fn socket_addr(host: &str, port: u16) -> AppResult<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| AppError::Internal(format!("invalid bind address {}:{}: {}", host, port, e)))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
