/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用順 (外側から):
 *   panic recovery / request id / trace → security headers → session → auth → CSRF → routes
 * - axum::serve() で起動、SIGINT/SIGTERM で graceful shutdown
 */
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    middleware,
    repos::{PgSnippetRepo, PgUserRepo},
    services::session::CookieSessionStore,
    state::AppState,
    web,
};

pub async fn run() -> Result<()> {
    init_tracing();
    init_panic_hook();

    let config = Config::from_env()?;
    tracing::info!(?config, "configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    let state = AppState::new(
        Arc::new(PgSnippetRepo::new(pool.clone())),
        Arc::new(PgUserRepo::new(pool.clone())),
        CookieSessionStore::new(
            &config.secret_key,
            config.app_env.is_production(),
            config.session_lifetime,
        ),
    );

    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}

pub(crate) fn build_router(state: AppState, config: &Config) -> Router {
    let router = web::routes(&config.static_dir);

    // session → auth → csrf: later layers wrap earlier ones
    let router = middleware::csrf::apply(router);
    let router = middleware::auth::apply(router, state.clone());
    let router = middleware::session::apply(router, state.clone());

    let app = router.with_state(state);
    let app = middleware::security_headers::apply(app);
    middleware::http::apply(app)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Panics outside the request path (background tasks, startup) still reach the log.
fn init_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "panic");
        default_hook(info);
    }));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
