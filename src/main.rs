use mimalloc::MiMalloc;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio::router::{LIMITER_PRUNE_INTERVAL, session_key, spawn_login_limiter_pruning};
use folio::{Config, FolioState, db, folio_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        page_size = cfg.page_size,
        static_dir = %cfg.static_dir.display(),
    );

    let pool = db::connect(&cfg.database_url).await?;
    db::init_schema(&pool).await?;

    let key = session_key(&cfg.session_secret)?;
    let state = FolioState::new(cfg, pool, key);

    state
        .credentials
        .bootstrap(&state.config.admin_username, &state.config.admin_password)
        .await?;

    spawn_login_limiter_pruning(state.login_limiter.clone(), LIMITER_PRUNE_INTERVAL);

    let addr = state.config.listen_addr.clone();
    let app = folio_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
