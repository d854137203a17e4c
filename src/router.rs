use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::{AdminsStorage, FeedbackStorage, SqlitePool};
use crate::error::FolioError;
use crate::handlers::{admin, public};
use crate::middleware::CookieSettings;
use crate::service::{CredentialStore, FeedbackService, ReportRenderer};

/// How often idle login-limiter buckets are dropped.
pub const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Minimum length of `session_secret` accepted by `Key::derive_from`.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Everything a handler needs, passed explicitly through axum `State`.
#[derive(Clone)]
pub struct FolioState {
    pub config: Arc<Config>,
    pub credentials: CredentialStore,
    pub feedback: FeedbackService,
    pub reports: ReportRenderer,
    pub login_limiter: Arc<DefaultKeyedRateLimiter<String>>,
    pub cookies: CookieSettings,
    key: Key,
}

impl FolioState {
    pub fn new(config: Config, pool: SqlitePool, key: Key) -> Self {
        let attempts =
            NonZeroU32::new(config.login_attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            credentials: CredentialStore::new(AdminsStorage::new(pool.clone())),
            feedback: FeedbackService::new(FeedbackStorage::new(pool)),
            reports: ReportRenderer::new(Some(config.logo_path.clone())),
            login_limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(attempts))),
            cookies: CookieSettings::new(config.insecure_cookie, config.session_ttl_minutes),
            config: Arc::new(config),
            key,
        }
    }
}

/// Drop limiter buckets that have fully refilled; they behave like new ones.
pub fn prune_login_limiter(limiter: &DefaultKeyedRateLimiter<String>) {
    limiter.retain_recent();
    limiter.shrink_to_fit();
    debug!(keys = limiter.len(), "pruned login limiter");
}

pub fn spawn_login_limiter_pruning(
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            prune_login_limiter(&limiter);
        }
    })
}

impl FromRef<FolioState> for Key {
    fn from_ref(state: &FolioState) -> Self {
        state.key.clone()
    }
}

/// Cookie key derived from `secret`. An empty secret gets a random key, so
/// sessions end when the process restarts.
pub fn session_key(secret: &str) -> Result<Key, FolioError> {
    if secret.is_empty() {
        warn!("FOLIO_SESSION_SECRET not set; using a random key, sessions will not survive a restart");
        return Ok(Key::generate());
    }
    if secret.len() < MIN_SESSION_SECRET_LEN {
        return Err(FolioError::Validation(format!(
            "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
        )));
    }
    Ok(Key::derive_from(secret.as_bytes()))
}

pub fn folio_router(state: FolioState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/", get(public::home))
        .route("/contact", post(public::contact))
        .route(
            "/admin/login",
            get(admin::login_page).post(admin::login_submit),
        )
        .route(
            "/admin/force-change",
            get(admin::force_change_page).post(admin::force_change_submit),
        )
        .route("/admin/logout", get(admin::logout))
        .route("/admin/feedback", get(admin::feedback_list))
        .route("/admin/feedback/export/pdf", get(admin::export_pdf))
        .route("/delete_feedback/{id}", post(admin::delete_feedback))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
