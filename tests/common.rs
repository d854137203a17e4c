#![allow(dead_code)]
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};
use folio::db::{self, SqlitePool};
use folio::{Config, FolioState, folio_router};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "folio-integration-tests-secret-0123456789";

/// Temporary SQLite file, removed on drop.
pub struct TestDb {
    pub path: PathBuf,
    pub pool: SqlitePool,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub fn temp_db_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "folio-{}-{}-{}.sqlite",
        name,
        std::process::id(),
        nanos
    ));
    path
}

pub async fn setup_db(name: &str) -> TestDb {
    let path = temp_db_path(name);
    let pool = db::connect(&format!("sqlite:{}", path.display()))
        .await
        .expect("failed to open test database");
    db::init_schema(&pool).await.expect("failed to init schema");
    TestDb { path, pool }
}

pub fn test_config() -> Config {
    Config {
        insecure_cookie: true,
        login_attempts_per_minute: 1000,
        page_size: 10,
        logo_path: PathBuf::from("/nonexistent/folio-logo.jpg"),
        ..Config::default()
    }
}

pub async fn setup_app(name: &str) -> (TestDb, FolioState, Router) {
    setup_app_with(name, test_config()).await
}

pub async fn setup_app_with(name: &str, config: Config) -> (TestDb, FolioState, Router) {
    let db = setup_db(name).await;
    let key = folio::router::session_key(TEST_SECRET).expect("valid test secret");
    let state = FolioState::new(config, db.pool.clone(), key);
    let app = folio_router(state.clone());
    (db, state, app)
}

/// Cookie value encrypted with the test key, as the app would set it.
pub fn sealed_cookie(name: &str, value: &str) -> String {
    let key = folio::router::session_key(TEST_SECRET).expect("valid test secret");
    let jar = PrivateCookieJar::new(key).add(Cookie::new(name.to_string(), value.to_string()));
    let resp = jar.into_response();
    let raw = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("sealed cookie header");
    let pair = raw.split(';').next().unwrap_or_default();
    let (_, sealed) = pair.split_once('=').expect("name=value");
    sealed.to_string()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Drives the router with `oneshot` and keeps cookies between requests the
/// way a browser would.
pub struct TestClient {
    app: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookies: HashMap::new(),
        }
    }

    /// Another browser on the same app, with no cookies.
    pub fn fresh(&self) -> TestClient {
        TestClient::new(self.app.clone())
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_raw_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = Request::builder().method("GET").uri(uri);
        self.send(req, Body::empty()).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(req, Body::from(body)).await
    }

    /// POST without a body or content type.
    pub async fn post_empty(&mut self, uri: &str) -> TestResponse {
        let req = Request::builder().method("POST").uri(uri);
        self.send(req, Body::empty()).await
    }

    async fn send(&mut self, mut req: axum::http::request::Builder, body: Body) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            req = req.header(header::COOKIE, cookie);
        }

        let resp = self
            .app
            .clone()
            .oneshot(req.body(body).expect("failed to build request"))
            .await
            .expect("request failed");

        for set_cookie in resp.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = set_cookie.to_str() else {
                continue;
            };
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body")
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}
