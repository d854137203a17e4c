use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration, read from `FOLIO_*` environment variables on top of
/// the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Master secret for the private session cookie. Empty means a random key
    /// per process.
    pub session_secret: String,
    pub session_ttl_minutes: i64,
    pub insecure_cookie: bool,
    pub admin_username: String,
    pub admin_password: String,
    pub page_size: u32,
    pub site_title: String,
    pub static_dir: PathBuf,
    pub logo_path: PathBuf,
    pub login_attempts_per_minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:database.db".to_string(),
            loglevel: "info".to_string(),
            session_secret: String::new(),
            session_ttl_minutes: 120,
            insecure_cookie: false,
            admin_username: "admin".to_string(),
            admin_password: "changeme".to_string(),
            page_size: 10,
            site_title: "Portfolio".to_string(),
            static_dir: PathBuf::from("static"),
            logo_path: PathBuf::from("static/img/logo.jpg"),
            login_attempts_per_minute: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed("FOLIO_"))
    }
}
