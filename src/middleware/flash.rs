use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::middleware::cookie::{CookieSettings, build_cookie, clear_cookie};

pub const FLASH_COOKIE: &str = "folio_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

/// One-shot status message carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

fn read_flashes(jar: &PrivateCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok())
        .unwrap_or_default()
}

pub fn push_flash(
    jar: PrivateCookieJar,
    settings: &CookieSettings,
    level: FlashLevel,
    message: impl Into<String>,
) -> PrivateCookieJar {
    let mut flashes = read_flashes(&jar);
    flashes.push(Flash {
        level,
        message: message.into(),
    });
    match serde_json::to_string(&flashes) {
        Ok(value) => jar.add(build_cookie(FLASH_COOKIE, value, settings, None)),
        Err(e) => {
            error!(error = %e, "failed to encode flash cookie");
            jar
        }
    }
}

/// Pending messages, and a jar that no longer carries them.
pub fn take_flashes(jar: PrivateCookieJar) -> (Vec<Flash>, PrivateCookieJar) {
    let flashes = read_flashes(&jar);
    if flashes.is_empty() {
        return (flashes, jar);
    }
    (flashes, jar.remove(clear_cookie(FLASH_COOKIE)))
}
