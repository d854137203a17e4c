use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Attributes shared by every cookie the site sets.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub session_ttl: Duration,
}

impl CookieSettings {
    pub fn new(insecure_cookie: bool, session_ttl_minutes: i64) -> Self {
        Self {
            secure: !insecure_cookie,
            session_ttl: Duration::minutes(session_ttl_minutes.max(1)),
        }
    }
}

/// `max_age: None` gives a browser-session cookie.
pub fn build_cookie(
    name: &str,
    value: String,
    settings: &CookieSettings,
    max_age: Option<Duration>,
) -> Cookie<'static> {
    let mut builder = Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax);
    if let Some(max_age) = max_age {
        builder = builder.max_age(max_age);
    }
    builder.build()
}

pub fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
