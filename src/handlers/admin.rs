use axum::{
    Form,
    extract::{Path, Query, State, rejection::FormRejection},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::{error, info, warn};

use crate::error::FolioError;
use crate::middleware::session::LOGIN_PATH;
use crate::middleware::{
    AdminSession, ClientAddr, FlashLevel, RequireAdmin, push_flash, take_flashes,
};
use crate::router::FolioState;
use crate::service::feedback::normalize_search;
use crate::views;
use crate::views::admin::{FEEDBACK_PATH, feedback_url};

pub const FORCE_CHANGE_PATH: &str = "/admin/force-change";

/// Longer usernames are refused before they reach the limiter or the database.
pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub search: Option<String>,
}

/// Where to send the admin back to after a delete.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    pub page: Option<String>,
    pub search: Option<String>,
}

/// Unparseable or zero page numbers fall back to page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Login throttling bucket: one per client address and username.
pub fn login_limiter_key(client: Option<IpAddr>, username: &str) -> String {
    match client {
        Some(ip) => format!("{ip}|{username}"),
        None => format!("-|{username}"),
    }
}

/// GET /admin/login
pub async fn login_page(State(state): State<FolioState>, jar: PrivateCookieJar) -> Response {
    match AdminSession::load(&jar, &state.credentials).await {
        AdminSession::Authenticated { .. } => Redirect::to(FEEDBACK_PATH).into_response(),
        AdminSession::PendingPasswordChange { .. } => {
            Redirect::to(FORCE_CHANGE_PATH).into_response()
        }
        AdminSession::Anonymous => {
            let (flashes, jar) = take_flashes(jar);
            (jar, Html(views::admin::login_page(&flashes))).into_response()
        }
    }
}

/// POST /admin/login
pub async fn login_submit(
    State(state): State<FolioState>,
    ClientAddr(client): ClientAddr,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> (PrivateCookieJar, Redirect) {
    let username = form.username.trim().to_string();

    if username.chars().count() > MAX_USERNAME_LEN {
        info!(len = username.len(), "rejected admin login with oversized username");
        let jar = AdminSession::clear(jar);
        let jar = push_flash(
            jar,
            &state.cookies,
            FlashLevel::Danger,
            FolioError::Auth.to_string(),
        );
        return (jar, Redirect::to(LOGIN_PATH));
    }

    if state
        .login_limiter
        .check_key(&login_limiter_key(client, &username))
        .is_err()
    {
        warn!(username = %username, "admin login throttled");
        let jar = push_flash(
            jar,
            &state.cookies,
            FlashLevel::Danger,
            "Too many login attempts. Please wait a minute and try again.",
        );
        return (jar, Redirect::to(LOGIN_PATH));
    }

    let outcome = match state.credentials.verify(&username, &form.password).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "credential check failed");
            let jar = push_flash(
                jar,
                &state.cookies,
                FlashLevel::Warning,
                "Login is temporarily unavailable. Please try again.",
            );
            return (jar, Redirect::to(LOGIN_PATH));
        }
    };

    let session = AdminSession::after_login(&username, &outcome);
    let jar = session
        .clone()
        .save(jar, &state.cookies, outcome.session_version);
    match session {
        AdminSession::Anonymous => {
            info!(username = %username, "rejected admin login");
            let jar = push_flash(
                jar,
                &state.cookies,
                FlashLevel::Danger,
                FolioError::Auth.to_string(),
            );
            (jar, Redirect::to(LOGIN_PATH))
        }
        AdminSession::PendingPasswordChange { .. } => {
            info!(username = %username, "admin login requires a password change");
            let jar = push_flash(
                jar,
                &state.cookies,
                FlashLevel::Info,
                "Please choose a new password before continuing.",
            );
            (jar, Redirect::to(FORCE_CHANGE_PATH))
        }
        AdminSession::Authenticated { .. } => {
            info!(username = %username, "admin logged in");
            let jar = push_flash(jar, &state.cookies, FlashLevel::Success, "Logged in successfully.");
            (jar, Redirect::to(FEEDBACK_PATH))
        }
    }
}

/// GET /admin/force-change -> only for sessions that owe a password change.
pub async fn force_change_page(State(state): State<FolioState>, jar: PrivateCookieJar) -> Response {
    match AdminSession::load(&jar, &state.credentials).await {
        AdminSession::PendingPasswordChange { username } => {
            let (flashes, jar) = take_flashes(jar);
            (jar, Html(views::admin::force_change_page(&username, &flashes))).into_response()
        }
        AdminSession::Authenticated { .. } => Redirect::to(FEEDBACK_PATH).into_response(),
        AdminSession::Anonymous => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// POST /admin/force-change
pub async fn force_change_submit(
    State(state): State<FolioState>,
    jar: PrivateCookieJar,
    Form(form): Form<PasswordChangeForm>,
) -> (PrivateCookieJar, Redirect) {
    let session = AdminSession::load(&jar, &state.credentials).await;
    let username = match &session {
        AdminSession::PendingPasswordChange { username } => username.clone(),
        AdminSession::Authenticated { .. } => return (jar, Redirect::to(FEEDBACK_PATH)),
        AdminSession::Anonymous => return (jar, Redirect::to(LOGIN_PATH)),
    };

    match state
        .credentials
        .change_password(&username, &form.new_password, &form.confirm_password)
        .await
    {
        Ok(version) => {
            info!(username = %username, "admin password changed");
            let jar = session
                .after_password_change(&username)
                .save(jar, &state.cookies, version);
            let jar = push_flash(jar, &state.cookies, FlashLevel::Success, "Password updated.");
            (jar, Redirect::to(FEEDBACK_PATH))
        }
        Err(FolioError::Validation(msg)) => {
            let jar = push_flash(jar, &state.cookies, FlashLevel::Danger, msg);
            (jar, Redirect::to(FORCE_CHANGE_PATH))
        }
        Err(e) => {
            error!(username = %username, error = %e, "failed to change admin password");
            let jar = push_flash(
                jar,
                &state.cookies,
                FlashLevel::Warning,
                "Password could not be updated. Please try again.",
            );
            (jar, Redirect::to(FORCE_CHANGE_PATH))
        }
    }
}

/// GET /admin/logout -> revokes every session of the account, not just this
/// browser's cookie.
pub async fn logout(
    State(state): State<FolioState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let session = AdminSession::load(&jar, &state.credentials).await;
    if let Some(username) = session.username() {
        match state.credentials.end_sessions(username).await {
            Ok(()) => info!(username = %username, "admin logged out"),
            Err(e) => error!(username = %username, error = %e, "failed to revoke admin sessions"),
        }
    }
    let jar = AdminSession::clear(jar);
    let jar = push_flash(jar, &state.cookies, FlashLevel::Info, "You have been logged out.");
    (jar, Redirect::to(LOGIN_PATH))
}

/// GET /admin/feedback?page=&search=
pub async fn feedback_list(
    admin: RequireAdmin,
    State(state): State<FolioState>,
    jar: PrivateCookieJar,
    Query(query): Query<ListQuery>,
) -> Result<(PrivateCookieJar, Html<String>), FolioError> {
    let page = parse_page(query.page.as_deref());
    let listing = state
        .feedback
        .list(page, state.config.page_size, query.search.as_deref())
        .await?;
    let (flashes, jar) = take_flashes(jar);
    Ok((
        jar,
        Html(views::admin::feedback_page(&admin.username, &listing, &flashes)),
    ))
}

/// POST /delete_feedback/{id}. Failures become a warning, never an error page;
/// a missing or unreadable form body returns to page 1.
pub async fn delete_feedback(
    admin: RequireAdmin,
    State(state): State<FolioState>,
    jar: PrivateCookieJar,
    Path(id): Path<i64>,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> (PrivateCookieJar, Redirect) {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let jar = match state.feedback.delete(id).await {
        Ok(true) => {
            info!(id, admin = %admin.username, "feedback deleted");
            push_flash(jar, &state.cookies, FlashLevel::Success, "Feedback deleted.")
        }
        Ok(false) => push_flash(
            jar,
            &state.cookies,
            FlashLevel::Warning,
            "Feedback not found or already deleted.",
        ),
        Err(e) => {
            warn!(id, error = %e, "failed to delete feedback");
            push_flash(
                jar,
                &state.cookies,
                FlashLevel::Warning,
                "Could not delete feedback. Please try again.",
            )
        }
    };

    let back = feedback_url(
        parse_page(form.page.as_deref()),
        normalize_search(form.search.as_deref()).as_deref(),
    );
    (jar, Redirect::to(&back))
}

/// GET /admin/feedback/export/pdf?search= -> every match, as a PDF download.
pub async fn export_pdf(
    admin: RequireAdmin,
    State(state): State<FolioState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, FolioError> {
    let search = normalize_search(query.search.as_deref());
    let rows = state.feedback.list_all(search.as_deref()).await?;
    let bytes = state.reports.render(&rows, search.as_deref());

    let filename = format!("feedback_{}.pdf", Utc::now().format("%Y%m%d_%H%M%S"));
    info!(rows = rows.len(), admin = %admin.username, "exported feedback report");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_key_separates_clients() {
        let ip: IpAddr = "203.0.113.9".parse().expect("valid ip");
        assert_eq!(login_limiter_key(Some(ip), "admin"), "203.0.113.9|admin");
        assert_eq!(login_limiter_key(None, "admin"), "-|admin");
        assert_ne!(
            login_limiter_key(Some(ip), "admin"),
            login_limiter_key(Some("203.0.113.10".parse().expect("valid ip")), "admin")
        );
    }

    #[test]
    fn page_parameter_is_lenient() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some(" 2 ")), 2);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-4")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
    }
}
