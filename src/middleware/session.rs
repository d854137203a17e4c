use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::middleware::cookie::{CookieSettings, build_cookie, clear_cookie};
use crate::router::FolioState;
use crate::service::credentials::{CredentialStore, VerifyOutcome};

pub const SESSION_COOKIE: &str = "folio_session";
pub const LOGIN_PATH: &str = "/admin/login";

/// Admin session stage.
///
/// `Anonymous -> PendingPasswordChange -> Authenticated`, or straight to
/// `Authenticated` when no password change is owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AdminSession {
    Anonymous,
    PendingPasswordChange { username: String },
    Authenticated { username: String },
}

/// What the private session cookie holds. `version` has to match the
/// account's `session_version`, and `expires_at` (unix seconds) is checked on
/// every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: AdminSession,
    pub version: i64,
    pub expires_at: i64,
}

impl StoredSession {
    /// The cookie payload if present, authentic and not yet expired at `now`.
    pub fn read(jar: &PrivateCookieJar, now: i64) -> Option<Self> {
        jar.get(SESSION_COOKIE)
            .and_then(|c| serde_json::from_str::<StoredSession>(c.value()).ok())
            .filter(|stored| stored.expires_at > now)
    }

    pub fn write(&self, jar: PrivateCookieJar, settings: &CookieSettings) -> PrivateCookieJar {
        match serde_json::to_string(self) {
            Ok(value) => jar.add(build_cookie(
                SESSION_COOKIE,
                value,
                settings,
                Some(settings.session_ttl),
            )),
            Err(e) => {
                error!(error = %e, "failed to encode session cookie");
                AdminSession::clear(jar)
            }
        }
    }
}

impl AdminSession {
    /// Session for this request. A missing, tampered, expired or revoked
    /// cookie is `Anonymous`, and so is an authenticated one whose account
    /// has been flagged for a password change since.
    pub async fn load(jar: &PrivateCookieJar, credentials: &CredentialStore) -> Self {
        let Some(stored) = StoredSession::read(jar, Utc::now().timestamp()) else {
            return AdminSession::Anonymous;
        };
        let Some(username) = stored.session.username() else {
            return AdminSession::Anonymous;
        };

        match credentials
            .session_is_current(username, stored.version, stored.session.is_authenticated())
            .await
        {
            Ok(true) => stored.session,
            Ok(false) => {
                debug!(username = %username, "session cookie no longer valid");
                AdminSession::Anonymous
            }
            Err(e) => {
                error!(error = %e, "failed to check admin session");
                AdminSession::Anonymous
            }
        }
    }

    pub fn after_login(username: &str, outcome: &VerifyOutcome) -> Self {
        if !outcome.is_success() {
            return AdminSession::Anonymous;
        }
        if outcome.force_change_required {
            AdminSession::PendingPasswordChange {
                username: username.to_string(),
            }
        } else {
            AdminSession::Authenticated {
                username: username.to_string(),
            }
        }
    }

    /// Promote a pending session once `changed_for` has a new password.
    /// Any other combination leaves the session as it was.
    pub fn after_password_change(self, changed_for: &str) -> Self {
        match self {
            AdminSession::PendingPasswordChange { username } if username == changed_for => {
                AdminSession::Authenticated { username }
            }
            other => other,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AdminSession::Anonymous => None,
            AdminSession::PendingPasswordChange { username }
            | AdminSession::Authenticated { username } => Some(username),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AdminSession::Authenticated { .. })
    }

    /// Store the session, stamped with the account's `version`, for one TTL.
    pub fn save(
        self,
        jar: PrivateCookieJar,
        settings: &CookieSettings,
        version: i64,
    ) -> PrivateCookieJar {
        if matches!(self, AdminSession::Anonymous) {
            return Self::clear(jar);
        }
        StoredSession {
            session: self,
            version,
            expires_at: Utc::now().timestamp() + settings.session_ttl.whole_seconds(),
        }
        .write(jar, settings)
    }

    pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(clear_cookie(SESSION_COOKIE))
    }
}

/// Guard for admin-only handlers. Anything short of a current, authenticated
/// session is redirected to the login page before the handler runs.
#[derive(Debug, Clone)]
pub struct RequireAdmin {
    pub username: String,
}

impl FromRequestParts<FolioState> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FolioState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match AdminSession::load(&jar, &state.credentials).await {
            AdminSession::Authenticated { username } => Ok(Self { username }),
            _ => Err(Redirect::to(LOGIN_PATH).into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(matches: bool, force: bool) -> VerifyOutcome {
        VerifyOutcome {
            found: true,
            password_matches: matches,
            force_change_required: force,
            session_version: 0,
        }
    }

    #[test]
    fn failed_login_stays_anonymous() {
        assert_eq!(
            AdminSession::after_login("admin", &outcome(false, false)),
            AdminSession::Anonymous
        );
        assert_eq!(
            AdminSession::after_login("ghost", &VerifyOutcome::default()),
            AdminSession::Anonymous
        );
    }

    #[test]
    fn owed_password_change_is_never_skipped() {
        let session = AdminSession::after_login("admin", &outcome(true, true));
        assert_eq!(
            session,
            AdminSession::PendingPasswordChange {
                username: "admin".to_string()
            }
        );
        assert!(!session.is_authenticated());
    }

    #[test]
    fn clean_login_is_authenticated() {
        let session = AdminSession::after_login("admin", &outcome(true, false));
        assert!(session.is_authenticated());
        assert_eq!(session.username(), Some("admin"));
    }

    #[test]
    fn password_change_promotes_only_the_same_user() {
        let pending = AdminSession::PendingPasswordChange {
            username: "admin".to_string(),
        };
        assert_eq!(pending.clone().after_password_change("other"), pending);
        assert!(pending.after_password_change("admin").is_authenticated());
        assert_eq!(
            AdminSession::Anonymous.after_password_change("admin"),
            AdminSession::Anonymous
        );
    }

    fn stored(expires_at: i64) -> StoredSession {
        StoredSession {
            session: AdminSession::Authenticated {
                username: "admin".to_string(),
            },
            version: 3,
            expires_at,
        }
    }

    #[test]
    fn cookie_value_round_trips() {
        let json = serde_json::to_string(&stored(1_700_000_000)).expect("encode");
        assert!(json.contains(r#""stage":"authenticated""#));
        assert!(json.contains(r#""version":3"#));
        let back: StoredSession = serde_json::from_str(&json).expect("decode");
        assert_eq!(back, stored(1_700_000_000));
    }

    #[test]
    fn expired_payload_is_not_read_back() {
        let settings = CookieSettings::new(true, 120);
        let now = 1_700_000_000;
        let jar = stored(now + 60).write(PrivateCookieJar::new(Key::generate()), &settings);

        assert_eq!(StoredSession::read(&jar, now), Some(stored(now + 60)));
        assert_eq!(StoredSession::read(&jar, now + 60), None);
        assert_eq!(StoredSession::read(&jar, now + 3600), None);
    }

    #[test]
    fn saved_session_expires_after_one_ttl() {
        let settings = CookieSettings::new(true, 30);
        let before = Utc::now().timestamp();
        let jar = AdminSession::PendingPasswordChange {
            username: "admin".to_string(),
        }
        .save(PrivateCookieJar::new(Key::generate()), &settings, 7);

        let read = StoredSession::read(&jar, before).expect("fresh session");
        assert_eq!(read.version, 7);
        assert!(read.expires_at >= before + 30 * 60);
        assert!(StoredSession::read(&jar, before + 31 * 60 + 5).is_none());
    }
}
