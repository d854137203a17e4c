use crate::db::AdminsStorage;
use crate::error::FolioError;
use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Result of checking a username/password pair against the `admins` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifyOutcome {
    pub found: bool,
    pub password_matches: bool,
    pub force_change_required: bool,
    /// Stamp for sessions issued from this login.
    pub session_version: i64,
}

impl VerifyOutcome {
    pub fn is_success(&self) -> bool {
        self.found && self.password_matches
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    storage: AdminsStorage,
}

impl CredentialStore {
    pub fn new(storage: AdminsStorage) -> Self {
        Self { storage }
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<VerifyOutcome, FolioError> {
        let Some(account) = self.storage.find_by_username(username).await? else {
            return Ok(VerifyOutcome::default());
        };

        Ok(VerifyOutcome {
            found: true,
            password_matches: verify_hash(password, &account.password_hash),
            force_change_required: account.force_change,
            session_version: account.session_version,
        })
    }

    /// Replace the password and clear the force-change flag. Sessions issued
    /// before the change stop working; the returned version stamps new ones.
    pub async fn set_password(&self, username: &str, new_password: &str) -> Result<i64, FolioError> {
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;
        self.storage
            .update_password(username, &hash, false)
            .await?
            .ok_or_else(|| FolioError::NotFound("Admin account".to_string()))
    }

    /// `set_password` behind a new/confirm pair check.
    pub async fn change_password(
        &self,
        username: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<i64, FolioError> {
        if new_password != confirm_password {
            return Err(FolioError::Validation("Passwords do not match.".to_string()));
        }
        self.set_password(username, new_password).await
    }

    /// Whether a session stamped with `version` may still act for `username`.
    /// Fully authenticated sessions are also refused while a password change
    /// is owed.
    pub async fn session_is_current(
        &self,
        username: &str,
        version: i64,
        authenticated: bool,
    ) -> Result<bool, FolioError> {
        let Some(account) = self.storage.find_by_username(username).await? else {
            return Ok(false);
        };
        Ok(account.session_version == version && !(authenticated && account.force_change))
    }

    /// Revoke every session issued for `username`.
    pub async fn end_sessions(&self, username: &str) -> Result<(), FolioError> {
        self.storage.bump_session_version(username).await?;
        Ok(())
    }

    /// Seed the first admin account when the table is empty. The account must
    /// change its password at first login. Returns `true` when a row was
    /// created.
    pub async fn bootstrap(&self, username: &str, password: &str) -> Result<bool, FolioError> {
        if self.storage.count().await? > 0 {
            return Ok(false);
        }

        if username.trim().is_empty() {
            return Err(FolioError::Validation(
                "bootstrap admin username is empty (set FOLIO_ADMIN_USERNAME)".to_string(),
            ));
        }
        if password.trim().is_empty() {
            return Err(FolioError::Validation(
                "bootstrap admin password is empty (set FOLIO_ADMIN_PASSWORD)".to_string(),
            ));
        }

        let hash = hash_password(password)?;
        self.storage.insert(username.trim(), &hash, true).await?;

        warn!(
            username = %username.trim(),
            "bootstrapped admin account; password change required at first login"
        );
        Ok(true)
    }

    /// Create the account or reset its password. The account is flagged for a
    /// password change either way. Returns `true` when the account was created.
    pub async fn upsert_admin(&self, username: &str, password: &str) -> Result<bool, FolioError> {
        if username.trim().is_empty() {
            return Err(FolioError::Validation("Username must not be empty.".to_string()));
        }
        validate_password(password)?;
        let hash = hash_password(password)?;
        let created = self.storage.upsert(username.trim(), &hash, true).await?;
        info!(username = %username.trim(), created, "admin account provisioned");
        Ok(created)
    }
}

fn validate_password(password: &str) -> Result<(), FolioError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FolioError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, FolioError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

fn verify_hash(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is not an Argon2 PHC string");
            false
        }
    }
}
