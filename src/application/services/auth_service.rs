use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    application::dtos::{AuthResponse, CredentialsRequest},
    domain::{
        models::user::{looks_like_email, normalize_email, MIN_PASSWORD_CHARS},
        DomainError, Session, User, UserProfile,
    },
};

/// Contract for account and session persistence.
pub trait UserStore: Send + Sync {
    /// Fails with [`DomainError::AlreadyExists`] when the email is taken.
    fn create_user(&self, user: &User) -> Result<(), DomainError>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    fn find_user(&self, id: &Uuid) -> Result<Option<User>, DomainError>;

    fn save_session(&self, session: &Session) -> Result<(), DomainError>;

    fn find_session(&self, token_digest: &str) -> Result<Option<Session>, DomainError>;

    fn revoke_session(&self, token_digest: &str) -> Result<(), DomainError>;
}

/// Registration, login and bearer token verification.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    pub fn register(&self, payload: CredentialsRequest) -> Result<AuthResponse, DomainError> {
        let email = normalize_email(payload.email);
        validate_credentials(&email, &payload.password)?;
        if !looks_like_email(&email) {
            return Err(DomainError::validation("Please enter a valid email"));
        }
        if payload.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_CHARS} characters long"
            )));
        }

        let salt = random_token();
        let digest = password_digest(&salt, &payload.password);
        let user = User::new(email, digest, salt);
        self.store.create_user(&user)?;

        tracing::info!(user = %user.email, "user registered");
        self.issue(&user)
    }

    pub fn login(&self, payload: CredentialsRequest) -> Result<AuthResponse, DomainError> {
        let email = normalize_email(payload.email);
        validate_credentials(&email, &payload.password)?;

        let user = self
            .store
            .find_user_by_email(&email)?
            .ok_or_else(|| DomainError::unauthorized("Invalid credentials"))?;

        let candidate = password_digest(&user.salt, &payload.password);
        if !digests_match(&candidate, &user.password_digest) {
            return Err(DomainError::unauthorized("Invalid credentials"));
        }

        tracing::info!(user = %user.email, "user logged in");
        self.issue(&user)
    }

    /// Resolves a bearer token to its user. Expired sessions are removed.
    pub fn authenticate(&self, token: &str) -> Result<UserProfile, DomainError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::unauthorized("Authentication required"));
        }

        let digest = token_digest(token);
        let session = self
            .store
            .find_session(&digest)?
            .ok_or_else(|| DomainError::unauthorized("Invalid token"))?;

        if session.is_expired_at(Utc::now()) {
            self.store.revoke_session(&digest)?;
            return Err(DomainError::unauthorized("Token expired"));
        }

        let user = self
            .store
            .find_user(&session.user_id)?
            .ok_or_else(|| DomainError::unauthorized("Invalid token"))?;

        Ok(user.as_profile())
    }

    fn issue(&self, user: &User) -> Result<AuthResponse, DomainError> {
        let token = random_token();
        let session = Session::new(token_digest(&token), user.id, self.token_ttl);
        self.store.save_session(&session)?;

        Ok(AuthResponse {
            user: user.as_profile(),
            token,
        })
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), DomainError> {
    if email.is_empty() || password.is_empty() {
        return Err(DomainError::validation("Email and password are required"));
    }
    Ok(())
}

/// 32 random bytes, URL-safe base64.
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn token_digest(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

fn digests_match(left: &str, right: &str) -> bool {
    left.len() == right.len()
        && left
            .bytes()
            .zip(right.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
