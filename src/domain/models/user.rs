use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum accepted password length.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Registered account. The digest and salt never leave the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_digest: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        password_digest: impl Into<String>,
        salt: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_digest: password_digest.into(),
            salt: salt.into(),
            created_at: Utc::now(),
        }
    }

    pub fn as_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public view of a user returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Server-side record binding a bearer token digest to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token_digest: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token_digest: impl Into<String>, user_id: Uuid, ttl: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            token_digest: token_digest.into(),
            user_id,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub fn normalize_email(input: impl Into<String>) -> String {
    input.into().trim().to_lowercase()
}

/// Shape check only: `local@domain.tld` with no whitespace.
pub fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("nurse@apex.in"));
        assert!(looks_like_email("a.b+c@mail.example.org"));
        assert!(!looks_like_email("nurse"));
        assert!(!looks_like_email("@apex.in"));
        assert!(!looks_like_email("nurse@apex"));
        assert!(!looks_like_email("nurse@.in"));
        assert!(!looks_like_email("nurse@apex."));
        assert!(!looks_like_email("nu rse@apex.in"));
        assert!(!looks_like_email("a@b@apex.in"));
    }

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new("  Nurse@Apex.IN ", "digest", "salt");
        assert_eq!(user.email, "nurse@apex.in");
        assert_eq!(user.as_profile().email, "nurse@apex.in");
    }

    #[test]
    fn session_expiry_is_inclusive() {
        let session = Session::new("digest", Uuid::new_v4(), Duration::hours(24));
        assert!(!session.is_expired_at(session.issued_at));
        assert!(session.is_expired_at(session.expires_at));
    }
}
