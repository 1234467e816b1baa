use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::CoreError;

/// Issued tokens stay valid for 7 days.
const TOKEN_LIFETIME_DAYS: i64 = 7;

/// A registered user, as returned to callers (no credentials attached).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Successful signup/login result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// JWT payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject — user id
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

struct StoredUser {
    user: User,
    password_hash: String,
}

/// Thin credential store behind a token-issuing API.
///
/// Users live in memory, keyed by lowercased email; passwords are hashed
/// with Argon2id and tokens are HS256 JWTs. This is the whole auth
/// surface — portfolio data never flows through it.
pub struct AuthService {
    users: HashMap<String, StoredUser>,
    jwt_secret: Vec<u8>,
}

impl AuthService {
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            users: HashMap::new(),
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Register a new user and issue a token.
    /// Rejects duplicate emails and weak passwords.
    pub fn signup(&mut self, email: &str, password: &str, name: &str) -> Result<AuthSession, CoreError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(CoreError::ValidationError(format!(
                "Invalid email address: '{email}'"
            )));
        }
        validate_password_strength(password)?;
        if self.users.contains_key(&email) {
            return Err(CoreError::DuplicateEmail(email));
        }

        let password_hash = hash_password(password)?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        self.users.insert(
            email,
            StoredUser {
                user: user.clone(),
                password_hash,
            },
        );

        let token = self.issue_token(&user)?;
        Ok(AuthSession { user, token })
    }

    /// Verify credentials and issue a fresh token.
    /// Wrong email and wrong password produce the same error.
    pub fn login(&self, email: &str, password: &str) -> Result<AuthSession, CoreError> {
        let email = email.trim().to_lowercase();
        let stored = self
            .users
            .get(&email)
            .ok_or(CoreError::InvalidCredentials)?;

        verify_password(password, &stored.password_hash)?;

        let token = self.issue_token(&stored.user)?;
        Ok(AuthSession {
            user: stored.user.clone(),
            token,
        })
    }

    /// Validate a token and return the user it belongs to.
    pub fn verify_token(&self, token: &str) -> Result<User, CoreError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.jwt_secret),
            &Validation::default(),
        )?;

        self.users
            .get(&data.claims.email)
            .filter(|stored| stored.user.id == data.claims.sub)
            .map(|stored| stored.user.clone())
            .ok_or(CoreError::InvalidToken)
    }

    /// Look up a user by id.
    pub fn user_by_id(&self, user_id: &str) -> Option<&User> {
        self.users
            .values()
            .find(|stored| stored.user.id == user_id)
            .map(|stored| &stored.user)
    }

    fn issue_token(&self, user: &User) -> Result<String, CoreError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.jwt_secret),
        )?)
    }
}

/// Hash a password with Argon2id; the salt is generated per call, so the
/// same password never hashes the same way twice.
fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CoreError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), CoreError> {
    let parsed = PasswordHash::new(hash).map_err(|_| CoreError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| CoreError::InvalidCredentials)
}

/// Minimum requirements: 8+ chars, at least one digit and one letter.
fn validate_password_strength(password: &str) -> Result<(), CoreError> {
    if password.len() < 8 {
        return Err(CoreError::ValidationError(
            "Password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(CoreError::ValidationError(
            "Password must contain at least one digit".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::ValidationError(
            "Password must contain at least one letter".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(b"test-secret".to_vec())
    }

    #[test]
    fn signup_then_login() {
        let mut auth = service();
        let session = auth.signup("user@example.com", "password1", "User").unwrap();
        assert_eq!(session.user.email, "user@example.com");
        assert!(!session.token.is_empty());

        let login = auth.login("USER@example.com", "password1").unwrap();
        assert_eq!(login.user.id, session.user.id);
    }

    #[test]
    fn duplicate_email_rejected() {
        let mut auth = service();
        auth.signup("user@example.com", "password1", "User").unwrap();
        let err = auth.signup("User@Example.com", "password2", "Other");
        assert!(matches!(err, Err(CoreError::DuplicateEmail(_))));
    }

    #[test]
    fn wrong_password_rejected() {
        let mut auth = service();
        auth.signup("user@example.com", "password1", "User").unwrap();
        assert!(matches!(
            auth.login("user@example.com", "wrongpass1"),
            Err(CoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn weak_passwords_rejected() {
        let mut auth = service();
        assert!(auth.signup("a@b.com", "short1", "A").is_err());
        assert!(auth.signup("a@b.com", "passwordonly", "A").is_err());
        assert!(auth.signup("a@b.com", "12345678", "A").is_err());
    }

    #[test]
    fn token_round_trip() {
        let mut auth = service();
        let session = auth.signup("user@example.com", "password1", "User").unwrap();
        let user = auth.verify_token(&session.token).unwrap();
        assert_eq!(user.id, session.user.id);
    }

    #[test]
    fn garbage_token_rejected() {
        let auth = service();
        assert!(matches!(
            auth.verify_token("not-a-token"),
            Err(CoreError::InvalidToken)
        ));
    }

    #[test]
    fn token_from_other_secret_rejected() {
        let mut issuing = AuthService::new(b"secret-a".to_vec());
        let session = issuing.signup("user@example.com", "password1", "U").unwrap();

        let verifying = AuthService::new(b"secret-b".to_vec());
        assert!(verifying.verify_token(&session.token).is_err());
    }
}
