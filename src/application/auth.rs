//! Session authentication for authors.
//!
//! Sessions are stateless: a successful login mints a signed token carried
//! in an HttpOnly cookie, and every gated request verifies the token
//! against the configured secret. Nothing is held in process memory.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{CreateUserParams, RepoError, UsersRepo};
use crate::config::AuthSettings;
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("session token rejected: {0}")]
    Token(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// The authenticated caller attached to a gated request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    name: String,
    iat: i64,
    exp: i64,
}

pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    cookie_name: String,
}

impl AuthService {
    pub fn new(users: Arc<dyn UsersRepo>, settings: &AuthSettings) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(settings.session_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.session_secret.as_bytes()),
            session_ttl: Duration::hours(i64::from(settings.session_ttl_hours.get())),
            cookie_name: settings.cookie_name.clone(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Verify credentials and mint a session token for the user.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(
            target = "foglio::auth",
            user_id = %user.id,
            "login succeeded"
        );
        self.mint_token(&user)
    }

    fn mint_token(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            sub: user.id,
            name: user.username.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.session_ttl).unix_timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Token(err.to_string()))
    }

    /// Decode a session cookie value back into the calling user.
    pub fn verify_token(&self, token: &str) -> Result<SessionUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|err| AuthError::Token(err.to_string()))?;

        Ok(SessionUser {
            id: data.claims.sub,
            username: data.claims.name,
        })
    }

    /// Create an author account with an argon2id password hash. Used by the
    /// `user add` subcommand.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        let password_hash = hash_password(password)?;
        Ok(self
            .users
            .create_user(CreateUserParams {
                username: username.trim().to_string(),
                password_hash,
            })
            .await?)
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hashing(err.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|err| AuthError::Hashing(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use async_trait::async_trait;

    use super::*;

    struct NoUsers;

    #[async_trait]
    impl UsersRepo for NoUsers {
        async fn find_by_username(&self, _: &str) -> Result<Option<UserRecord>, RepoError> {
            Ok(None)
        }

        async fn find_by_id(&self, _: Uuid) -> Result<Option<UserRecord>, RepoError> {
            Ok(None)
        }

        async fn create_user(&self, _: CreateUserParams) -> Result<UserRecord, RepoError> {
            Err(RepoError::from_persistence("not supported"))
        }
    }

    fn service(secret: &str) -> AuthService {
        let settings = AuthSettings {
            session_secret: secret.to_string(),
            session_ttl_hours: NonZeroU32::new(24).expect("non-zero ttl"),
            cookie_name: "foglio_session".to_string(),
        };
        AuthService::new(Arc::new(NoUsers), &settings)
    }

    fn user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").expect("hashed");
        assert!(verify_password("correct horse", &hash).expect("verified"));
        assert!(!verify_password("wrong", &hash).expect("verified"));
    }

    #[test]
    fn session_token_round_trip() {
        let auth = service("unit-test-secret");
        let user = user();
        let token = auth.mint_token(&user).expect("minted");
        let session = auth.verify_token(&token).expect("verified");

        assert_eq!(session.id, user.id);
        assert_eq!(session.username, "ada");
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = service("secret-one").mint_token(&user()).expect("minted");
        let err = service("secret-two")
            .verify_token(&token)
            .expect_err("rejected");
        assert!(matches!(err, AuthError::Token(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = service("unit-test-secret")
            .verify_token("not-a-token")
            .expect_err("rejected");
        assert!(matches!(err, AuthError::Token(_)));
    }
}
