use std::sync::Arc;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::models::user::{Session, User};
use crate::domain::ports::{SessionRepository, UserRepository};
use crate::error::AppError;

const SESSION_HOURS: i64 = 12;

/// Opaque bearer-token sessions. Tokens are random, stored hashed, and
/// expire server-side.
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self { user_repo, session_repo }
    }

    /// Creates the admin account on first boot if it does not exist yet.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.find_by_username(username).await?.is_some() {
            return Ok(());
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| AppError::Internal)?
            .to_string();

        self.user_repo.create(&User::admin(username.to_string(), hash)).await?;
        info!("Created admin user '{}'", username);
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = self.user_repo.find_by_username(username).await?
            .ok_or(AppError::Unauthorized)?;

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AppError::Unauthorized)?;

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();

        let now = Utc::now();
        let session = Session {
            token_hash: self.hash_token(&token),
            user_id: user.id.clone(),
            expires_at: now + Duration::hours(SESSION_HOURS),
            created_at: now,
        };
        self.session_repo.create(&session).await?;

        Ok(token)
    }

    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let token_hash = self.hash_token(token);

        let session = self.session_repo.find_by_hash(&token_hash).await?
            .ok_or(AppError::Unauthorized)?;

        if session.expires_at < Utc::now() {
            self.session_repo.delete(&token_hash).await?;
            return Err(AppError::Unauthorized);
        }

        self.user_repo.find_by_id(&session.user_id).await?
            .ok_or(AppError::Unauthorized)
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.session_repo.delete(&self.hash_token(token)).await
    }

    fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
