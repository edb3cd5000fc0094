//! Authentication service - login, registration, and token handling.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::provisioning::provision_user;
use crate::config::Config;
use crate::domain::{Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// JWT claims payload: subject is the authenticated username
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Signed JWT bearer token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}

/// Registration data accepted by the auth endpoint
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Option<Vec<String>>,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user
    async fn register(&self, registration: Registration) -> AppResult<User>;

    /// Verify credentials and return a signed JWT token
    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse>;

    /// Verify a JWT token and extract its claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Generate a signed JWT token for an authenticated user
fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.username.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse { token })
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let password_hash = Password::new(&registration.password)?.into_string();
        let Registration {
            username,
            email,
            roles,
            ..
        } = registration;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    provision_user(&ctx, &username, &email, &password_hash, roles.as_deref())
                        .await
                })
            })
            .await
    }

    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_username(&username).await?;

        // Verify against a dummy hash when the user is missing so the
        // response timing does not distinguish unknown usernames from
        // wrong passwords.
        const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$MTIzNDU2Nzg5MDEyMzQ1Ng$k7uxYR9OxBeIbqtDMJJ0PqcOJ0UYm1ISdo0Mv29flGM";

        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let password_valid = Password::from_hash(stored_hash).verify(&password);

        match user {
            Some(user) if password_valid => {
                tracing::info!(username = %user.username, "User authenticated");
                generate_token(&user, &self.config)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
