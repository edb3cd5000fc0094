//! User service - user-related business rules.
//!
//! The service layer is where faults are classified: repository errors
//! become taxonomy variants with operation context, and nothing below
//! this layer decides an HTTP status.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::provisioning::provision_user;
use crate::config::EMAIL_PATTERN;
use crate::domain::{Password, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern must compile"));

/// Data for administrative user creation
#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Option<Vec<String>>,
}

/// Partial update: fields left as `None` are unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUserData {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: i32) -> AppResult<User>;

    /// Get user by email
    async fn get_user_by_email(&self, email: &str) -> AppResult<User>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// List users holding a given role name
    async fn list_users_by_role(&self, role_name: &str) -> AppResult<Vec<User>>;

    /// Check user existence without loading the record
    async fn user_exists(&self, id: i32) -> AppResult<bool>;

    /// Create a new user (administrative path).
    ///
    /// Enforces the same minimum password length as registration, which
    /// is deliberately stricter than the non-empty check applied to the
    /// other fields.
    async fn create_user(&self, data: CreateUserData) -> AppResult<User>;

    /// Partially update a user
    async fn update_user(&self, id: i32, data: UpdateUserData) -> AppResult<User>;

    /// Permanently delete a user
    async fn delete_user(&self, id: i32) -> AppResult<()>;

    /// Assign a role to a user; idempotent for already-held roles
    async fn assign_role(&self, user_id: i32, role_id: i32) -> AppResult<User>;
}

fn validate_new_user(data: &CreateUserData) -> AppResult<()> {
    let mut errors = BTreeMap::new();
    if data.username.trim().is_empty() {
        errors.insert("username".to_string(), "Username cannot be empty".to_string());
    }
    if data.email.trim().is_empty() {
        errors.insert("email".to_string(), "Email cannot be empty".to_string());
    } else if !EMAIL_REGEX.is_match(&data.email) {
        errors.insert("email".to_string(), "Invalid email format".to_string());
    }
    if data.password.is_empty() {
        errors.insert("password".to_string(), "Password cannot be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: i32) -> AppResult<User> {
        self.uow
            .users()
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("User not found with id: {}", id))
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        self.uow
            .users()
            .find_by_email(email)
            .await?
            .ok_or_not_found(format!("User not found with email: {}", email))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.uow
            .users()
            .list()
            .await
            .map_err(|e| e.with_db_context("while retrieving all users"))
    }

    async fn list_users_by_role(&self, role_name: &str) -> AppResult<Vec<User>> {
        self.uow
            .users()
            .list_by_role(role_name)
            .await
            .map_err(|e| e.with_db_context(format!("while retrieving users with role: {}", role_name)))
    }

    async fn user_exists(&self, id: i32) -> AppResult<bool> {
        self.uow.users().exists_by_id(id).await
    }

    async fn create_user(&self, data: CreateUserData) -> AppResult<User> {
        validate_new_user(&data)?;
        let password_hash = Password::new(&data.password)?.into_string();
        let CreateUserData {
            username,
            email,
            roles,
            ..
        } = data;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    provision_user(&ctx, &username, &email, &password_hash, roles.as_deref())
                        .await
                })
            })
            .await
    }

    async fn update_user(&self, id: i32, data: UpdateUserData) -> AppResult<User> {
        let password_hash = match &data.password {
            Some(password) => Some(Password::new(password)?.into_string()),
            None => None,
        };

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let current = ctx
                        .users()
                        .find_by_id(id)
                        .await?
                        .ok_or_not_found(format!("User not found with id: {}", id))?;

                    let mut new_username = None;
                    if let Some(username) = data.username {
                        if username != current.username {
                            if ctx.users().exists_by_username(&username).await? {
                                return Err(AppError::business_rule("Username already taken"));
                            }
                            new_username = Some(username);
                        }
                    }

                    let mut new_email = None;
                    if let Some(email) = data.email {
                        if email != current.email {
                            if ctx.users().exists_by_email(&email).await? {
                                return Err(AppError::business_rule("Email already registered"));
                            }
                            new_email = Some(email);
                        }
                    }

                    ctx.users()
                        .update(id, new_username, new_email, password_hash)
                        .await
                })
            })
            .await
    }

    async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.uow.users().delete(id).await
    }

    async fn assign_role(&self, user_id: i32, role_id: i32) -> AppResult<User> {
        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let user = ctx
                        .users()
                        .find_by_id(user_id)
                        .await?
                        .ok_or_not_found(format!("User not found with id: {}", user_id))?;

                    let role = ctx
                        .roles()
                        .find_by_id(role_id)
                        .await?
                        .ok_or_not_found(format!("Role not found with id: {}", role_id))?;

                    // Re-adding a held role is not an error
                    if user.has_role(role.id) {
                        return Ok(user);
                    }

                    ctx.users().add_role(user.id, role.id).await?;
                    Ok(user.with_role(role))
                })
            })
            .await
    }
}
