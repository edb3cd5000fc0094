//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and transaction lifecycle. Read-then-write
//! flows (registration, create, partial update, role assignment) run their
//! uniqueness checks and writes inside one transaction so concurrent
//! requests cannot both pass an application-level check and commit; the
//! unique constraints on `users` remain the final backstop.

use async_trait::async_trait;
use sea_orm::{AccessMode, DatabaseConnection, IsolationLevel, TransactionTrait};
use std::sync::Arc;

use super::repositories::{
    RoleRepository, RoleStore, TxRoleRepository, TxUserRepository, UserRepository, UserStore,
};
use crate::errors::{AppError, AppResult};

/// Repository access within an open transaction.
///
/// Holds trait objects so tests can run transactional service flows
/// against mock or in-memory repositories.
pub struct TransactionContext<'a> {
    users: &'a dyn UserRepository,
    roles: &'a dyn RoleRepository,
}

impl<'a> TransactionContext<'a> {
    pub fn new(users: &'a dyn UserRepository, roles: &'a dyn RoleRepository) -> Self {
        Self { users, roles }
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.users
    }

    pub fn roles(&self) -> &dyn RoleRepository {
        self.roles
    }
}

/// Unit of Work trait for dependency injection.
///
/// Plain accessors serve single-statement reads; `transaction` wraps a
/// closure in begin/commit/rollback with repository access bound to the
/// transaction.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get role repository
    fn roles(&self) -> Arc<dyn RoleRepository>;

    /// Execute a closure within a transaction.
    ///
    /// Committed on success, rolled back on error.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(
                TransactionContext<'a>,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Concrete implementation of UnitOfWork over a SeaORM connection.
pub struct Persistence {
    db: DatabaseConnection,
    users: Arc<UserStore>,
    roles: Arc<RoleStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        let users = Arc::new(UserStore::new(db.clone()));
        let roles = Arc::new(RoleStore::new(db.clone()));
        Self { db, users, roles }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn roles(&self) -> Arc<dyn RoleRepository> {
        self.roles.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(
                TransactionContext<'a>,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(AppError::from)?;

        let users = TxUserRepository::new(&txn);
        let roles = TxRoleRepository::new(&txn);
        let ctx = TransactionContext::new(&users, &roles);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}
