//! Role repository - read-only access to the role catalog.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter,
};

use super::entities::role;
use crate::domain::{Role, RoleName};
use crate::errors::AppResult;

/// Persistence contract for the role catalog. Lookup only; the catalog
/// is seeded by migration and never mutated through the API.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>>;
    async fn find_by_name(&self, name: RoleName) -> AppResult<Option<Role>>;
}

async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<Option<Role>> {
    let found = role::Entity::find_by_id(id).one(db).await?;
    found.map(Role::try_from).transpose()
}

async fn find_by_name<C: ConnectionTrait>(db: &C, name: RoleName) -> AppResult<Option<Role>> {
    let found = role::Entity::find()
        .filter(role::Column::Name.eq(name.as_str()))
        .one(db)
        .await?;
    found.map(Role::try_from).transpose()
}

/// Role repository over the pooled database connection.
pub struct RoleStore {
    db: DatabaseConnection,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for RoleStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        find_by_id(&self.db, id).await
    }

    async fn find_by_name(&self, name: RoleName) -> AppResult<Option<Role>> {
        find_by_name(&self.db, name).await
    }
}

/// Transaction-aware role repository.
pub struct TxRoleRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxRoleRepository<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl RoleRepository for TxRoleRepository<'_> {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        find_by_id(self.txn, id).await
    }

    async fn find_by_name(&self, name: RoleName) -> AppResult<Option<Role>> {
        find_by_name(self.txn, name).await
    }
}
