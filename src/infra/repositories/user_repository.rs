//! User repository - persistence operations for users and their role set.
//!
//! The query logic is written once, generic over any SeaORM connection,
//! and exposed through two thin implementations: `UserStore` over the
//! pooled connection and `TxUserRepository` over an open transaction.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, NotSet, PaginatorTrait, QueryFilter, Set,
};

use super::entities::{role, user, user_role};
use crate::domain::{Role, User};
use crate::errors::{AppError, AppResult};

/// Persistence contract for users.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn exists_by_id(&self, id: i32) -> AppResult<bool>;
    async fn exists_by_username(&self, username: &str) -> AppResult<bool>;
    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;
    async fn list(&self) -> AppResult<Vec<User>>;
    async fn list_by_role(&self, role_name: &str) -> AppResult<Vec<User>>;

    /// Insert a new user with no roles yet; role membership is written
    /// separately through `add_role`.
    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> AppResult<User>;

    /// Apply a partial update. Fields passed as `None` are left unchanged.
    async fn update(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> AppResult<User>;

    /// Add a row to the `user_roles` join table.
    async fn add_role(&self, user_id: i32, role_id: i32) -> AppResult<()>;

    /// Hard delete. Join rows are removed by the cascade constraint.
    async fn delete(&self, id: i32) -> AppResult<()>;
}

fn into_domain(model: user::Model, roles: Vec<role::Model>) -> AppResult<User> {
    let roles = roles
        .into_iter()
        .map(Role::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        roles,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

async fn with_roles<C: ConnectionTrait>(
    db: &C,
    found: Option<user::Model>,
) -> AppResult<Option<User>> {
    match found {
        Some(model) => {
            let roles = model.find_related(role::Entity).all(db).await?;
            Ok(Some(into_domain(model, roles)?))
        }
        None => Ok(None),
    }
}

async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<Option<User>> {
    let found = user::Entity::find_by_id(id).one(db).await?;
    with_roles(db, found).await
}

async fn find_by_username<C: ConnectionTrait>(db: &C, username: &str) -> AppResult<Option<User>> {
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;
    with_roles(db, found).await
}

async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> AppResult<Option<User>> {
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    with_roles(db, found).await
}

async fn exists_by_id<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<bool> {
    let count = user::Entity::find_by_id(id).count(db).await?;
    Ok(count > 0)
}

async fn exists_by_username<C: ConnectionTrait>(db: &C, username: &str) -> AppResult<bool> {
    let count = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .count(db)
        .await?;
    Ok(count > 0)
}

async fn exists_by_email<C: ConnectionTrait>(db: &C, email: &str) -> AppResult<bool> {
    let count = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .count(db)
        .await?;
    Ok(count > 0)
}

async fn list<C: ConnectionTrait>(db: &C) -> AppResult<Vec<User>> {
    let pairs = user::Entity::find()
        .find_with_related(role::Entity)
        .all(db)
        .await?;
    pairs
        .into_iter()
        .map(|(model, roles)| into_domain(model, roles))
        .collect()
}

async fn list_by_role<C: ConnectionTrait>(db: &C, role_name: &str) -> AppResult<Vec<User>> {
    let Some(role) = role::Entity::find()
        .filter(role::Column::Name.eq(role_name))
        .one(db)
        .await?
    else {
        return Ok(Vec::new());
    };

    let links = user_role::Entity::find()
        .filter(user_role::Column::RoleId.eq(role.id))
        .all(db)
        .await?;
    let user_ids: Vec<i32> = links.into_iter().map(|l| l.user_id).collect();
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let pairs = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .find_with_related(role::Entity)
        .all(db)
        .await?;
    pairs
        .into_iter()
        .map(|(model, roles)| into_domain(model, roles))
        .collect()
}

async fn insert<C: ConnectionTrait>(
    db: &C,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    let now = Utc::now();
    let active = user::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let model = active.insert(db).await?;
    into_domain(model, Vec::new())
}

async fn update<C: ConnectionTrait>(
    db: &C,
    id: i32,
    username: Option<String>,
    email: Option<String>,
    password_hash: Option<String>,
) -> AppResult<User> {
    let model = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User not found with id: {}", id)))?;

    let mut active: user::ActiveModel = model.into();
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(password_hash) = password_hash {
        active.password_hash = Set(password_hash);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(db).await?;
    let roles = model.find_related(role::Entity).all(db).await?;
    into_domain(model, roles)
}

async fn add_role<C: ConnectionTrait>(db: &C, user_id: i32, role_id: i32) -> AppResult<()> {
    let active = user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
    };
    active.insert(db).await?;
    Ok(())
}

async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<()> {
    let result = user::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("User not found with id: {}", id)));
    }
    Ok(())
}

/// User repository over the pooled database connection.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        find_by_id(&self.db, id).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        find_by_username(&self.db, username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        find_by_email(&self.db, email).await
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        exists_by_id(&self.db, id).await
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        exists_by_username(&self.db, username).await
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        exists_by_email(&self.db, email).await
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        list(&self.db).await
    }

    async fn list_by_role(&self, role_name: &str) -> AppResult<Vec<User>> {
        list_by_role(&self.db, role_name).await
    }

    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> AppResult<User> {
        insert(&self.db, username, email, password_hash).await
    }

    async fn update(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        update(&self.db, id, username, email, password_hash).await
    }

    async fn add_role(&self, user_id: i32, role_id: i32) -> AppResult<()> {
        add_role(&self.db, user_id, role_id).await
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        delete(&self.db, id).await
    }
}

/// Transaction-aware user repository.
///
/// Borrows the transaction so every operation is part of the same unit
/// of work; commit and rollback stay with the caller.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl UserRepository for TxUserRepository<'_> {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        find_by_id(self.txn, id).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        find_by_username(self.txn, username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        find_by_email(self.txn, email).await
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        exists_by_id(self.txn, id).await
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        exists_by_username(self.txn, username).await
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        exists_by_email(self.txn, email).await
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        list(self.txn).await
    }

    async fn list_by_role(&self, role_name: &str) -> AppResult<Vec<User>> {
        list_by_role(self.txn, role_name).await
    }

    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> AppResult<User> {
        insert(self.txn, username, email, password_hash).await
    }

    async fn update(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        update(self.txn, id, username, email, password_hash).await
    }

    async fn add_role(&self, user_id: i32, role_id: i32) -> AppResult<()> {
        add_role(self.txn, user_id, role_id).await
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        delete(self.txn, id).await
    }
}
