//! Registration and login flow tests over in-memory repositories.
//!
//! These exercise the full service flows (hashing, uniqueness checks,
//! role resolution, token issuance) without a database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use pharmacy_api::config::Config;
use pharmacy_api::domain::{Role, RoleName, User};
use pharmacy_api::errors::{AppError, AppResult};
use pharmacy_api::infra::{RoleRepository, TransactionContext, UnitOfWork, UserRepository};
use pharmacy_api::services::{
    AuthService, Authenticator, CreateUserData, Registration, UpdateUserData, UserManager,
    UserService,
};

const TEST_SECRET: &str = "test-secret-key-for-testing-only-32chars";

fn seeded_catalog() -> Vec<Role> {
    vec![
        Role {
            id: 1,
            name: RoleName::Customer,
        },
        Role {
            id: 2,
            name: RoleName::Admin,
        },
        Role {
            id: 3,
            name: RoleName::Pharmacist,
        },
    ]
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    next_id: i32,
}

/// In-memory user repository backed by a shared mutex
struct InMemoryUsers {
    store: Arc<Mutex<Store>>,
    catalog: Vec<Role>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn exists_by_id(&self, id: i32) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.store.lock().unwrap().users.clone())
    }

    async fn list_by_role(&self, role_name: &str) -> AppResult<Vec<User>> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| u.role_names().iter().any(|n| n == role_name))
            .cloned()
            .collect())
    }

    async fn insert(&self, username: &str, email: &str, password_hash: &str) -> AppResult<User> {
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let user = User {
            id: store.next_id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            roles: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let mut store = self.store.lock().unwrap();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found(format!("User not found with id: {}", id)))?;
        if let Some(username) = username {
            user.username = username;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(password_hash) = password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn add_role(&self, user_id: i32, role_id: i32) -> AppResult<()> {
        let role = self
            .catalog
            .iter()
            .find(|r| r.id == role_id)
            .cloned()
            .ok_or_else(|| AppError::internal("unknown role id in test catalog"))?;
        let mut store = self.store.lock().unwrap();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::internal("unknown user id in test store"))?;
        if !user.has_role(role_id) {
            user.roles.push(role);
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut store = self.store.lock().unwrap();
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        if store.users.len() == before {
            return Err(AppError::not_found(format!("User not found with id: {}", id)));
        }
        Ok(())
    }
}

/// In-memory role catalog
struct InMemoryRoles {
    catalog: Vec<Role>,
}

#[async_trait]
impl RoleRepository for InMemoryRoles {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        Ok(self.catalog.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_name(&self, name: RoleName) -> AppResult<Option<Role>> {
        Ok(self.catalog.iter().find(|r| r.name == name).cloned())
    }
}

struct InMemoryUnitOfWork {
    users: Arc<InMemoryUsers>,
    roles: Arc<InMemoryRoles>,
}

impl InMemoryUnitOfWork {
    fn new() -> Self {
        Self::with_catalog(seeded_catalog())
    }

    fn with_catalog(catalog: Vec<Role>) -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        Self {
            users: Arc::new(InMemoryUsers {
                store,
                catalog: catalog.clone(),
            }),
            roles: Arc::new(InMemoryRoles { catalog }),
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
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
        let ctx = TransactionContext::new(&*self.users, &*self.roles);
        f(ctx).await
    }
}

fn registration(username: &str, email: &str, roles: Option<Vec<&str>>) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: "SecurePass123!".to_string(),
        roles: roles.map(|r| r.into_iter().map(String::from).collect()),
    }
}

fn auth_service(uow: Arc<InMemoryUnitOfWork>) -> Authenticator<InMemoryUnitOfWork> {
    Authenticator::new(uow, Config::with_secret(TEST_SECRET, 24))
}

#[tokio::test]
async fn register_then_login_issues_token_for_username() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow);

    let user = auth
        .register(registration("alice", "alice@example.com", None))
        .await
        .unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.role_names(), vec!["CUSTOMER"]);

    let token = auth
        .login("alice".to_string(), "SecurePass123!".to_string())
        .await
        .unwrap();

    let claims = auth.verify_token(&token.token).unwrap();
    assert_eq!(claims.sub, "alice");
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn duplicate_username_is_rejected_without_mutation() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow.clone());

    auth.register(registration("alice", "alice@example.com", None))
        .await
        .unwrap();
    let err = auth
        .register(registration("alice", "other@example.com", None))
        .await
        .unwrap_err();

    match err {
        AppError::BusinessRule(msg) => assert_eq!(msg, "Username is already taken"),
        other => panic!("expected BusinessRule, got {:?}", other),
    }
    assert_eq!(uow.users().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_email_is_rejected_after_username_check() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow);

    auth.register(registration("alice", "alice@example.com", None))
        .await
        .unwrap();
    let err = auth
        .register(registration("bob", "alice@example.com", None))
        .await
        .unwrap_err();

    match err {
        AppError::BusinessRule(msg) => assert_eq!(msg, "Email is already in use"),
        other => panic!("expected BusinessRule, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_role_names_are_dropped_but_all_unknown_is_rejected() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow);

    let user = auth
        .register(registration(
            "alice",
            "alice@example.com",
            Some(vec!["CUSTOMER", "NOT_A_ROLE"]),
        ))
        .await
        .unwrap();
    assert_eq!(user.role_names(), vec!["CUSTOMER"]);

    let err = auth
        .register(registration(
            "bob",
            "bob@example.com",
            Some(vec!["NOT_A_ROLE"]),
        ))
        .await
        .unwrap_err();
    match err {
        AppError::BusinessRule(msg) => assert_eq!(msg, "None of the specified roles are valid"),
        other => panic!("expected BusinessRule, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_default_role_is_an_internal_fault() {
    let uow = Arc::new(InMemoryUnitOfWork::with_catalog(vec![Role {
        id: 2,
        name: RoleName::Admin,
    }]));
    let auth = auth_service(uow);

    let err = auth
        .register(registration("alice", "alice@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}

#[tokio::test]
async fn login_does_not_distinguish_unknown_user_from_wrong_password() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow);

    auth.register(registration("alice", "alice@example.com", None))
        .await
        .unwrap();

    let unknown = auth
        .login("nobody".to_string(), "SecurePass123!".to_string())
        .await
        .unwrap_err();
    let wrong = auth
        .login("alice".to_string(), "WrongPass456!".to_string())
        .await
        .unwrap_err();

    assert!(matches!(unknown, AppError::InvalidCredentials));
    assert!(matches!(wrong, AppError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow);

    assert!(auth.verify_token("not-a-token").is_err());
}

#[tokio::test]
async fn create_user_validates_fields_before_touching_the_store() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let users = UserManager::new(uow.clone());

    let err = users
        .create_user(CreateUserData {
            username: "".to_string(),
            email: "not-an-email".to_string(),
            password: "SecurePass123!".to_string(),
            roles: None,
        })
        .await
        .unwrap_err();

    match err {
        AppError::Validation(fields) => {
            assert_eq!(fields.get("username").unwrap(), "Username cannot be empty");
            assert_eq!(fields.get("email").unwrap(), "Invalid email format");
        }
        other => panic!("expected Validation, got {:?}", other),
    }
    assert!(uow.users().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn short_password_is_a_field_scoped_error() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let users = UserManager::new(uow);

    let err = users
        .create_user(CreateUserData {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
            roles: None,
        })
        .await
        .unwrap_err();

    match err {
        AppError::Validation(fields) => {
            assert!(fields.get("password").unwrap().contains("at least 8"));
        }
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn assign_then_delete_then_lookup() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow.clone());
    let users = UserManager::new(uow.clone());

    let alice = auth
        .register(registration("alice", "alice@example.com", None))
        .await
        .unwrap();

    // Assigning ADMIN twice leaves a single membership row
    let updated = users.assign_role(alice.id, 2).await.unwrap();
    let updated = users.assign_role(updated.id, 2).await.unwrap();
    assert_eq!(updated.role_names(), vec!["CUSTOMER", "ADMIN"]);

    let admins = users.list_users_by_role("ADMIN").await.unwrap();
    assert_eq!(admins.len(), 1);

    let by_email = users.get_user_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, alice.id);
    assert!(users.user_exists(alice.id).await.unwrap());

    users.delete_user(alice.id).await.unwrap();
    assert!(!users.user_exists(alice.id).await.unwrap());
    let err = users.get_user(alice.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Deleting again reports the same not-found outcome
    let err = users.delete_user(alice.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn update_with_taken_username_leaves_record_unchanged() {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let auth = auth_service(uow.clone());
    let users = UserManager::new(uow.clone());

    auth.register(registration("alice", "alice@example.com", None))
        .await
        .unwrap();
    let bob = auth
        .register(registration("bob", "bob@example.com", None))
        .await
        .unwrap();

    let err = users
        .update_user(
            bob.id,
            UpdateUserData {
                username: Some("alice".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let bob_after = users.get_user(bob.id).await.unwrap();
    assert_eq!(bob_after.username, "bob");
}

