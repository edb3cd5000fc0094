//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Role;

/// User domain entity.
///
/// Role membership is an explicit set backed by the `user_roles` join
/// table; there is no ORM-side object graph to keep in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check whether the user already holds a role
    pub fn has_role(&self, role_id: i32) -> bool {
        self.roles.iter().any(|r| r.id == role_id)
    }

    /// Add a role to the membership set. Idempotent: re-adding an
    /// already-held role leaves the set unchanged.
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.has_role(role.id) {
            self.roles.push(role);
        }
        self
    }

    /// Role names as strings, for response payloads
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.to_string()).collect()
    }
}

/// User response (safe to return to clients; never carries the hash)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = 1)]
    pub id: i32,
    /// Unique username
    #[schema(example = "alice")]
    pub username: String,
    /// User email address
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Assigned role names
    #[schema(example = json!(["CUSTOMER"]))]
    pub roles: Vec<String>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let roles = user.role_names();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            roles,
            created_at: user.created_at,
        }
    }
}
