//! Domain layer - core business entities and value objects.

mod password;
mod role;
mod user;

pub use password::Password;
pub use role::{parse_requested_roles, Role, RoleName};
pub use user::{User, UserResponse};
