//! Shared user provisioning flow.
//!
//! Registration and administrative creation apply the same rules:
//! uniqueness checks, role-set resolution against the catalog, insert,
//! and join-row writes, all inside the caller's transaction.

use crate::domain::{parse_requested_roles, Role, RoleName, User};
use crate::errors::{AppError, AppResult};
use crate::infra::repositories::RoleRepository;
use crate::infra::TransactionContext;

/// Resolve the role set for a new user.
///
/// No requested roles means the default CUSTOMER role; its absence from
/// the catalog is a deployment defect, not a user error. Requested names
/// are matched leniently: unknown or unseeded names are dropped, and only
/// a fully empty result is rejected.
pub(crate) async fn resolve_role_set(
    roles: &dyn RoleRepository,
    requested: Option<&[String]>,
) -> AppResult<Vec<Role>> {
    match requested {
        None | Some([]) => {
            let customer = roles
                .find_by_name(RoleName::Customer)
                .await?
                .ok_or_else(|| {
                    AppError::internal("Default CUSTOMER role missing from role catalog")
                })?;
            Ok(vec![customer])
        }
        Some(names) => {
            let mut resolved = Vec::new();
            for name in parse_requested_roles(names) {
                if let Some(role) = roles.find_by_name(name).await? {
                    resolved.push(role);
                }
            }
            if resolved.is_empty() {
                return Err(AppError::business_rule(
                    "None of the specified roles are valid",
                ));
            }
            Ok(resolved)
        }
    }
}

/// Persist a new user with its resolved role set.
///
/// Assumes the password has already been hashed. Runs entirely against
/// the supplied transaction context.
pub(crate) async fn provision_user(
    ctx: &TransactionContext<'_>,
    username: &str,
    email: &str,
    password_hash: &str,
    requested_roles: Option<&[String]>,
) -> AppResult<User> {
    if ctx.users().exists_by_username(username).await? {
        return Err(AppError::business_rule("Username is already taken"));
    }
    if ctx.users().exists_by_email(email).await? {
        return Err(AppError::business_rule("Email is already in use"));
    }

    let roles = resolve_role_set(ctx.roles(), requested_roles).await?;

    let mut user = ctx.users().insert(username, email, password_hash).await?;
    for role in roles {
        ctx.users().add_role(user.id, role.id).await?;
        user = user.with_role(role);
    }
    Ok(user)
}
