//! Role catalog types.
//!
//! Role names form a closed enumeration; rows in the `roles` table are
//! pre-seeded reference data that the API only ever looks up.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{ROLE_ADMIN, ROLE_CUSTOMER, ROLE_PHARMACIST};

/// Closed enumeration of assignable role names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleName {
    Customer,
    Admin,
    Pharmacist,
}

impl RoleName {
    /// Parse a role name, returning `None` for anything outside the catalog.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ROLE_CUSTOMER => Some(RoleName::Customer),
            ROLE_ADMIN => Some(RoleName::Admin),
            ROLE_PHARMACIST => Some(RoleName::Pharmacist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Customer => ROLE_CUSTOMER,
            RoleName::Admin => ROLE_ADMIN,
            RoleName::Pharmacist => ROLE_PHARMACIST,
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted role: a catalog name with its system-assigned identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: i32,
    pub name: RoleName,
}

/// Resolve requested role names against the catalog enumeration.
///
/// Unknown names are silently dropped and duplicates collapsed; callers
/// decide what an empty result means. Registration keeps this leniency on
/// purpose: a request naming one valid and one bogus role still succeeds
/// with only the valid role assigned.
pub fn parse_requested_roles(names: &[String]) -> Vec<RoleName> {
    let mut resolved = Vec::new();
    for name in names {
        if let Some(role) = RoleName::parse(name) {
            if !resolved.contains(&role) {
                resolved.push(role);
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_names() {
        assert_eq!(RoleName::parse("CUSTOMER"), Some(RoleName::Customer));
        assert_eq!(RoleName::parse("ADMIN"), Some(RoleName::Admin));
        assert_eq!(RoleName::parse("PHARMACIST"), Some(RoleName::Pharmacist));
    }

    #[test]
    fn parse_rejects_unknown_and_wrong_case() {
        assert_eq!(RoleName::parse("NOT_A_ROLE"), None);
        assert_eq!(RoleName::parse("customer"), None);
        assert_eq!(RoleName::parse(""), None);
    }

    #[test]
    fn requested_roles_drop_unknown_names() {
        let requested = vec!["CUSTOMER".to_string(), "NOT_A_ROLE".to_string()];
        assert_eq!(parse_requested_roles(&requested), vec![RoleName::Customer]);
    }

    #[test]
    fn requested_roles_all_unknown_is_empty() {
        let requested = vec!["NOT_A_ROLE".to_string(), "ALSO_BOGUS".to_string()];
        assert!(parse_requested_roles(&requested).is_empty());
    }

    #[test]
    fn requested_roles_deduplicate() {
        let requested = vec![
            "ADMIN".to_string(),
            "ADMIN".to_string(),
            "CUSTOMER".to_string(),
        ];
        assert_eq!(
            parse_requested_roles(&requested),
            vec![RoleName::Admin, RoleName::Customer]
        );
    }
}
