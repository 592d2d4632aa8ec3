use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Closed role set. Each operation declares its own allowed-role list;
/// there is no implicit hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Editor,
    Moderator,
    Admin,
}

/// Allowed-role sets declared per operation group. Admin appears
/// explicitly wherever it is permitted.
pub const STAFF: &[Role] = &[Role::Editor, Role::Moderator, Role::Admin];
pub const CATALOG_EDITORS: &[Role] = &[Role::Editor, Role::Admin];
pub const MODERATORS: &[Role] = &[Role::Moderator, Role::Admin];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Role {
    pub const ALL: &'static [Role] = &[Role::User, Role::Editor, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Editor => "editor",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Role::User),
            "editor" => Some(Role::Editor),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The authenticated actor performing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Outcome of an authorization check. Deny is a value, never a panic or
/// an exception; callers branch on it or convert to an ApiError.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    MissingRole,
}

/// Pure authorization gate: no I/O, no side effects.
///
/// Denies when the principal is absent or shares no role with the
/// required set. An empty required set means "any authenticated user".
pub fn authorize(principal: Option<&Principal>, required: &[Role]) -> Decision {
    let Some(principal) = principal else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    if required.is_empty() {
        return Decision::Allow;
    }

    if required.iter().any(|role| principal.has_role(*role)) {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::MissingRole)
    }
}

/// Gate wrapper for handlers: converts Deny into the uniform error kinds
/// (401 for a missing session, 403 for a missing role).
pub fn require(principal: Option<&Principal>, required: &[Role]) -> Result<(), ApiError> {
    match authorize(principal, required) {
        Decision::Allow => Ok(()),
        Decision::Deny(DenyReason::Unauthenticated) => {
            Err(ApiError::unauthorized("Authentication required"))
        }
        Decision::Deny(DenyReason::MissingRole) => {
            Err(ApiError::forbidden("Insufficient privileges for this operation"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: &[Role]) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "aki".to_string(),
            roles: roles.to_vec(),
        }
    }

    #[test]
    fn absent_principal_is_denied() {
        assert_eq!(
            authorize(None, &[Role::User]),
            Decision::Deny(DenyReason::Unauthenticated)
        );
        // Even an "any authenticated user" check needs a session
        assert_eq!(authorize(None, &[]), Decision::Deny(DenyReason::Unauthenticated));
    }

    #[test]
    fn empty_role_intersection_is_denied() {
        let p = principal(&[Role::User]);
        assert_eq!(
            authorize(Some(&p), &[Role::Editor]),
            Decision::Deny(DenyReason::MissingRole)
        );
        assert_eq!(
            authorize(Some(&p), &[Role::Moderator, Role::Admin]),
            Decision::Deny(DenyReason::MissingRole)
        );
    }

    #[test]
    fn any_overlapping_role_allows() {
        let p = principal(&[Role::User, Role::Editor]);
        assert_eq!(authorize(Some(&p), &[Role::Editor, Role::Admin]), Decision::Allow);
        assert_eq!(authorize(Some(&p), &[Role::User]), Decision::Allow);
    }

    #[test]
    fn admin_is_not_implicitly_everything() {
        // Operations list admin explicitly where it is permitted
        let p = principal(&[Role::Admin]);
        assert_eq!(
            authorize(Some(&p), &[Role::Editor]),
            Decision::Deny(DenyReason::MissingRole)
        );
        assert_eq!(authorize(Some(&p), &[Role::Editor, Role::Admin]), Decision::Allow);
    }

    #[test]
    fn require_maps_deny_to_error_kinds() {
        let p = principal(&[Role::User]);
        let unauthenticated = require(None, &[Role::User]).unwrap_err();
        assert_eq!(unauthenticated.status_code(), 401);

        let forbidden = require(Some(&p), &[Role::Admin]).unwrap_err();
        assert_eq!(forbidden.status_code(), 403);

        assert!(require(Some(&p), &[Role::User]).is_ok());
    }

    #[test]
    fn role_strings_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
        assert_eq!(Role::parse("root"), None);
    }
}
