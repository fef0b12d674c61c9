//! Authorization primitives for HR records.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("action {action} denied")]
    Denied { action: Action },
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Hr,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Hr => "HR",
            Role::Viewer => "VIEWER",
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Hr => 2,
            Role::Viewer => 1,
        }
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "HR" => Ok(Role::Hr),
            "VIEWER" => Ok(Role::Viewer),
            _ => Err(AuthzError::UnknownRole(value.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated party on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
}

impl Viewer {
    pub fn new(user_id: Uuid, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    /// True when any held role reaches at least `role`'s level.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.level() >= role.level())
    }

    pub fn highest_role(&self) -> Option<Role> {
        self.roles.iter().copied().max_by_key(|r| r.level())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Edit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Edit => "edit",
        })
    }
}

/// Ownership facts about the record an action targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resource {
    pub creator_id: Option<Uuid>,
}

impl Resource {
    pub fn authored_by(creator_id: Uuid) -> Self {
        Self {
            creator_id: Some(creator_id),
        }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct PolicyEngine;

impl PolicyEngine {
    /// Admins may do anything; HR may create and edit what it created;
    /// every role may read.
    pub fn check(
        &self,
        viewer: &Viewer,
        action: Action,
        resource: Resource,
    ) -> Result<(), AuthzError> {
        let allowed = match action {
            Action::Read => viewer.has_role(Role::Viewer),
            Action::Create => viewer.has_role(Role::Hr),
            Action::Edit => {
                viewer.has_role(Role::Admin)
                    || (viewer.has_role(Role::Hr)
                        && resource.creator_id == Some(viewer.user_id))
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(AuthzError::Denied { action })
        }
    }

    pub fn allows(&self, viewer: &Viewer, action: Action, resource: Resource) -> bool {
        self.check(viewer, action, resource).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(role: Role) -> Viewer {
        Viewer::new(Uuid::new_v4(), vec![role])
    }

    #[test]
    fn admin_edits_any_record() {
        let admin = viewer(Role::Admin);
        let other = Resource::authored_by(Uuid::new_v4());
        assert!(PolicyEngine.allows(&admin, Action::Edit, other));
    }

    #[test]
    fn hr_edits_only_own_records() {
        let hr = viewer(Role::Hr);
        assert!(PolicyEngine.allows(&hr, Action::Edit, Resource::authored_by(hr.user_id)));
        assert_eq!(
            PolicyEngine.check(&hr, Action::Edit, Resource::authored_by(Uuid::new_v4())),
            Err(AuthzError::Denied {
                action: Action::Edit
            })
        );
    }

    #[test]
    fn viewer_reads_but_never_writes() {
        let reader = viewer(Role::Viewer);
        let own = Resource::authored_by(reader.user_id);
        assert!(PolicyEngine.allows(&reader, Action::Read, own));
        assert!(!PolicyEngine.allows(&reader, Action::Create, Resource::default()));
        assert!(!PolicyEngine.allows(&reader, Action::Edit, own));
    }

    #[test]
    fn viewer_without_roles_is_denied_everything() {
        let nobody = Viewer::new(Uuid::new_v4(), Vec::new());
        assert!(!PolicyEngine.allows(&nobody, Action::Read, Resource::default()));
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("hr".parse::<Role>(), Ok(Role::Hr));
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(viewer(Role::Hr).highest_role(), Some(Role::Hr));
    }
}
