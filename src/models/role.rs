use serde::{Deserialize, Serialize};

/// Project role hierarchy, totally ordered by privilege.
///
/// Variant order is load-bearing: the derived `Ord` gives
/// `Member < ProjectAdmin < Admin`, which all threshold checks rely on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    ProjectAdmin,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::ProjectAdmin => "project_admin",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_totally_ordered() {
        assert!(Role::Member < Role::ProjectAdmin);
        assert!(Role::ProjectAdmin < Role::Admin);
        assert!(Role::Member < Role::Admin);
        assert_eq!(Role::Admin.max(Role::Member), Role::Admin);
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::ProjectAdmin).unwrap(),
            "\"project_admin\""
        );
        let back: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(back, Role::Admin);
    }
}
