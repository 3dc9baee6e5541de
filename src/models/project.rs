use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::{models::role::Role, utils::time::time_now};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Archived,
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProjectMember {
    pub user: RecordId,
    pub role: Role,
    pub joined_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    pub id: RecordId,
    pub name: String, // ! & (len = 100)
    pub description: Option<String>,
    pub owner: RecordId,
    pub members: Vec<ProjectMember>,
    pub status: ProjectStatus,
    pub color: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub owner: RecordId,
    pub members: Vec<ProjectMember>,
    pub status: ProjectStatus,
    pub color: String,
    pub created_at: String,
}

impl CreateProject {
    /// The owner enters the member list exactly once, as admin. Done here at
    /// creation so no later code path can produce a project without it.
    pub fn init(name: String, description: Option<String>, owner: RecordId) -> Self {
        Self {
            name,
            description,
            members: vec![ProjectMember {
                user: owner.clone(),
                role: Role::Admin,
                joined_at: time_now(),
            }],
            owner,
            status: ProjectStatus::Active,
            color: "#3B82F6".to_string(),
            created_at: time_now(),
        }
    }
}

impl Project {
    /// Membership is decided by identity value, not reference.
    pub fn is_member(&self, user: &RecordId) -> bool {
        self.members.iter().any(|m| &m.user == user)
    }

    pub fn role_of(&self, user: &RecordId) -> Option<Role> {
        self.members.iter().find(|m| &m.user == user).map(|m| m.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(key: &str) -> RecordId {
        RecordId::from_table_key("users", key)
    }

    fn project_with_owner(owner: &RecordId) -> Project {
        Project {
            id: RecordId::from_table_key("projects", "alpha"),
            name: "Alpha".to_string(),
            description: None,
            owner: owner.clone(),
            members: CreateProject::init("Alpha".to_string(), None, owner.clone()).members,
            status: ProjectStatus::Active,
            color: "#3B82F6".to_string(),
            created_at: time_now(),
            updated_at: None,
        }
    }

    #[test]
    fn owner_is_sole_admin_member_after_init() {
        let alice = rid("alice");
        let project = project_with_owner(&alice);

        assert_eq!(project.members.len(), 1);
        assert!(project.is_member(&alice));
        assert_eq!(project.role_of(&alice), Some(Role::Admin));
    }

    #[test]
    fn non_member_has_no_role() {
        let project = project_with_owner(&rid("alice"));
        let bob = rid("bob");

        assert!(!project.is_member(&bob));
        assert_eq!(project.role_of(&bob), None);
    }

    #[test]
    fn membership_compares_by_identity_value() {
        let project = project_with_owner(&rid("alice"));
        // a fresh RecordId with the same table/key must still match
        assert!(project.is_member(&rid("alice")));
    }
}
