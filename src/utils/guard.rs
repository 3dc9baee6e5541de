use surrealdb::{RecordId, Surreal, engine::any::Any};

use crate::{
    errors::{Error, Result},
    models::{project::Project, role::Role},
};

/// Loaded project plus resolved actor role. Fetching happens once, in
/// [`create_context`]; the checks themselves are side-effect-free predicates
/// so they stay unit-testable without a data layer.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project: Project,
    pub actor: RecordId,
    pub role: Option<Role>,
}

pub async fn create_context(
    sdb: &Surreal<Any>,
    project_id: RecordId,
    actor: RecordId,
) -> Result<ProjectContext> {
    let project: Project = sdb
        .select(project_id)
        .await?
        .ok_or(Error::NotFound("Project"))?;
    let role = project.role_of(&actor);
    Ok(ProjectContext {
        project,
        actor,
        role,
    })
}

impl ProjectContext {
    pub fn require_membership(&self) -> Result<Role> {
        self.role
            .ok_or_else(|| Error::Forbidden("You are not a member of this project".to_string()))
    }

    /// Threshold check over the total role order.
    pub fn require_role_at_least(&self, threshold: Role) -> Result<Role> {
        let role = self.require_membership()?;
        if role < threshold {
            return Err(Error::Forbidden(format!(
                "Required role: {threshold}, you are: {role}"
            )));
        }
        Ok(role)
    }

    /// Delete-class operations are restricted to exactly this role.
    pub fn require_exact(&self, wanted: Role) -> Result<Role> {
        let role = self.require_membership()?;
        if role != wanted {
            return Err(Error::Forbidden(format!(
                "Only project {wanted} can perform this action"
            )));
        }
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{CreateProject, ProjectStatus};
    use crate::utils::time::time_now;

    fn rid(table: &str, key: &str) -> RecordId {
        RecordId::from_table_key(table, key)
    }

    fn context_for(actor: &str, members_of: &Project) -> ProjectContext {
        let actor = rid("users", actor);
        ProjectContext {
            role: members_of.role_of(&actor),
            project: members_of.clone(),
            actor,
        }
    }

    fn sample_project() -> Project {
        let owner = rid("users", "alice");
        let mut create = CreateProject::init("Alpha".to_string(), None, owner.clone());
        create.members.push(crate::models::project::ProjectMember {
            user: rid("users", "bob"),
            role: Role::Member,
            joined_at: time_now(),
        });
        Project {
            id: rid("projects", "alpha"),
            name: create.name,
            description: create.description,
            owner,
            members: create.members,
            status: ProjectStatus::Active,
            color: create.color,
            created_at: create.created_at,
            updated_at: None,
        }
    }

    #[test]
    fn non_member_fails_every_check() {
        let project = sample_project();
        let ctx = context_for("mallory", &project);
        assert!(matches!(ctx.require_membership(), Err(Error::Forbidden(_))));
        assert!(matches!(
            ctx.require_role_at_least(Role::Member),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            ctx.require_exact(Role::Admin),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn threshold_uses_total_order() {
        let project = sample_project();
        let owner = context_for("alice", &project);
        let member = context_for("bob", &project);

        assert_eq!(owner.require_role_at_least(Role::ProjectAdmin).unwrap(), Role::Admin);
        assert!(member.require_role_at_least(Role::ProjectAdmin).is_err());
        assert_eq!(member.require_role_at_least(Role::Member).unwrap(), Role::Member);
    }

    #[test]
    fn exact_role_rejects_lower_and_passes_match() {
        let project = sample_project();
        assert!(context_for("bob", &project).require_exact(Role::Admin).is_err());
        assert_eq!(
            context_for("alice", &project).require_exact(Role::Admin).unwrap(),
            Role::Admin
        );
    }
}
