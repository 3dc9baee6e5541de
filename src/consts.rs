pub mod db_const {
    pub const USER_TABLE: &str = "users";
    pub const AUTH_PASSWORD_TABLE: &str = "auth_passwords";
    pub const PROJECT_TABLE: &str = "projects";
    pub const INVITATION_TABLE: &str = "invitations";
    pub const TASK_TABLE: &str = "tasks";
    pub const SUBTASK_TABLE: &str = "subtasks";
    pub const NOTE_TABLE: &str = "notes";
}

pub mod invite_const {
    /// Invitations are redeemable for 7 days after creation.
    pub const INVITATION_TTL_DAYS: i64 = 7;
    /// Email verification links are valid for 24 hours.
    pub const VERIFICATION_TTL_HOURS: i64 = 24;
}
