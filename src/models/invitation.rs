use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::models::role::Role;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    /// Transient lock state: a concurrent acceptance for the same token will
    /// not find a `Pending` row and falls into the idempotent branch.
    Processing,
    Accepted,
    Rejected,
    Expired,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Invitation {
    pub id: RecordId,
    pub project: RecordId,
    pub email: String, // ! lowercase
    pub role: Role,
    pub token: String, // ! sha256 hash, plaintext is only ever in the invite URL
    pub invited_by: RecordId,
    pub status: InvitationStatus,
    pub expires_at: String,
    pub user: Option<RecordId>, // ! resolved on acceptance
    pub accepted_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateInvitation {
    pub project: RecordId,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub invited_by: RecordId,
    pub status: InvitationStatus,
    pub expires_at: String,
    pub created_at: String,
}

/// Closed set of caller-visible acceptance outcomes. Every branch of the
/// acceptance flow maps to exactly one of these.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AcceptOutcome {
    Joined,
    AlreadyMember,
    AlreadyAccepted,
    Register,
}
