use serde::{Deserialize, Serialize};
use surrealdb::{RecordId, Surreal, engine::any::Any};

use crate::{consts::db_const::USER_TABLE, errors::Result};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String, // ! unique & lowercase
    pub email_verified: bool,
    pub verification_token: Option<String>, // ! sha256 hash, never the plaintext
    pub verification_expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<String>,
    pub created_at: String,
}

/// Password hashes live in their own table so user rows can be returned
/// to clients without field filtering.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserCredential {
    pub id: RecordId,
    pub user_id: RecordId,
    pub password_hash: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateUserCredential {
    pub user_id: RecordId,
    pub password_hash: String,
}

/// Public projection of a user, embedded in membership/task responses.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserRef {
    pub id: RecordId,
    pub username: String,
    pub email: String,
}

impl From<User> for UserRef {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

// ? Lookups

pub async fn find_by_id(sdb: &Surreal<Any>, id: &RecordId) -> Result<Option<User>> {
    Ok(sdb.select(id.clone()).await?)
}

pub async fn find_by_email(sdb: &Surreal<Any>, email: &str) -> Result<Option<User>> {
    let users: Vec<User> = sdb
        .query("SELECT * FROM type::table($table) WHERE email = $email;")
        .bind(("table", USER_TABLE))
        .bind(("email", email.to_lowercase()))
        .await?
        .take(0)?;
    Ok(users.into_iter().next())
}
