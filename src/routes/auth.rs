use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::{
    consts::{
        db_const::{AUTH_PASSWORD_TABLE, USER_TABLE},
        invite_const::VERIFICATION_TTL_HOURS,
    },
    errors::{Error, Result},
    middleware::Actor,
    models::user::{
        self, CreateUser, CreateUserCredential, User, UserCredential, UserRef,
    },
    state::AppState,
    utils::{
        jwt::{Claims, encode_jwt},
        mail::verification_email,
        pwd,
        time::{time_now, time_now_plus_hours},
        token::{generate_token, hash_token},
        validated_form::ValidatedJson,
        validator::{validate_password, validate_username},
    },
};

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    fn check(&self) -> Result<()> {
        validate_username(&self.username)
            .map_err(|e| Error::InvalidOperation(format!("username: {}", e.code)))?;
        validate_password(&self.password)
            .map_err(|e| Error::InvalidOperation(format!("password: {}", e.code)))?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RegisterResponse {
    pub user: UserRef,
    pub msg: String,
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    input.check()?;
    let email = input.email.to_lowercase();
    if user::find_by_email(&state.sdb, &email).await?.is_some() {
        return Err(Error::EmailExist(email));
    }

    let password_hash = pwd::hash(input.password.as_bytes())?;
    let (verify_token, verify_hash) = generate_token();

    let user_data = CreateUser {
        username: input.username.clone(),
        email: email.clone(),
        email_verified: false,
        verification_token: Some(verify_hash),
        verification_expires_at: Some(time_now_plus_hours(VERIFICATION_TTL_HOURS)),
        created_at: time_now(),
    };
    let user: User = state
        .sdb
        .create::<Option<User>>(USER_TABLE)
        .content(user_data)
        .await?
        .ok_or(Error::NotFound("User"))?;

    let _: Option<UserCredential> = state
        .sdb
        .create(AUTH_PASSWORD_TABLE)
        .content(CreateUserCredential {
            user_id: user.id.clone(),
            password_hash,
        })
        .await?;

    let verify_url = format!("{}/verify-email/{}", state.mailer.client_url, verify_token);
    let (subject, body) = verification_email(&input.username, &verify_url);
    state.mailer.send(&email, subject, body);
    info!("registered {email}, verification pending");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            msg: "User registered, verification email sent".to_string(),
        }),
    ))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<(StatusCode, String)> {
    let hash = hash_token(&token);
    // single conditional update consumes the token exactly once
    let verified: Vec<User> = state
        .sdb
        .query(
            "UPDATE type::table($table) \
             SET email_verified = true, verification_token = NONE, \
                 verification_expires_at = NONE, updated_at = $now \
             WHERE verification_token = $hash \
               AND verification_expires_at > $now \
               AND email_verified = false;",
        )
        .bind(("table", USER_TABLE))
        .bind(("hash", hash))
        .bind(("now", time_now()))
        .await?
        .take(0)?;

    if verified.is_empty() {
        return Err(Error::InvalidToken);
    }
    Ok((StatusCode::OK, "Email verified successfully".to_string()))
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRef,
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = user::find_by_email(&state.sdb, &input.email)
        .await?
        .ok_or(Error::InvalidLoginDetails)?;
    if !user.email_verified {
        return Err(Error::EmailNotVerified);
    }

    let credential: Vec<UserCredential> = state
        .sdb
        .query("SELECT * FROM type::table($table) WHERE user_id = $user_id;")
        .bind(("table", AUTH_PASSWORD_TABLE))
        .bind(("user_id", user.id.clone()))
        .await?
        .take(0)?;
    let credential = credential
        .into_iter()
        .next()
        .ok_or(Error::InvalidLoginDetails)?;

    if !pwd::validate(input.password.as_bytes(), &credential.password_hash)? {
        return Err(Error::InvalidLoginDetails);
    }

    let now = Utc::now().timestamp() as usize;
    let token = encode_jwt(&Claims {
        sub: user.id.to_string(),
        iat: now,
        exp: now + 7 * 24 * 3600,
        iss: "taskcamp".to_string(),
    })?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

pub async fn current_user(
    State(state): State<AppState>,
    Actor(user_id): Actor,
) -> Result<Json<UserRef>> {
    let user = user::find_by_id(&state.sdb, &user_id)
        .await?
        .ok_or(Error::NotFound("User"))?;
    Ok(Json(user.into()))
}
