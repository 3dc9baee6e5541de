use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use surrealdb::RecordId;

use crate::consts::db_const::USER_TABLE;
use crate::errors::{Error, Result as RResult};
use crate::utils::{jwt::decode_jwt, record_id::record_id_from_path};

/// The authenticated actor, resolved from the bearer token and stashed in
/// request extensions for handlers to pull out.
#[derive(Debug, Clone)]
pub struct Actor(pub RecordId);

pub async fn auth_jwt_middleware(request: Request, next: Next) -> Result<Response, Response> {
    let (mut parts, body) = request.into_parts();
    let actor = actor_from_parts(&parts).map_err(IntoResponse::into_response)?;
    parts.extensions.insert(actor);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

fn actor_from_parts(parts: &Parts) -> RResult<Actor> {
    let header_value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(Error::MissingToken)?
        .to_str()
        .map_err(|_| Error::InvalidToken)?;

    let mut pieces = header_value.trim().splitn(2, ' ');
    let scheme = pieces.next().ok_or(Error::MissingToken)?;
    let token = pieces.next().ok_or(Error::MissingToken)?;

    if scheme != "Bearer" {
        tracing::warn!("Invalid auth scheme: {scheme}");
        return Err(Error::InvalidScheme);
    }

    let data = decode_jwt(token)?;
    let id = record_id_from_path(USER_TABLE, &data.claims.sub).map_err(|_| Error::InvalidToken)?;
    Ok(Actor(id))
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> RResult<Self> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or(Error::MissingToken)
    }
}
