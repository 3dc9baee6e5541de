use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};

use crate::errors::Result;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String, // user record id
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

fn secret() -> String {
    std::env::var("TASKCAMP_JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string())
}

pub fn encode_jwt(claims: &Claims) -> Result<String> {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret().as_ref()),
    )?;
    Ok(token)
}

pub fn decode_jwt(token: &str) -> Result<TokenData<Claims>> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret().as_ref()),
        &Validation::default(),
    )?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn roundtrip() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "users:alice".to_string(),
            exp: now + 3600,
            iat: now,
            iss: "taskcamp".to_string(),
        };
        let token = encode_jwt(&claims).unwrap();
        let decoded = decode_jwt(&token).unwrap();
        assert_eq!(decoded.claims.sub, "users:alice");
    }
}
