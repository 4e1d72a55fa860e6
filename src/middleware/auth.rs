use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::{AppError, AppResult},
    models::Role,
    state::AppState,
};

pub const TOKEN_COOKIE: &str = "token";

/// HS256 signing material, built once from the configured secret.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
    ) -> AppResult<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
        Ok((token, expiration))
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Catalog writes answer 401 rather than 403 to non-sellers.
pub fn ensure_seller(user: &AuthUser) -> Result<(), AppError> {
    if user.role != Role::Seller {
        return Err(AppError::Unauthorized(
            "Only sellers can manage products".into(),
        ));
    }
    Ok(())
}

fn bearer_token(headers: &HeaderMap) -> AppResult<Option<&str>> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) => Ok(Some(token.trim())),
        None => Err(AppError::Unauthorized(
            "Invalid Authorization scheme".into(),
        )),
    }
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(TOKEN_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(&parts.headers)? {
            Some(token) => token,
            None => cookie_token(&parts.headers)
                .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?,
        };

        let claims = state.jwt.verify(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"0123456789abcdef0123456789abcdef", 24)
    }

    #[test]
    fn issued_token_verifies_with_same_keys() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let (token, expires_at) = keys.issue(user_id, "a@b.c", Role::Seller).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@b.c");
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.exp as i64, expires_at.timestamp());
        assert!(expires_at > Utc::now() + Duration::hours(23));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtKeys::new(b"ffffffffffffffffffffffffffffffff", 24);
        let (token, _) = other.issue(Uuid::new_v4(), "a@b.c", Role::Buyer).unwrap();
        assert!(matches!(keys().verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".into(),
            role: Role::Buyer,
            iat: (past - Duration::hours(24)).timestamp() as usize,
            exp: past.timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn role_guards() {
        let buyer = AuthUser {
            user_id: Uuid::new_v4(),
            email: "b@x.y".into(),
            role: Role::Buyer,
        };
        assert!(matches!(ensure_admin(&buyer), Err(AppError::Forbidden)));
        assert!(matches!(ensure_seller(&buyer), Err(AppError::Unauthorized(_))));

        let seller = AuthUser {
            role: Role::Seller,
            ..buyer
        };
        assert!(ensure_seller(&seller).is_ok());
    }

    #[test]
    fn token_is_read_from_cookie_when_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), None);
        assert_eq!(cookie_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert!(bearer_token(&headers).is_err());
    }
}
