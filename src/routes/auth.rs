use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    routing::post,
};
use chrono::Utc;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    middleware::auth::TOKEN_COOKIE,
    models::User,
    response::ApiResponse,
    services::auth_service::{login_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// `token=<jwt>; HttpOnly; Path=/; Max-Age=<seconds>`
pub fn token_cookie(token: &str, max_age_secs: i64) -> AppResult<HeaderValue> {
    let cookie = format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        max_age_secs.max(0)
    );
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid cookie header: {e}")))
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<User>),
        (status = 400, description = "Invalid input or email taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let Json(payload) = payload?;
    let resp = register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user; token also set as HttpOnly cookie", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(HeaderMap, Json<ApiResponse<LoginResponse>>)> {
    let Json(payload) = payload?;
    let resp = login_user(&state, payload).await?;

    let mut headers = HeaderMap::new();
    if let Some(data) = resp.data.as_ref() {
        let max_age = (data.expires_at - Utc::now()).num_seconds();
        headers.insert(header::SET_COOKIE, token_cookie(&data.token, max_age)?);
    }
    Ok((headers, Json(resp)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_http_only_with_max_age() {
        let value = token_cookie("abc.def.ghi", 3600).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("token=abc.def.ghi;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Path=/"));
        assert!(value.ends_with("Max-Age=3600"));
    }

    #[test]
    fn negative_max_age_is_clamped() {
        let value = token_cookie("t", -5).unwrap();
        assert!(value.to_str().unwrap().ends_with("Max-Age=0"));
    }
}
