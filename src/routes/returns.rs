use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::returns::{CreateReturnRequest, ReturnList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Return,
    response::ApiResponse,
    services::return_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/returns", get(list_returns).post(create_return))
}

#[utoipa::path(
    post,
    path = "/returns",
    request_body = CreateReturnRequest,
    responses(
        (status = 201, description = "Return request filed", body = ApiResponse<Return>),
        (status = 400, description = "Missing reason"),
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn create_return(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateReturnRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Return>>)> {
    let Json(payload) = payload?;
    let resp = return_service::create_return(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/returns",
    responses(
        (status = 200, description = "Return requests of the current user", body = ApiResponse<ReturnList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn list_returns(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ReturnList>>> {
    let resp = return_service::list_returns(&state, &user).await?;
    Ok(Json(resp))
}
