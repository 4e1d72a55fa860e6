use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::returns::{CreateReturnRequest, ReturnList},
    entity::returns::{ActiveModel as ReturnActive, Column as ReturnCol, Entity as Returns},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Return, ReturnStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Files a return request. The referenced order and product are not checked;
/// an admin reviews the request afterwards.
pub async fn create_return(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReturnRequest,
) -> AppResult<ApiResponse<Return>> {
    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest("reason is required".into()));
    }

    let created = ReturnActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_id: Set(payload.order_id),
        product_id: Set(payload.product_id),
        reason: Set(reason),
        status: Set(ReturnStatus::Pending.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "return_create",
        "returns",
        serde_json::json!({ "return_id": created.id, "order_id": created.order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Return request created",
        Return::from(created),
        Some(Meta::empty()),
    ))
}

pub async fn list_returns(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ReturnList>> {
    let items: Vec<Return> = Returns::find()
        .filter(ReturnCol::UserId.eq(user.user_id))
        .order_by_desc(ReturnCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Return::from)
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Returns", ReturnList { items }, Some(meta)))
}
