use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Return, ReturnStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReturnRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReturnStatusRequest {
    pub status: ReturnStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ReturnList {
    #[schema(value_type = Vec<Return>)]
    pub items: Vec<Return>,
}
