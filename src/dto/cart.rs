use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub cart_id: Uuid,
    pub items: Vec<CartItem>,
    #[schema(value_type = String, example = "199.98")]
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuantityUpdate {
    /// True when the quantity reached zero and the line was deleted.
    pub removed: bool,
    pub item: Option<CartItem>,
}
