use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ORDER_STATUS_PENDING, Order, OrderItem, Role, max_amount},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service::require_cart,
    state::AppState,
};

/// Sum of the cart's line totals.
pub fn order_total(lines: &[CartItemModel]) -> Decimal {
    lines.iter().map(|line| line.price).sum()
}

/// Units needed per product, keyed in id order so row locks are always taken
/// in the same sequence.
pub fn required_quantities(lines: &[CartItemModel]) -> BTreeMap<Uuid, i32> {
    let mut required = BTreeMap::new();
    for line in lines {
        let needed = required.entry(line.product_id).or_insert(0);
        // saturating: a sum past i32::MAX can never be in stock anyway
        *needed = i32::saturating_add(*needed, line.quantity);
    }
    required
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Turns the caller's cart into an order. Every step runs in one transaction:
/// any early return drops it and rolls everything back.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let cart = require_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;

    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let total_price = order_total(&lines);
    if total_price > max_amount() {
        return Err(AppError::BadRequest("Order total is too large".into()));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_price: Set(total_price),
        status: Set(ORDER_STATUS_PENDING.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(item));
    }

    let required = required_quantities(&lines);
    for (product_id, quantity) in &required {
        let product = Products::find_by_id(*product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Product {product_id} is no longer available"
                )));
            }
        };
        if product.quantity < *quantity {
            tracing::info!(
                %product_id,
                available = product.quantity,
                requested = quantity,
                "checkout rejected: insufficient stock"
            );
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {product_id}"
            )));
        }
    }

    for (product_id, quantity) in &required {
        Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).sub(*quantity))
            .filter(ProdCol::Id.eq(*product_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, %total_price, "order created");
    audit::record(
        &state.pool,
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_price": total_price.to_string() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

/// Order with its lines. Only the owner or an admin may read it; anyone else
/// gets NotFound so order ids are not confirmed to strangers.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) if o.user_id == user.user_id || user.role == Role::Admin => o,
        _ => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn line(product_id: Uuid, quantity: i32, price: &str) -> CartItemModel {
        CartItemModel {
            id: Uuid::new_v4(),
            cart_id: Uuid::nil(),
            product_id,
            quantity,
            price: Decimal::from_str(price).unwrap(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn total_is_sum_of_line_prices() {
        let lines = vec![
            line(Uuid::new_v4(), 1, "99.99"),
            line(Uuid::new_v4(), 1, "99.99"),
        ];
        assert_eq!(order_total(&lines), Decimal::from_str("199.98").unwrap());
    }

    #[test]
    fn duplicate_product_lines_are_summed() {
        let shared = Uuid::new_v4();
        let other = Uuid::new_v4();
        let lines = vec![line(shared, 2, "2.00"), line(other, 1, "5.00"), line(shared, 3, "3.00")];

        let required = required_quantities(&lines);
        assert_eq!(required.len(), 2);
        assert_eq!(required[&shared], 5);
        assert_eq!(required[&other], 1);
    }

    #[test]
    fn oversized_requirements_saturate() {
        let shared = Uuid::new_v4();
        let lines = vec![line(shared, i32::MAX, "0.01"), line(shared, 5, "0.05")];
        assert_eq!(required_quantities(&lines)[&shared], i32::MAX);
    }
}
