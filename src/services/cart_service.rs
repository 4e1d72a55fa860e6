use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartList, QuantityUpdate},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, line_price},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Outcome of moving a cart line's quantity by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Set(i32),
    Remove,
}

pub fn step_quantity(current: i32, delta: i32) -> AppResult<QuantityChange> {
    let next = current.checked_add(delta).ok_or_else(quantity_too_large)?;
    if next <= 0 {
        Ok(QuantityChange::Remove)
    } else {
        Ok(QuantityChange::Set(next))
    }
}

fn quantity_too_large() -> AppError {
    AppError::BadRequest("quantity is too large".into())
}

fn priced_line(unit_price: Decimal, quantity: i32) -> AppResult<Decimal> {
    line_price(unit_price, quantity)
        .ok_or_else(|| AppError::BadRequest("line total is too large".into()))
}

pub(crate) async fn find_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?)
}

pub(crate) async fn require_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<CartModel> {
    match find_cart(conn, user_id).await? {
        Some(cart) => Ok(cart),
        None => Err(AppError::NotFound),
    }
}

/// Returns the user's cart, creating it on first use. The unique index on
/// `carts.user_id` makes concurrent first adds converge on one row.
pub(crate) async fn get_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<CartModel> {
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
    };
    Carts::insert(cart)
        .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    match find_cart(conn, user_id).await? {
        Some(cart) => Ok(cart),
        None => Err(AppError::Internal(anyhow::anyhow!(
            "cart for user {user_id} vanished after upsert"
        ))),
    }
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let cart = require_cart(&state.orm, user.user_id).await?;

    let items: Vec<CartItem> = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();

    let total_price = items.iter().map(|item| item.price).sum::<Decimal>();
    let meta = Meta::count(items.len());
    Ok(ApiResponse::success(
        "OK",
        CartList {
            cart_id: cart.id,
            items,
            total_price,
        },
        Some(meta),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id).one(&txn).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".to_string())),
    };

    let cart = get_or_create_cart(&txn, user.user_id).await?;

    // A product already in the cart grows its existing line instead of adding a second one.
    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let cart_item = match existing {
        Some(item) => {
            let quantity = item
                .quantity
                .checked_add(payload.quantity)
                .ok_or_else(quantity_too_large)?;
            let price = priced_line(product.price, quantity)?;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.price = Set(price);
            active.update(&txn).await?
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                price: Set(priced_line(product.price, payload.quantity)?),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to cart",
        CartItem::from(cart_item),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = require_cart(&state.orm, user.user_id).await?;

    let result = CartItems::delete_many()
        .filter(CartItemCol::Id.eq(item_id))
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "item_id": item_id }),
    )
    .await;

    Ok(ApiResponse::message("Removed from cart"))
}

pub async fn increase_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<QuantityUpdate>> {
    change_quantity(state, user, item_id, 1).await
}

pub async fn decrease_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<QuantityUpdate>> {
    change_quantity(state, user, item_id, -1).await
}

/// Moves a line's quantity by `delta` and reprices it from the current product
/// unit price. A line reaching zero is deleted.
async fn change_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    delta: i32,
) -> AppResult<ApiResponse<QuantityUpdate>> {
    let cart = require_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;

    let item = CartItems::find()
        .filter(CartItemCol::Id.eq(item_id))
        .filter(CartItemCol::CartId.eq(cart.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let (message, update) = match step_quantity(item.quantity, delta)? {
        QuantityChange::Remove => {
            CartItems::delete_by_id(item.id).exec(&txn).await?;
            (
                "Item removed from cart",
                QuantityUpdate {
                    removed: true,
                    item: None,
                },
            )
        }
        QuantityChange::Set(quantity) => {
            let product = Products::find_by_id(item.product_id).one(&txn).await?;
            let product = match product {
                Some(p) => p,
                None => return Err(AppError::NotFound),
            };

            let price = priced_line(product.price, quantity)?;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.price = Set(price);
            let updated = active.update(&txn).await?;

            let message = if delta > 0 {
                "Item quantity increased"
            } else {
                "Item quantity decreased"
            };
            (
                message,
                QuantityUpdate {
                    removed: false,
                    item: Some(CartItem::from(updated)),
                },
            )
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_quantity",
        "cart_items",
        serde_json::json!({ "item_id": item_id, "delta": delta, "removed": update.removed }),
    )
    .await;

    Ok(ApiResponse::success(message, update, Some(Meta::empty())))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = require_cart(&state.orm, user.user_id).await?;

    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_clear",
        "cart_items",
        serde_json::json!({ "cart_id": cart.id, "removed": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::message("Cart cleared"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decreasing_last_unit_removes_line() {
        assert_eq!(step_quantity(1, -1).unwrap(), QuantityChange::Remove);
    }

    #[test]
    fn decreasing_keeps_line_above_zero() {
        assert_eq!(step_quantity(2, -1).unwrap(), QuantityChange::Set(1));
    }

    #[test]
    fn increasing_adds_one_unit() {
        assert_eq!(step_quantity(1, 1).unwrap(), QuantityChange::Set(2));
        assert_eq!(step_quantity(5, 1).unwrap(), QuantityChange::Set(6));
    }

    #[test]
    fn increasing_past_i32_max_is_a_bad_request() {
        assert!(matches!(
            step_quantity(i32::MAX, 1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn oversized_line_total_is_a_bad_request() {
        let unit = Decimal::new(999_999, 2);
        assert!(matches!(
            priced_line(unit, i32::MAX),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(priced_line(unit, 2).unwrap(), Decimal::new(1_999_998, 2));
    }
}
