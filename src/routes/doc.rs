use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::UserList,
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartList, QuantityUpdate},
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{AdminCreateProductRequest, CreateProductRequest, ProductList, UpdateProductRequest},
        returns::{CreateReturnRequest, ReturnList, UpdateReturnStatusRequest},
        reviews::{CreateReviewRequest, ReviewList},
    },
    models::{CartItem, Order, OrderItem, Product, Return, ReturnStatus, Review, Role, User},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, health, orders, params, products as product_routes, returns, reviews,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::increase_quantity,
        cart::decrease_quantity,
        cart::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        returns::create_return,
        returns::list_returns,
        reviews::create_review,
        reviews::list_reviews,
        admin::list_users,
        admin::create_product,
        admin::list_all_orders,
        admin::update_return_status
    ),
    components(
        schemas(
            Role,
            ReturnStatus,
            User,
            Product,
            CartItem,
            Order,
            OrderItem,
            Return,
            Review,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            AdminCreateProductRequest,
            UpdateProductRequest,
            AddToCartRequest,
            UpdateOrderStatusRequest,
            CreateReturnRequest,
            UpdateReturnStatusRequest,
            CreateReviewRequest,
            CartList,
            QuantityUpdate,
            OrderList,
            OrderWithItems,
            ProductList,
            ReturnList,
            ReviewList,
            UserList,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<UserList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Returns", description = "Return requests"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_public_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/register",
            "/login",
            "/products",
            "/products/{id}",
            "/product",
            "/product/{id}",
            "/cart",
            "/carts/remove/{item_id}",
            "/carts/increase/{item_id}",
            "/carts/decrease/{item_id}",
            "/carts/remove/cart/items",
            "/order",
            "/orders",
            "/orders/{order_id}",
            "/orders/{order_id}/status",
            "/returns",
            "/reviews",
            "/reviews/{product_id}",
            "/admin/users",
            "/admin/products",
            "/admin/orders",
            "/admin/returns/{id}/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
