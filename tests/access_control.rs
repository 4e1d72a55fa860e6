//! Router-level checks that never reach the database: every request here is
//! rejected by an extractor or a role guard before a query would run.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use storefront_api::{config::AppConfig, models::Role, routes::build_app, state::AppState};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret-test-secret-test-secret";

fn state() -> AppState {
    let config = AppConfig {
        database_url: "postgres://nobody@127.0.0.1:1/none".into(),
        host: "127.0.0.1".into(),
        port: 0,
        max_connections: 1,
        jwt_secret: SECRET.into(),
        jwt_ttl_hours: 1,
    };
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    AppState::new(pool, &config)
}

fn app_with_token(role: Role) -> (Router, String) {
    let state = state();
    let (token, _) = state
        .jwt
        .issue(Uuid::new_v4(), "someone@example.com", role)
        .expect("token");
    (build_app(state), token)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app(state());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = build_app(state());
    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["data"]["path"], "/nope");
}

#[tokio::test]
async fn cart_requires_token() {
    let app = build_app(state());
    let response = app
        .oneshot(Request::get("/cart").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let app = build_app(state());
    let response = app
        .oneshot(
            Request::get("/orders")
                .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn buyer_adding_product_is_unauthorized_even_with_garbage_body() {
    let (app, token) = app_with_token(Role::Buyer);
    let response = app
        .oneshot(
            Request::post("/product")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn buyer_adding_valid_product_is_unauthorized() {
    let (app, token) = app_with_token(Role::Buyer);
    let body = serde_json::json!({
        "name": "Phone",
        "description": "A phone",
        "quantity": 3,
        "price": "99.99",
        "category": "Electronics"
    });
    let response = app
        .oneshot(
            Request::post("/product")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seller_with_malformed_body_gets_bad_request() {
    let (app, token) = app_with_token(Role::Seller);
    let response = app
        .oneshot(
            Request::post("/product")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn buyer_updating_product_is_unauthorized() {
    let (app, token) = app_with_token(Role::Buyer);
    let response = app
        .oneshot(
            Request::put(format!("/product/{}", Uuid::new_v4()))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_admin_cannot_list_users() {
    let (app, token) = app_with_token(Role::Seller);
    let response = app
        .oneshot(
            Request::get("/admin/users")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn token_cookie_is_accepted_in_place_of_header() {
    let (app, token) = app_with_token(Role::Buyer);
    let response = app
        .oneshot(
            Request::get("/admin/orders")
                .header(header::COOKIE, format!("theme=dark; token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Authenticated as a buyer, so the admin guard answers, not the token check.
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn buyer_cannot_change_order_status() {
    let (app, token) = app_with_token(Role::Buyer);
    let response = app
        .oneshot(
            Request::put(format!("/orders/{}/status", Uuid::new_v4()))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status":"shipped"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_sort_column_is_rejected() {
    let app = build_app(state());
    let response = app
        .oneshot(
            Request::get("/products?sort_by=password_hash")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("password_hash"));
}

#[tokio::test]
async fn register_missing_field_is_a_json_bad_request() {
    let app = build_app(state());
    let response = app
        .oneshot(
            Request::post("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"a@b.c"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("password"));
    assert!(body["data"]["error"].is_string());
}

#[tokio::test]
async fn register_without_content_type_is_a_json_bad_request() {
    let app = build_app(state());
    let response = app
        .oneshot(
            Request::post("/register")
                .body(Body::from(r#"{"email":"a@b.c","password":"long-enough-password"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn cart_add_with_malformed_product_id_is_a_json_bad_request() {
    let (app, token) = app_with_token(Role::Buyer);
    let response = app
        .oneshot(
            Request::post("/cart")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"product_id":"nope","quantity":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("product_id"));
}

#[tokio::test]
async fn non_numeric_page_is_a_json_bad_request() {
    let app = build_app(state());
    let response = app
        .oneshot(Request::get("/products?page=abc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn admin_role_cannot_be_self_registered() {
    let app = build_app(state());
    let body = serde_json::json!({
        "email": "boss@example.com",
        "password": "long-enough-password",
        "role": "admin"
    });
    let response = app
        .oneshot(
            Request::post("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("admin"));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = build_app(state());
    let body = serde_json::json!({ "email": "a@example.com", "password": "short" });
    let response = app
        .oneshot(
            Request::post("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn docs_are_served() {
    let app = build_app(state());
    let response = app
        .oneshot(Request::get("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
