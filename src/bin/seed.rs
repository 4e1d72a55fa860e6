use rust_decimal::Decimal;
use storefront_api::{
    db::{DbPool, create_pool, run_migrations},
    models::Role,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let pool = create_pool(&database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", "Admin", Role::Admin).await?;
    let seller_id =
        ensure_user(&pool, "seller@example.com", "seller12345", "Sample Seller", Role::Seller).await?;
    let buyer_id = ensure_user(&pool, "buyer@example.com", "buyer12345", "Sample Buyer", Role::Buyer).await?;
    seed_products(&pool, seller_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Seller ID: {seller_id}, Buyer ID: {buyer_id}");
    Ok(())
}

/// Inserts the account or resets its role and password when the email exists.
async fn ensure_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE
            SET role = EXCLUDED.role, password_hash = EXCLUDED.password_hash
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_products(pool: &DbPool, seller_id: Uuid) -> anyhow::Result<()> {
    let products = [
        ("Axum Hoodie", "Warm hoodie for Rustaceans", "Apparel", Decimal::new(5500, 2), 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", "Kitchen", Decimal::new(1200, 2), 100),
        ("Rust Sticker Pack", "Decorate your laptop", "Accessories", Decimal::new(500, 2), 200),
        ("Smartphone X", "A phone with a very fast chip", "Electronics", Decimal::new(9999, 2), 25),
        ("Wireless Earbuds", "Noise cancelling", "Electronics", Decimal::new(4950, 2), 40),
    ];

    for (name, description, category, price, quantity) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, quantity, price, seller_id, category, image_url)
            SELECT $1, $2, $3, $4, $5, $6, $7, ''
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $2 AND seller_id = $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(quantity)
        .bind(price)
        .bind(seller_id)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
