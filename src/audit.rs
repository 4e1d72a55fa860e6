use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;

const INSERT_AUDIT: &str = "INSERT INTO audit_logs (id, user_id, action, resource, metadata) \
                            VALUES ($1, $2, $3, $4, $5)";

async fn insert(
    pool: &DbPool,
    user_id: Uuid,
    action: &str,
    resource: &str,
    metadata: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_AUDIT)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(action)
        .bind(resource)
        .bind(metadata)
        .execute(pool)
        .await?;
    Ok(())
}

/// Best-effort audit entry, written after the business change has committed.
/// A failed insert is logged and otherwise ignored.
pub async fn record(pool: &DbPool, user_id: Uuid, action: &str, resource: &str, metadata: Value) {
    if let Err(err) = insert(pool, user_id, action, resource, &metadata).await {
        tracing::warn!(error = %err, action, resource, "audit log failed");
    }
}
