use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn},
    middleware::auth::JwtKeys,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        let orm = create_orm_conn(pool.clone());
        let jwt = JwtKeys::new(config.jwt_secret.as_bytes(), config.jwt_ttl_hours);
        Self {
            pool,
            orm,
            jwt: Arc::new(jwt),
        }
    }
}
