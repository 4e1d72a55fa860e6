use std::env;

use anyhow::bail;

pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_default();
        validate_jwt_secret(&jwt_secret)?;
        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        Ok(Self {
            port,
            database_url,
            host,
            max_connections,
            jwt_secret,
            jwt_ttl_hours,
        })
    }
}

/// Rejects signing secrets that are missing or too short to be safe for HS256.
pub fn validate_jwt_secret(secret: &str) -> anyhow::Result<()> {
    if secret.trim().is_empty() {
        bail!("JWT_SECRET is not set");
    }
    if secret.len() < MIN_JWT_SECRET_LEN {
        bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes long");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        let err = validate_jwt_secret("   ").unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(validate_jwt_secret("too-short").is_err());
    }

    #[test]
    fn long_enough_secret_is_accepted() {
        let secret = "x".repeat(MIN_JWT_SECRET_LEN);
        assert!(validate_jwt_secret(&secret).is_ok());
    }
}
