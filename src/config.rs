//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL
    pub database_url: String,
    /// Frontend URL allowed for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for access/refresh tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Access token lifetime in seconds (default 5 minutes)
    pub access_token_lifetime_secs: i64,
    /// Refresh token lifetime in seconds (default 1 day)
    pub refresh_token_lifetime_secs: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read if present. Only `JWT_SIGNING_KEY` is required;
    /// everything else has a local-development default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:bookshelf.db".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            access_token_lifetime_secs: env::var("ACCESS_TOKEN_LIFETIME_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            refresh_token_lifetime_secs: env::var("REFRESH_TOKEN_LIFETIME_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            access_token_lifetime_secs: 300,
            refresh_token_lifetime_secs: 86_400,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_lifetime_secs, 300);
        assert_eq!(config.refresh_token_lifetime_secs, 86_400);
        assert!(!config.jwt_signing_key.is_empty());
    }
}
