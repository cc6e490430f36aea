//! Configuration module
//!
//! Explicit configuration structs built once at startup from the environment
//! and passed by reference to the services that need them. There is no
//! ambient global configuration.

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const TOKEN_TTL_MINUTES: i64 = 60;
const DEFAULT_API_KEY_PREFIX: &str = "sk-sdk-";
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

const SUPPORTED_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// Token signing and API key settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub token_ttl_minutes: i64,
    pub api_key_prefix: String,
}

impl AuthConfig {
    /// Token lifetime in seconds, as reported in login responses.
    pub fn expires_in_secs(&self) -> i64 {
        self.token_ttl_minutes * 60
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub auth: AuthConfig,
    /// Admin principal ensured at startup when absent.
    pub bootstrap_admin_email: String,
    pub bootstrap_admin_password: String,
}

impl AppConfig {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let auth = AuthConfig {
            jwt_secret: env::var("SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("SECRET_KEY must be set for authentication"))?,
            jwt_algorithm: env::var("ALGORITHM").unwrap_or_else(|_| "HS256".to_string()),
            token_ttl_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .unwrap_or_else(|_| TOKEN_TTL_MINUTES.to_string())
                .parse()
                .unwrap_or(TOKEN_TTL_MINUTES),
            api_key_prefix: env::var("API_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_API_KEY_PREFIX.to_string()),
        };

        let config = AppConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            auth,
            bootstrap_admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string()),
            bootstrap_admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "SECRET_KEY must be at least 32 characters long"
            ));
        }

        if !SUPPORTED_ALGORITHMS.contains(&self.auth.jwt_algorithm.as_str()) {
            return Err(anyhow::anyhow!(
                "ALGORITHM must be one of {}",
                SUPPORTED_ALGORITHMS.join(", ")
            ));
        }

        if self.auth.token_ttl_minutes < 1 {
            return Err(anyhow::anyhow!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be at least 1"
            ));
        }

        if self.auth.api_key_prefix.trim().is_empty() {
            return Err(anyhow::anyhow!("API_KEY_PREFIX must not be empty"));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() {
            if self.cors_origins.contains(&"*".to_string()) {
                return Err(anyhow::anyhow!(
                    "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
                ));
            }
            if self.bootstrap_admin_password == DEFAULT_ADMIN_PASSWORD {
                return Err(anyhow::anyhow!(
                    "ADMIN_PASSWORD must be set explicitly in production"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            server_port: 8080,
            cors_origins: vec!["http://localhost:3000".to_string()],
            database_url: "postgresql://localhost/licentra".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            environment: "development".to_string(),
            auth: AuthConfig {
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                jwt_algorithm: "HS256".to_string(),
                token_ttl_minutes: TOKEN_TTL_MINUTES,
                api_key_prefix: DEFAULT_API_KEY_PREFIX.to_string(),
            },
            bootstrap_admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            bootstrap_admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = base_config();
        config.auth.jwt_secret = "too-short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let mut config = base_config();
        config.auth.jwt_algorithm = "RS256".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut config = base_config();
        config.environment = "production".to_string();
        config.cors_origins = vec!["*".to_string()];
        config.bootstrap_admin_password = "not-the-default".to_string();
        assert!(config.validate().is_err());

        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_admin_password_rejected_in_production() {
        let mut config = base_config();
        config.environment = "prod".to_string();
        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expires_in_secs() {
        let config = base_config();
        assert_eq!(config.auth.expires_in_secs(), 3600);
    }

    #[test]
    fn test_is_production() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
        config.environment = "prod".to_string();
        assert!(config.is_production());
    }
}
