use serde::Deserialize;
use std::env;

use crate::error::AuthzError;
use crate::utils::parse_ttl;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthzConfig {
    pub environment: Environment,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub token: TokenConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Server-held HMAC secret.
    pub secret: String,
    /// Access token time-to-live, e.g. "15m".
    pub access_ttl: String,
    /// Refresh token time-to-live, e.g. "7d".
    pub refresh_ttl: String,
}

impl AuthzConfig {
    pub fn from_env() -> Result<Self, AuthzError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(AuthzError::ConfigError)?;

        let is_prod = environment == Environment::Prod;

        let config = AuthzConfig {
            environment,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            token: TokenConfig {
                secret: get_env("TOKEN_SECRET", Some("dev-only-insecure-secret"), is_prod)?,
                access_ttl: get_env("TOKEN_ACCESS_TTL", Some("15m"), is_prod)?,
                refresh_ttl: get_env("TOKEN_REFRESH_TTL", Some("7d"), is_prod)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AuthzError> {
        parse_ttl(&self.token.access_ttl).map_err(|e| {
            AuthzError::ConfigError(format!("TOKEN_ACCESS_TTL: {}", e))
        })?;
        parse_ttl(&self.token.refresh_ttl).map_err(|e| {
            AuthzError::ConfigError(format!("TOKEN_REFRESH_TTL: {}", e))
        })?;

        if self.token.secret.is_empty() {
            return Err(AuthzError::ConfigError(
                "TOKEN_SECRET must not be empty".to_string(),
            ));
        }

        // In production, require a real secret.
        if self.environment == Environment::Prod {
            if self.token.secret == "dev-only-insecure-secret" {
                return Err(AuthzError::ConfigError(
                    "TOKEN_SECRET must be set to a real secret in production".to_string(),
                ));
            }
            if self.token.secret.len() < 32 {
                return Err(AuthzError::ConfigError(
                    "TOKEN_SECRET must be at least 32 bytes in production".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AuthzError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AuthzError::ConfigError(format!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AuthzError::ConfigError(format!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AuthzConfig {
        AuthzConfig {
            environment: Environment::Dev,
            log_level: "info".to_string(),
            database: DatabaseConfig {
                url: "postgres://localhost/authz".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            token: TokenConfig {
                secret: "dev-only-insecure-secret".to_string(),
                access_ttl: "15m".to_string(),
                refresh_ttl: "7d".to_string(),
            },
        }
    }

    #[test]
    fn dev_defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn malformed_ttl_is_rejected() {
        let mut config = base_config();
        config.token.access_ttl = "fifteen minutes".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn prod_rejects_dev_secret() {
        let mut config = base_config();
        config.environment = Environment::Prod;
        assert!(config.validate().is_err());
    }

    #[test]
    fn prod_rejects_short_secret() {
        let mut config = base_config();
        config.environment = Environment::Prod;
        config.token.secret = "short".to_string();
        assert!(config.validate().is_err());
    }
}
